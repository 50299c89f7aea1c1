//! Variable registry loaded from `variables.yaml`.
//!
//! The registry declares every variable the application knows about: its
//! display name, origin, measurement type, workbook column name(s), and the
//! statistics it supports. All workbook-specific knowledge lives here, so
//! changing a spreadsheet layout means editing the registry file rather than
//! the code.
//!
//! # File format
//!
//! ```yaml
//! variables:
//!   - name: Temperatura media
//!     origin: Clima
//!     type: numeric
//!     excel_name: Temp_Mean
//!     unit: °C
//!     statistics: [min, max, mean]
//!   - name: Estación
//!     origin: Muestreo
//!     type: categorical
//!     excel_name: [Estacion, Punto, Esfp]
//! ```

mod types;

pub use types::{ExcelName, Statistic, VariableDescriptor, VariableType};

use crate::naming::{DATE_COLUMN, STATION_COLUMN, STATION_VARIABLE};
use crate::{BosquesError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Top-level layout of a registry file.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    variables: Vec<VariableDescriptor>,
}

/// In-memory variable registry.
///
/// Preserves the declaration order of the registry file, which drives the
/// order variables are listed in summaries and groupings.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    variables: Vec<VariableDescriptor>,
}

impl VariableRegistry {
    /// Build a registry from descriptors, dropping duplicate names.
    ///
    /// The first declaration of a name wins; later duplicates are logged
    /// and discarded.
    pub fn new(descriptors: Vec<VariableDescriptor>) -> Self {
        let mut variables: Vec<VariableDescriptor> = Vec::with_capacity(descriptors.len());
        for var in descriptors {
            if variables.iter().any(|v| v.name == var.name) {
                tracing::warn!(name = %var.name, "duplicate variable in registry, keeping first");
                continue;
            }
            variables.push(var);
        }
        Self { variables }
    }

    /// Parse a registry from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or missing the top-level
    /// `variables` key.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: RegistryFile = serde_yaml::from_str(yaml)
            .map_err(|e| BosquesError::Registry(format!("invalid registry file: {}", e)))?;
        let registry = Self::new(file.variables);
        tracing::info!(variables = registry.len(), "loaded variable registry");
        Ok(registry)
    }

    /// Load a registry from a YAML file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BosquesError::Io(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    /// Number of variables in the registry.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Check whether the registry has no variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Iterate variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variables.iter()
    }

    /// Look up a variable by display name.
    pub fn get(&self, name: &str) -> Option<&VariableDescriptor> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Display names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    /// Display names of numeric variables, in declaration order.
    pub fn numeric_names(&self) -> Vec<&str> {
        self.variables
            .iter()
            .filter(|v| v.is_numeric())
            .map(|v| v.name.as_str())
            .collect()
    }

    /// Subhierarchy entries for a variable, empty if it has none.
    pub fn subhierarchy(&self, name: &str) -> &[String] {
        self.get(name)
            .map(|v| v.subhierarchy.as_slice())
            .unwrap_or(&[])
    }

    /// Group variables by origin, preserving first-seen origin order.
    pub fn by_origin(&self) -> Vec<(&str, Vec<&VariableDescriptor>)> {
        let mut groups: Vec<(&str, Vec<&VariableDescriptor>)> = Vec::new();
        for var in &self.variables {
            match groups.iter_mut().find(|(origin, _)| *origin == var.origin) {
                Some((_, vars)) => vars.push(var),
                None => groups.push((var.origin.as_str(), vec![var])),
            }
        }
        groups
    }

    /// Build the workbook-column to display-name mapping.
    ///
    /// Every declared source spelling maps to the variable's display name,
    /// so a unified table can be renamed in one pass.
    pub fn column_mapping(&self) -> HashMap<String, String> {
        let mut mapping = HashMap::new();
        for var in &self.variables {
            for excel in var.excel_names() {
                mapping.insert(excel.clone(), var.name.clone());
            }
        }
        tracing::debug!(entries = mapping.len(), "built column mapping");
        mapping
    }

    /// Source spellings of the join key columns.
    ///
    /// Returns `(canonical_column, aliases)` pairs for the date and station
    /// variables, in registry order. Sheets rename the first alias they
    /// contain to the canonical column before unification.
    pub fn join_aliases(&self) -> Vec<(&'static str, Vec<&str>)> {
        let mut pairs = Vec::new();
        for var in &self.variables {
            let canonical = if var.name == DATE_COLUMN {
                DATE_COLUMN
            } else if var.name == STATION_VARIABLE {
                STATION_COLUMN
            } else {
                continue;
            };
            let aliases: Vec<&str> = var.excel_names().iter().map(String::as_str).collect();
            if !aliases.is_empty() {
                pairs.push((canonical, aliases));
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> VariableRegistry {
        let yaml = r#"
variables:
  - name: Fecha
    origin: Muestreo
    type: Categórica
    excel_name: [Fecha, FECHA, fecha]
  - name: Estación
    origin: Muestreo
    type: Categórica
    excel_name: [Estacion, Punto, Esfp]
  - name: Temperatura media
    origin: Clima
    type: Numérica
    excel_name: Temp_Mean
    unit: °C
    statistics: [min, max, mean]
  - name: Diámetro
    origin: Dendrómetros
    type: Numérica
    excel_name: Diam
    statistics: [mean]
  - name: Capturas
    origin: Trampas
    type: Numérica
    excel_name: Capturas_total
    subhierarchy:
      - Ips sexdentatus
      - Tomicus destruens
"#;
        VariableRegistry::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_from_yaml_str() {
        let registry = sample_registry();
        assert_eq!(registry.len(), 5);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_invalid_yaml_errors() {
        let result = VariableRegistry::from_yaml_str("variables: [not: [valid");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Registry error"));
    }

    #[test]
    fn test_missing_variables_key_errors() {
        assert!(VariableRegistry::from_yaml_str("other_key: 1").is_err());
    }

    #[test]
    fn test_get() {
        let registry = sample_registry();
        let var = registry.get("Diámetro").unwrap();
        assert_eq!(var.origin, "Dendrómetros");
        assert!(var.is_numeric());
        assert!(registry.get("no such variable").is_none());
    }

    #[test]
    fn test_names_preserve_order() {
        let registry = sample_registry();
        assert_eq!(
            registry.names(),
            vec![
                "Fecha",
                "Estación",
                "Temperatura media",
                "Diámetro",
                "Capturas"
            ]
        );
    }

    #[test]
    fn test_numeric_names() {
        let registry = sample_registry();
        assert_eq!(
            registry.numeric_names(),
            vec!["Temperatura media", "Diámetro", "Capturas"]
        );
    }

    #[test]
    fn test_duplicates_keep_first() {
        let yaml = r#"
variables:
  - name: Temperatura
    origin: Clima
    type: numeric
    excel_name: Temp_Mean
  - name: Temperatura
    origin: Otro
    type: categorical
"#;
        let registry = VariableRegistry::from_yaml_str(yaml).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Temperatura").unwrap().origin, "Clima");
    }

    #[test]
    fn test_by_origin() {
        let registry = sample_registry();
        let groups = registry.by_origin();
        let origins: Vec<&str> = groups.iter().map(|(origin, _)| *origin).collect();
        assert_eq!(origins, vec!["Muestreo", "Clima", "Dendrómetros", "Trampas"]);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_subhierarchy() {
        let registry = sample_registry();
        assert_eq!(
            registry.subhierarchy("Capturas"),
            ["Ips sexdentatus".to_string(), "Tomicus destruens".to_string()]
        );
        assert!(registry.subhierarchy("Fecha").is_empty());
        assert!(registry.subhierarchy("missing").is_empty());
    }

    #[test]
    fn test_column_mapping_flattens_aliases() {
        let registry = sample_registry();
        let mapping = registry.column_mapping();
        assert_eq!(mapping.get("Temp_Mean").map(String::as_str), Some("Temperatura media"));
        assert_eq!(mapping.get("Diam").map(String::as_str), Some("Diámetro"));
        // List aliases each map to the display name
        assert_eq!(mapping.get("Punto").map(String::as_str), Some("Estación"));
        assert_eq!(mapping.get("Esfp").map(String::as_str), Some("Estación"));
        assert!(!mapping.contains_key("no such column"));
    }

    #[test]
    fn test_join_aliases() {
        let registry = sample_registry();
        let pairs = registry.join_aliases();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "Fecha");
        assert_eq!(pairs[0].1, vec!["Fecha", "FECHA", "fecha"]);
        assert_eq!(pairs[1].0, "Estacion");
        assert_eq!(pairs[1].1, vec!["Estacion", "Punto", "Esfp"]);
    }

    #[test]
    fn test_join_aliases_empty_registry() {
        let registry = VariableRegistry::default();
        assert!(registry.join_aliases().is_empty());
    }
}
