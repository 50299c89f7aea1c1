//! Descriptor types for entries in the variable registry.

use serde::{Deserialize, Serialize};

/// Measurement type of a variable.
///
/// Registry files written by older tooling carry Spanish type labels, so
/// those spellings are accepted on load. Serialization always emits the
/// lowercase English form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    /// Continuous measurements (temperatures, diameters, weights)
    #[serde(alias = "Numeric", alias = "Numérica", alias = "Numerica")]
    Numeric,
    /// Discrete labels (stations, species, sampling points)
    #[serde(alias = "Categorical", alias = "Categórica", alias = "Categorica")]
    Categorical,
}

impl std::fmt::Display for VariableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Numeric => write!(f, "numeric"),
            VariableType::Categorical => write!(f, "categorical"),
        }
    }
}

/// Summary statistic a variable supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Min,
    Max,
    Mean,
    Count,
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statistic::Min => write!(f, "min"),
            Statistic::Max => write!(f, "max"),
            Statistic::Mean => write!(f, "mean"),
            Statistic::Count => write!(f, "count"),
        }
    }
}

/// Source column name(s) for a variable in the workbook.
///
/// Most variables map to a single column, but join variables like the date
/// and station carry a list of historical spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExcelName {
    One(String),
    Many(Vec<String>),
}

impl ExcelName {
    /// All source names, in registry order.
    pub fn as_slice(&self) -> &[String] {
        match self {
            ExcelName::One(name) => std::slice::from_ref(name),
            ExcelName::Many(names) => names.as_slice(),
        }
    }
}

/// One entry from the variable registry.
///
/// The registry file is the only interface between workbook layouts and the
/// rest of the pipeline: everything downstream refers to variables by their
/// `name` and resolves workbook columns through `excel_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    /// Display name used throughout the application
    pub name: String,
    /// Data source the variable comes from (grouping key in variable listings)
    pub origin: String,
    /// Measurement type
    #[serde(rename = "type")]
    pub var_type: VariableType,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Column name(s) in the source workbook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excel_name: Option<ExcelName>,
    /// Child entries shown beneath the variable (e.g. species under a count)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subhierarchy: Vec<String>,
    /// Measurement unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Summary statistics the variable supports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statistics: Vec<Statistic>,
}

impl VariableDescriptor {
    /// Check whether this variable holds continuous measurements.
    pub fn is_numeric(&self) -> bool {
        self.var_type == VariableType::Numeric
    }

    /// Workbook column names for this variable, empty if none are declared.
    pub fn excel_names(&self) -> &[String] {
        self.excel_name
            .as_ref()
            .map(ExcelName::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_type_accepts_legacy_spellings() {
        let numeric: VariableType = serde_yaml::from_str("Numérica").unwrap();
        assert_eq!(numeric, VariableType::Numeric);
        let numeric: VariableType = serde_yaml::from_str("numeric").unwrap();
        assert_eq!(numeric, VariableType::Numeric);
        let categorical: VariableType = serde_yaml::from_str("Categórica").unwrap();
        assert_eq!(categorical, VariableType::Categorical);
    }

    #[test]
    fn test_variable_type_serializes_canonical() {
        let out = serde_yaml::to_string(&VariableType::Numeric).unwrap();
        assert_eq!(out.trim(), "numeric");
        let out = serde_yaml::to_string(&VariableType::Categorical).unwrap();
        assert_eq!(out.trim(), "categorical");
    }

    #[test]
    fn test_statistic_round_trip() {
        let stats: Vec<Statistic> = serde_yaml::from_str("[min, max, mean, count]").unwrap();
        assert_eq!(
            stats,
            vec![
                Statistic::Min,
                Statistic::Max,
                Statistic::Mean,
                Statistic::Count
            ]
        );
        assert_eq!(Statistic::Mean.to_string(), "mean");
    }

    #[test]
    fn test_excel_name_single() {
        let name: ExcelName = serde_yaml::from_str("Temp_Mean").unwrap();
        assert_eq!(name, ExcelName::One("Temp_Mean".to_string()));
        assert_eq!(name.as_slice(), ["Temp_Mean".to_string()]);
    }

    #[test]
    fn test_excel_name_list() {
        let name: ExcelName = serde_yaml::from_str("[Estacion, Punto, Esfp]").unwrap();
        assert_eq!(name.as_slice().len(), 3);
        assert_eq!(name.as_slice()[0], "Estacion");
    }

    #[test]
    fn test_descriptor_minimal() {
        let yaml = "name: Temperatura\norigin: Clima\ntype: Numérica\n";
        let var: VariableDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(var.name, "Temperatura");
        assert_eq!(var.origin, "Clima");
        assert!(var.is_numeric());
        assert!(var.excel_names().is_empty());
        assert!(var.subhierarchy.is_empty());
        assert!(var.statistics.is_empty());
    }

    #[test]
    fn test_descriptor_full() {
        let yaml = r#"
name: Temperatura media
origin: Clima
type: numeric
description: Daily mean air temperature
excel_name: Temp_Mean
unit: °C
statistics: [min, max, mean]
subhierarchy:
  - Temp_Min
  - Temp_Max
"#;
        let var: VariableDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(var.excel_names(), ["Temp_Mean".to_string()]);
        assert_eq!(var.unit.as_deref(), Some("°C"));
        assert_eq!(var.subhierarchy.len(), 2);
        assert_eq!(
            var.statistics,
            vec![Statistic::Min, Statistic::Max, Statistic::Mean]
        );
    }
}
