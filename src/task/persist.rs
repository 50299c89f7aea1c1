//! YAML persistence for the task queue.
//!
//! An analysis file stores every queued task with both a structured
//! summary (variables, coordinates, facets) and the full grammar state.
//! Loading prefers the full state and falls back to the structured
//! fields so files written by older builds still open.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::grammar::{AxisScale, CoordSystem, GrammarState};
use crate::plot::KindType;
use crate::task::{GraphTask, TaskQueue};
use crate::{BosquesError, Result};

/// Format version written into every analysis file.
pub const ANALYSIS_VERSION: &str = "1.0";

const ANALYSIS_DESCRIPTION: &str = "Forest data analysis";

// ============================================================================
// File layout
// ============================================================================

/// Top-level document of a saved analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFile {
    #[serde(default = "default_version")]
    pub version: String,
    /// RFC 3339 timestamp of when the file was written
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tasks: Vec<AnalysisTask>,
}

fn default_version() -> String {
    ANALYSIS_VERSION.to_string()
}

impl AnalysisFile {
    pub fn from_queue(queue: &TaskQueue) -> Self {
        Self {
            version: ANALYSIS_VERSION.to_string(),
            created_at: chrono::Local::now().to_rfc3339(),
            description: ANALYSIS_DESCRIPTION.to_string(),
            tasks: queue
                .iter()
                .enumerate()
                .map(|(index, task)| AnalysisTask::from_task(index, task))
                .collect(),
        }
    }
}

/// One task entry inside an [`AnalysisFile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTask {
    /// 1-based position in the queue
    #[serde(default)]
    pub id: usize,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub plot_type: KindType,
    #[serde(default)]
    pub variables: TaskVariables,
    #[serde(default)]
    pub aesthetics: Aesthetics,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_settings: Option<FacetSettings>,
    /// Full grammar state. Authoritative when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar_state: Option<GrammarState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskVariables {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<String>,
}

/// Optional labels overriding the generated ones. Kept for file
/// compatibility; the queue itself does not fill these in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aesthetics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(default)]
    pub flip: bool,
    #[serde(default)]
    pub x_scale: AxisScale,
    #[serde(default)]
    pub y_scale: AxisScale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cols: Option<String>,
    /// Scale sharing between facet panels, recorded for file compatibility
    #[serde(default = "default_facet_scales")]
    pub scales: String,
}

fn default_facet_scales() -> String {
    "fixed".to_string()
}

impl Default for FacetSettings {
    fn default() -> Self {
        Self {
            rows: None,
            cols: None,
            scales: default_facet_scales(),
        }
    }
}

impl AnalysisTask {
    pub fn from_task(index: usize, task: &GraphTask) -> Self {
        let state = &task.grammar_state;
        let facet_settings = if state.facet_row.is_some() || state.facet_col.is_some() {
            Some(FacetSettings {
                rows: state.facet_row.clone(),
                cols: state.facet_col.clone(),
                ..FacetSettings::default()
            })
        } else {
            None
        };
        Self {
            id: index + 1,
            name: task.name.clone(),
            plot_type: state.plot_type,
            variables: TaskVariables {
                x: state.x.clone(),
                y: state.y.clone(),
                color: state.color.clone(),
                size: state.size.clone(),
                shape: state.shape.clone(),
                alpha: state.alpha.clone(),
            },
            aesthetics: Aesthetics::default(),
            coordinates: Coordinates {
                flip: state.coords == CoordSystem::Flipped,
                x_scale: state.x_scale,
                y_scale: state.y_scale,
            },
            facet_settings,
            grammar_state: Some(state.clone()),
        }
    }

    /// Recover the grammar state, preferring the full snapshot over the
    /// structured fields.
    pub fn into_state(self) -> GrammarState {
        if let Some(state) = self.grammar_state {
            return state;
        }
        let mut state = GrammarState::new();
        state.x = self.variables.x;
        state.y = self.variables.y;
        state.color = self.variables.color;
        state.size = self.variables.size;
        state.shape = self.variables.shape;
        state.alpha = self.variables.alpha;
        if let Some(facets) = self.facet_settings {
            state.facet_row = facets.rows;
            state.facet_col = facets.cols;
        }
        state.plot_type = self.plot_type;
        state.x_scale = self.coordinates.x_scale;
        state.y_scale = self.coordinates.y_scale;
        state.coords = if self.coordinates.flip {
            CoordSystem::Flipped
        } else {
            CoordSystem::Cartesian
        };
        state
    }

    fn into_task(self, index: usize) -> GraphTask {
        let name = if self.name.is_empty() {
            format!("Plot {}", index + 1)
        } else {
            self.name.clone()
        };
        GraphTask {
            name,
            grammar_state: self.into_state(),
            selected: false,
        }
    }
}

// ============================================================================
// Queue save / load
// ============================================================================

impl TaskQueue {
    /// Serialize the queue as an analysis document.
    ///
    /// An empty queue is an error so a stray save cannot produce a file
    /// that later refuses to load.
    pub fn to_yaml_string(&self) -> Result<String> {
        if self.is_empty() {
            return Err(BosquesError::Task(
                "no tasks in the queue to save".to_string(),
            ));
        }
        let file = AnalysisFile::from_queue(self);
        serde_yaml::to_string(&file)
            .map_err(|e| BosquesError::Task(format!("cannot serialize analysis: {e}")))
    }

    /// Save the queue to `path` as YAML.
    pub fn save_analysis(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml_string()?;
        std::fs::write(path, yaml)
            .map_err(|e| BosquesError::Io(format!("cannot write {}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), tasks = self.len(), "saved analysis");
        Ok(())
    }

    /// Replace the queue with the tasks stored at `path`.
    ///
    /// A file with no tasks is rejected and the current queue is left
    /// untouched. A version mismatch only logs a warning.
    pub fn load_analysis(&mut self, path: &Path) -> Result<usize> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BosquesError::Io(format!("cannot read {}: {e}", path.display())))?;
        let file: AnalysisFile = serde_yaml::from_str(&text).map_err(|e| {
            BosquesError::Task(format!("invalid analysis file {}: {e}", path.display()))
        })?;

        if file.version != ANALYSIS_VERSION {
            tracing::warn!(
                found = %file.version,
                expected = ANALYSIS_VERSION,
                "unexpected analysis file version"
            );
        }
        if file.tasks.is_empty() {
            return Err(BosquesError::Task(
                "analysis file contains no tasks".to_string(),
            ));
        }

        let tasks: Vec<GraphTask> = file
            .tasks
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.into_task(index))
            .collect();
        let count = tasks.len();
        self.replace_tasks(tasks);
        tracing::info!(count, path = %path.display(), "loaded analysis");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Channel;

    fn sample_queue() -> TaskQueue {
        let mut queue = TaskQueue::new();

        let mut first = GrammarState::new();
        first.set(Channel::X, "Fecha");
        first.set(Channel::Y, "Temp_Media");
        first.set(Channel::Color, "Estacion");
        first.set(Channel::FacetRow, "Especie");
        queue.add_task("temperatures", &first);

        let mut second = GrammarState::new();
        second.plot_type = KindType::Bar;
        second.set(Channel::X, "Especie");
        second.set(Channel::Y, "Altura");
        second.coords = CoordSystem::Flipped;
        second.y_scale = AxisScale::Log;
        queue.add_task("heights", &second);

        queue
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = sample_queue().to_yaml_string().unwrap();
        assert!(yaml.contains("version: '1.0'"));
        assert!(yaml.contains("description: Forest data analysis"));
        assert!(yaml.contains("created_at:"));
        assert!(yaml.contains("name: temperatures"));
        assert!(yaml.contains("plot_type: scatter"));
        assert!(yaml.contains("plot_type: bar"));
        assert!(yaml.contains("x: Fecha"));
        assert!(yaml.contains("flip: true"));
        assert!(yaml.contains("y_scale: log"));
        assert!(yaml.contains("rows: Especie"));
        assert!(yaml.contains("scales: fixed"));
        assert!(yaml.contains("grammar_state:"));
        // Only the task with facets carries facet settings.
        assert_eq!(yaml.matches("facet_settings:").count(), 1);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.yaml");

        let queue = sample_queue();
        queue.save_analysis(&path).unwrap();

        let mut loaded = TaskQueue::new();
        assert_eq!(loaded.load_analysis(&path).unwrap(), 2);
        assert_eq!(loaded.len(), 2);
        for index in 0..2 {
            let original = queue.get(index).unwrap();
            let restored = loaded.get(index).unwrap();
            assert_eq!(restored.name, original.name);
            assert_eq!(restored.grammar_state, original.grammar_state);
            assert!(!restored.selected);
        }
    }

    #[test]
    fn test_load_prefers_grammar_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.yaml");
        let yaml = "\
version: '1.0'
tasks:
  - id: 1
    name: conflicting
    plot_type: line
    variables:
      x: FromVariables
    grammar_state:
      plot_type: scatter
      x: FromState
      y: Altura
";
        std::fs::write(&path, yaml).unwrap();

        let mut queue = TaskQueue::new();
        queue.load_analysis(&path).unwrap();
        let state = &queue.get(0).unwrap().grammar_state;
        assert_eq!(state.x.as_deref(), Some("FromState"));
        assert_eq!(state.plot_type, KindType::Scatter);
    }

    #[test]
    fn test_load_reconstructs_from_structured_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.yaml");
        let yaml = "\
version: '1.0'
tasks:
  - id: 1
    name: legacy
    plot_type: Dispersión
    variables:
      x: Fecha
      y: Altura
      color: Estacion
    coordinates:
      flip: true
      x_scale: lineal
      y_scale: log
    facet_settings:
      rows: Especie
";
        std::fs::write(&path, yaml).unwrap();

        let mut queue = TaskQueue::new();
        queue.load_analysis(&path).unwrap();
        let state = &queue.get(0).unwrap().grammar_state;
        assert_eq!(state.plot_type, KindType::Scatter);
        assert_eq!(state.x.as_deref(), Some("Fecha"));
        assert_eq!(state.color.as_deref(), Some("Estacion"));
        assert_eq!(state.facet_row.as_deref(), Some("Especie"));
        assert_eq!(state.coords, CoordSystem::Flipped);
        assert_eq!(state.x_scale, AxisScale::Linear);
        assert_eq!(state.y_scale, AxisScale::Log);
    }

    #[test]
    fn test_load_names_unnamed_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.yaml");
        let yaml = "\
version: '2.0'
tasks:
  - plot_type: histogram
    variables:
      x: Altura
";
        std::fs::write(&path, yaml).unwrap();

        let mut queue = TaskQueue::new();
        // Version mismatch only warns.
        queue.load_analysis(&path).unwrap();
        assert_eq!(queue.get(0).map(|t| t.name.as_str()), Some("Plot 1"));
        assert_eq!(queue.get(0).unwrap().grammar_state.plot_type, KindType::Histogram);
    }

    #[test]
    fn test_save_empty_queue_fails() {
        let queue = TaskQueue::new();
        assert!(matches!(
            queue.to_yaml_string().unwrap_err(),
            BosquesError::Task(_)
        ));
    }

    #[test]
    fn test_load_empty_tasks_keeps_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.yaml");
        std::fs::write(&path, "version: '1.0'\ntasks: []\n").unwrap();

        let mut queue = sample_queue();
        let err = queue.load_analysis(&path).unwrap_err();
        assert!(matches!(err, BosquesError::Task(_)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut queue = TaskQueue::new();
        let err = queue.load_analysis(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, BosquesError::Io(_)));
    }
}
