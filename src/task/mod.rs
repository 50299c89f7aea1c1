/*!
Plot task queue.

A [`GraphTask`] captures one configured plot as a named snapshot of the
grammar state. The [`TaskQueue`] collects tasks so a whole analysis can
be reviewed, exported as a text report, or saved to a YAML file (see
[`persist`]) and restored later.
*/

use std::path::{Path, PathBuf};
use std::slice;

use serde::{Deserialize, Serialize};

use crate::grammar::{Channel, GrammarState};
use crate::naming;
use crate::{BosquesError, Result};

pub mod persist;

pub use persist::{AnalysisFile, AnalysisTask};

// ============================================================================
// GraphTask
// ============================================================================

/// One queued plot: a display name plus the grammar state that produces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphTask {
    /// Display name shown in reports and saved analyses
    pub name: String,
    /// Snapshot of the mapping at the time the task was queued
    pub grammar_state: GrammarState,
    /// Selection flag used by bulk operations like [`TaskQueue::remove_selected`]
    #[serde(default)]
    pub selected: bool,
}

impl GraphTask {
    pub fn new(name: impl Into<String>, grammar_state: GrammarState) -> Self {
        Self {
            name: name.into(),
            grammar_state,
            selected: false,
        }
    }
}

// ============================================================================
// TaskQueue
// ============================================================================

/// Ordered collection of [`GraphTask`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQueue {
    tasks: Vec<GraphTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a snapshot of `state` under `name`.
    pub fn add_task(&mut self, name: impl Into<String>, state: &GrammarState) {
        let task = GraphTask::new(name, state.clone());
        tracing::info!(name = %task.name, "task added to queue");
        self.tasks.push(task);
    }

    /// Drop every task whose `selected` flag is set. Returns how many were
    /// removed.
    pub fn remove_selected(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.selected);
        let removed = before - self.tasks.len();
        if removed > 0 {
            tracing::info!(removed, "removed selected tasks from queue");
        }
        removed
    }

    /// Empty the queue, returning how many tasks were dropped.
    pub fn clear(&mut self) -> usize {
        let removed = self.tasks.len();
        self.tasks.clear();
        if removed > 0 {
            tracing::info!(removed, "cleared task queue");
        }
        removed
    }

    pub fn get(&self, index: usize) -> Option<&GraphTask> {
        self.tasks.get(index)
    }

    /// Set the selection flag of the task at `index`. Returns `false` when the
    /// index is out of bounds.
    pub fn set_selected(&mut self, index: usize, selected: bool) -> bool {
        match self.tasks.get_mut(index) {
            Some(task) => {
                task.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, GraphTask> {
        self.tasks.iter()
    }

    pub(crate) fn tasks(&self) -> &[GraphTask] {
        &self.tasks
    }

    pub(crate) fn replace_tasks(&mut self, tasks: Vec<GraphTask>) {
        self.tasks = tasks;
    }

    // ------------------------------------------------------------------------
    // Text report
    // ------------------------------------------------------------------------

    /// Write a plain-text summary of the queue into `output_dir` and return
    /// the path of the created file.
    ///
    /// The directory is created if missing. The file name carries a timestamp
    /// so successive reports never overwrite each other.
    pub fn write_report(&self, output_dir: &Path) -> Result<PathBuf> {
        if self.tasks.is_empty() {
            return Err(BosquesError::Task(
                "no tasks in the queue to report".to_string(),
            ));
        }
        std::fs::create_dir_all(output_dir)
            .map_err(|e| BosquesError::Io(format!("cannot create {}: {e}", output_dir.display())))?;

        let now = chrono::Local::now().naive_local();
        let path = output_dir.join(naming::report_file_name(&now));
        std::fs::write(&path, self.render_report(&now))
            .map_err(|e| BosquesError::Io(format!("cannot write {}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), tasks = self.tasks.len(), "wrote plot report");
        Ok(path)
    }

    /// Render the report body for the given generation time.
    pub fn render_report(&self, generated: &chrono::NaiveDateTime) -> String {
        let mut out = String::new();
        out.push_str("PLOT LIST\n");
        out.push_str("=========\n\n");
        out.push_str(&format!(
            "Generated: {}\n\n",
            generated.format("%Y-%m-%d %H:%M:%S")
        ));

        for (index, task) in self.tasks.iter().enumerate() {
            let heading = format!("Plot {}: {}", index + 1, task.name);
            out.push_str(&heading);
            out.push('\n');
            out.push_str(&"-".repeat(heading.chars().count()));
            out.push('\n');
            out.push_str("Settings:\n");
            out.push_str(&format!("  - Plot type: {}\n", task.grammar_state.plot_type));
            for (channel, variable) in task.grammar_state.mapped() {
                out.push_str(&format!("  - {}: {}\n", channel_label(channel), variable));
            }
            out.push_str(&format!("  - X scale: {}\n", task.grammar_state.x_scale));
            out.push_str(&format!("  - Y scale: {}\n", task.grammar_state.y_scale));
            out.push_str(&format!("  - Coordinates: {}\n", task.grammar_state.coords));
            out.push('\n');
            out.push_str(&"=".repeat(50));
            out.push_str("\n\n");
        }

        out.push_str(&format!("Total plots: {}\n", self.tasks.len()));
        out
    }
}

impl<'a> IntoIterator for &'a TaskQueue {
    type Item = &'a GraphTask;
    type IntoIter = slice::Iter<'a, GraphTask>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

/// Human-readable label for a channel in report output.
fn channel_label(channel: Channel) -> &'static str {
    match channel {
        Channel::X => "X axis",
        Channel::Y => "Y axis",
        Channel::Color => "Color",
        Channel::Size => "Size",
        Channel::Shape => "Shape",
        Channel::Alpha => "Alpha",
        Channel::FacetRow => "Facet (row)",
        Channel::FacetCol => "Facet (column)",
    }
}
