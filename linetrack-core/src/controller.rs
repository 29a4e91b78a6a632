//! Command handling over an owned progress table.
//!
//! A [`Controller`] holds the only copy of the table. Each command runs to
//! completion (validate, apply, recompute, optionally persist) before it
//! returns, and [`Controller::dispatch`] turns the outcome into a
//! [`RenderPayload`] for whatever displays it.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calc::{compute_line_progress, compute_total_progress, recompute};
use crate::domain::{MAX_PERCENT, MIN_PERCENT, ProgressTable};
use crate::error::{ProgressError, Result};
use crate::schema::Schema;
use crate::store::ProgressStore;

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SelectAndUpdate {
        fluid_line: String,
        stage: String,
        percentage: f64,
    },
    Save,
    Load,
    Show,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// No file at the store location; the table was reset to zeros.
    Defaulted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }

    pub fn saved(location: &Path) -> Self {
        Self::success(format!("Progress data saved to {}", location.display()))
    }

    pub fn loaded(outcome: LoadOutcome, location: &Path) -> Self {
        match outcome {
            LoadOutcome::Loaded => {
                Self::success(format!("Progress data loaded from {}", location.display()))
            }
            LoadOutcome::Defaulted => Self::info(format!(
                "No saved progress at {}; starting from zeros",
                location.display()
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineSummary {
    pub fluid_line: String,
    pub progress: f64,
}

/// Everything a display needs after one command.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderPayload {
    pub stages: Vec<&'static str>,
    pub table: ProgressTable,
    pub lines: Vec<LineSummary>,
    pub total_progress: f64,
    pub status: Option<Status>,
}

pub struct Controller {
    schema: Schema,
    table: ProgressTable,
    store: Box<dyn ProgressStore>,
    autosave: bool,
}

impl Controller {
    /// Start from an all-zero table without touching the store.
    pub fn new(schema: Schema, store: Box<dyn ProgressStore>, autosave: bool) -> Self {
        Self {
            table: ProgressTable::zeroed(&schema),
            schema,
            store,
            autosave,
        }
    }

    /// Load the persisted table when one exists, else start from zeros.
    pub fn open(schema: Schema, store: Box<dyn ProgressStore>, autosave: bool) -> Result<Self> {
        let mut c = Self::new(schema, store, autosave);
        if c.store.exists() {
            c.table = c.store.load(&c.schema)?;
        } else {
            info!(path = %c.store.location().display(), "no saved progress; starting from zeros");
        }
        Ok(c)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn table(&self) -> &ProgressTable {
        &self.table
    }

    pub fn store(&self) -> &dyn ProgressStore {
        self.store.as_ref()
    }

    /// Write one cell. Rejected input leaves the table untouched. With
    /// autosave on, the updated table is persisted before it replaces the
    /// current one, so a failed save leaves the table as it was.
    pub fn update_cell(&mut self, fluid_line: &str, stage: &str, percentage: f64) -> Result<()> {
        if !self.schema.has_fluid_line(fluid_line) {
            return Err(ProgressError::unknown_line(fluid_line));
        }
        if !self.schema.has_stage(stage) {
            return Err(ProgressError::unknown_stage(stage));
        }
        if !(MIN_PERCENT..=MAX_PERCENT).contains(&percentage) {
            return Err(ProgressError::PercentageOutOfRange(percentage));
        }

        let mut next = self.table.clone();
        let record = next
            .record_mut(fluid_line)
            .ok_or_else(|| ProgressError::unknown_line(fluid_line))?;
        record.stages.insert(stage.to_string(), percentage);
        recompute(&mut next, &self.schema);

        if self.autosave {
            self.store.save(&next, &self.schema)?;
        }
        self.table = next;
        debug!(fluid_line, stage, percentage, autosave = self.autosave, "cell updated");
        Ok(())
    }

    pub fn save_command(&self) -> Result<()> {
        self.store.save(&self.table, &self.schema)
    }

    /// Replace the table wholesale from the store. A failed load keeps the
    /// previous table.
    pub fn load_command(&mut self) -> Result<LoadOutcome> {
        if !self.store.exists() {
            self.table = ProgressTable::zeroed(&self.schema);
            return Ok(LoadOutcome::Defaulted);
        }
        let mut table = self.store.load(&self.schema)?;
        recompute(&mut table, &self.schema);
        self.table = table;
        Ok(LoadOutcome::Loaded)
    }

    pub fn total_progress(&self) -> f64 {
        compute_total_progress(&self.table, &self.schema)
    }

    pub fn render(&self, status: Option<Status>) -> RenderPayload {
        let lines = self
            .table
            .records()
            .iter()
            .map(|r| LineSummary {
                fluid_line: r.fluid_line.clone(),
                progress: compute_line_progress(r, &self.schema),
            })
            .collect();
        RenderPayload {
            stages: self.schema.stages().to_vec(),
            table: self.table.clone(),
            lines,
            total_progress: self.total_progress(),
            status,
        }
    }

    /// Apply `cmd` and render. Failures become an error status; the
    /// controller stays usable.
    pub fn dispatch(&mut self, cmd: Command) -> RenderPayload {
        let status = match self.apply(cmd) {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "command failed");
                Some(Status::error(e.to_string()))
            }
        };
        self.render(status)
    }

    fn apply(&mut self, cmd: Command) -> Result<Option<Status>> {
        match cmd {
            Command::SelectAndUpdate {
                fluid_line,
                stage,
                percentage,
            } => {
                self.update_cell(&fluid_line, &stage, percentage)?;
                Ok(Some(Status::success(format!(
                    "{fluid_line} / {stage} set to {percentage}%"
                ))))
            }
            Command::Save => {
                self.save_command()?;
                Ok(Some(Status::saved(self.store.location())))
            }
            Command::Load => {
                let outcome = self.load_command()?;
                Ok(Some(Status::loaded(outcome, self.store.location())))
            }
            Command::Show => Ok(None),
        }
    }
}
