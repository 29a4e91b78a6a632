// linetrack_core/src/domain.rs
use std::collections::BTreeMap;

use serde::Serialize;

use crate::schema::Schema;

pub const MIN_PERCENT: f64 = 0.0;
pub const MAX_PERCENT: f64 = 100.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressRecord {
    pub fluid_line: String,
    pub stages: BTreeMap<String, f64>,
    /// Derived; see [`crate::calc::recompute`].
    pub overall_progress: f64,
}

impl ProgressRecord {
    pub fn zeroed(fluid_line: &str, schema: &Schema) -> Self {
        Self {
            fluid_line: fluid_line.to_string(),
            stages: schema
                .stages()
                .iter()
                .map(|s| (s.to_string(), 0.0))
                .collect(),
            overall_progress: 0.0,
        }
    }

    pub fn stage(&self, stage: &str) -> Option<f64> {
        self.stages.get(stage).copied()
    }
}

/// One record per fluid line, in schema order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProgressTable {
    records: Vec<ProgressRecord>,
}

impl ProgressTable {
    pub fn zeroed(schema: &Schema) -> Self {
        Self {
            records: schema
                .fluid_lines()
                .iter()
                .map(|l| ProgressRecord::zeroed(l, schema))
                .collect(),
        }
    }

    /// Records are taken as given, including any stale `overall_progress`.
    pub fn from_records(records: Vec<ProgressRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ProgressRecord] {
        &self.records
    }

    pub fn record(&self, fluid_line: &str) -> Option<&ProgressRecord> {
        self.records.iter().find(|r| r.fluid_line == fluid_line)
    }

    pub(crate) fn record_mut(&mut self, fluid_line: &str) -> Option<&mut ProgressRecord> {
        self.records.iter_mut().find(|r| r.fluid_line == fluid_line)
    }

    pub(crate) fn records_mut(&mut self) -> &mut [ProgressRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
