//! Fixed fluid-line and stage lists.
//!
//! Two layouts exist. [`SchemaVariant::Canonical`] is the current checklist.
//! It is the revision this crate settled on (seven stages, WT lines no longer
//! split by activity), not a transcription of the earlier tracker form.
//! [`SchemaVariant::PreFlushing`] is that earlier form, reproduced as it was
//! and kept only so files written against it stay readable. The two are
//! never merged: a table is always built against exactly one of them.

use serde::{Deserialize, Serialize};

/// Key column of the persisted table.
pub const FLUID_LINE_COLUMN: &str = "Fluid Line";

/// Derived column; never part of a stage list.
pub const OVERALL_PROGRESS: &str = "Overall Progress";

pub const DEFAULT_DATA_FILE: &str = "progress_data.csv";

pub const FLUID_LINES: &[&str] = &[
    "N2 line",
    "25, 35 OLM",
    "98 SA",
    "WSA",
    "SO3G",
    "MS",
    "HS",
    "POW",
    "Steam Trace line",
    "MC & SC",
    "WT (S)",
    "WT (R)",
    "VG (S)",
    "SM2",
];

pub const STAGES: &[&str] = &[
    "Line Preparation",
    "Leak Check 1",
    "Flushing/Blowing",
    "Leak Check 2",
    "Pressure Test",
    "Reinstatement",
    "DSM Sign-Off",
];

pub const PRE_FLUSHING_FLUID_LINES: &[&str] = &[
    "N2 line",
    "25, 35 OLM",
    "98 SA",
    "WSA",
    "SO3G",
    "MS",
    "HS",
    "POW",
    "Steam Trace line",
    "MC & SC",
    "WT (S) air blowing",
    "WT (R) air blowing",
    "WT (S) flushing",
    "WT (R) flushing",
    "VG (S)",
    "SM2",
];

pub const PRE_FLUSHING_STAGES: &[&str] = &[
    "Line Preparation",
    "MPCI Line Check (Pre-Flushing/Blowing)",
    "Leak Check",
    "Flushing/Blowing Execution",
    "Pressure Test Preparation",
    "MPCI Line Check (Post-Preparation)",
    "Pressure Test Execution",
    "DSM Sign-Off",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaVariant {
    #[default]
    Canonical,
    PreFlushing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schema {
    variant: SchemaVariant,
    fluid_lines: &'static [&'static str],
    stages: &'static [&'static str],
}

impl Schema {
    pub const fn canonical() -> Self {
        Self {
            variant: SchemaVariant::Canonical,
            fluid_lines: FLUID_LINES,
            stages: STAGES,
        }
    }

    pub const fn pre_flushing() -> Self {
        Self {
            variant: SchemaVariant::PreFlushing,
            fluid_lines: PRE_FLUSHING_FLUID_LINES,
            stages: PRE_FLUSHING_STAGES,
        }
    }

    pub const fn for_variant(variant: SchemaVariant) -> Self {
        match variant {
            SchemaVariant::Canonical => Self::canonical(),
            SchemaVariant::PreFlushing => Self::pre_flushing(),
        }
    }

    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    pub fn fluid_lines(&self) -> &'static [&'static str] {
        self.fluid_lines
    }

    pub fn stages(&self) -> &'static [&'static str] {
        self.stages
    }

    pub fn has_fluid_line(&self, name: &str) -> bool {
        self.fluid_lines.iter().any(|l| *l == name)
    }

    pub fn has_stage(&self, name: &str) -> bool {
        self.stages.iter().any(|s| *s == name)
    }

    /// Position of `name` in the fluid-line list.
    pub fn line_index(&self, name: &str) -> Option<usize> {
        self.fluid_lines.iter().position(|l| *l == name)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::canonical()
    }
}
