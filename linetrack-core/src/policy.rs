use serde::{Deserialize, Serialize};

/// How the CSV store treats content that does not fit the schema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPolicy {
    /// Fail with `MalformedPersistedData` on bad cells, unknown columns or rows,
    /// and missing rows.
    #[default]
    Strict,
    /// Lossy fallback: unparseable cells and missing columns become 0, unknown
    /// columns and rows are skipped, missing rows are zero-filled. Each
    /// substitution is logged at warn level.
    Lenient,
}

impl LoadPolicy {
    pub fn is_lenient(self) -> bool {
        matches!(self, LoadPolicy::Lenient)
    }
}
