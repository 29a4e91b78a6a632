//! Derived progress figures.
//!
//! Averages run over the stages of the active schema that are present in a
//! record. Keys a record carries beyond the schema are ignored and missing
//! ones do not count toward the denominator, so a record with no matching
//! stage at all reports zero.

use crate::domain::{ProgressRecord, ProgressTable};
use crate::schema::Schema;

pub fn compute_line_progress(record: &ProgressRecord, schema: &Schema) -> f64 {
    mean(schema.stages().iter().filter_map(|s| record.stage(s)))
}

pub fn compute_total_progress(table: &ProgressTable, schema: &Schema) -> f64 {
    mean(
        table
            .records()
            .iter()
            .map(|r| compute_line_progress(r, schema)),
    )
}

/// Arithmetic mean, zero for no values. Finite inputs give a finite mean even
/// when their plain sum overflows.
fn mean<I>(values: I) -> f64
where
    I: Iterator<Item = f64> + Clone,
{
    let (sum, n) = values
        .clone()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    let avg = sum / n;
    if avg.is_finite() {
        avg
    } else {
        values.map(|v| v / n).sum()
    }
}

/// Full recompute of every `overall_progress`; nothing is patched in place.
pub fn recompute(table: &mut ProgressTable, schema: &Schema) {
    for record in table.records_mut() {
        record.overall_progress = compute_line_progress(record, schema);
    }
}
