use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::calc::recompute;
use crate::domain::{ProgressRecord, ProgressTable};
use crate::error::{ProgressError, Result};
use crate::policy::LoadPolicy;
use crate::schema::{FLUID_LINE_COLUMN, OVERALL_PROGRESS, Schema};
use crate::store::{ProgressStore, StoreParams};

/// Flat comma-delimited table: `Fluid Line`, one column per stage, `Overall Progress`.
pub struct CsvStore {
    path: PathBuf,
    policy: LoadPolicy,
}

impl CsvStore {
    pub fn new(params: StoreParams) -> Self {
        Self {
            path: params.path,
            policy: params.policy,
        }
    }
}

impl ProgressStore for CsvStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn save(&self, table: &ProgressTable, schema: &Schema) -> Result<()> {
        // Same directory so the final rename never crosses filesystems.
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        write_table(tmp.as_file(), table, schema)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), rows = table.len(), "saved progress table");
        Ok(())
    }

    fn load(&self, schema: &Schema) -> Result<ProgressTable> {
        let file = File::open(&self.path)?;
        let table = read_table(file, schema, self.policy)?;
        debug!(
            path = %self.path.display(),
            rows = table.len(),
            policy = ?self.policy,
            "loaded progress table"
        );
        Ok(table)
    }
}

pub fn write_table<W: Write>(out: W, table: &ProgressTable, schema: &Schema) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = Vec::with_capacity(schema.stages().len() + 2);
    header.push(FLUID_LINE_COLUMN);
    header.extend(schema.stages().iter().copied());
    header.push(OVERALL_PROGRESS);
    writer.write_record(&header)?;

    for record in table.records() {
        let mut row = Vec::with_capacity(header.len());
        row.push(record.fluid_line.clone());
        for stage in schema.stages() {
            // shortest round-trip form, so a reload reproduces the value exactly
            row.push(record.stage(stage).unwrap_or(0.0).to_string());
        }
        row.push(record.overall_progress.to_string());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse a persisted table against `schema`. Columns are matched by header
/// name, so the key column may sit anywhere in the row. A stored
/// `Overall Progress` column is accepted but never read; every record is
/// recomputed from its stage cells.
pub fn read_table<R: Read>(input: R, schema: &Schema, policy: LoadPolicy) -> Result<ProgressTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers = reader.headers().map_err(read_error)?.clone();
    let layout = Layout::resolve(&headers, schema, policy)?;

    let mut slots: Vec<Option<ProgressRecord>> = vec![None; schema.fluid_lines().len()];
    for row in reader.records() {
        let row = match row.map_err(read_error) {
            Ok(row) => row,
            Err(ProgressError::MalformedPersistedData(msg)) => {
                reject(policy, msg)?;
                continue;
            }
            Err(e) => return Err(e),
        };
        let line_no = row.position().map_or(0, |p| p.line());

        if row.len() != layout.width {
            let msg = format!(
                "line {line_no}: expected {} fields, found {}",
                layout.width,
                row.len()
            );
            reject(policy, msg)?;
        }

        let name = row.get(layout.line_col).unwrap_or_default();
        let Some(idx) = schema.line_index(name) else {
            reject(policy, format!("line {line_no}: unknown fluid line {name:?}"))?;
            continue;
        };
        if slots[idx].is_some() {
            reject(policy, format!("line {line_no}: duplicate row for {name:?}"))?;
            continue;
        }

        let mut stages = BTreeMap::new();
        for &(stage, col) in &layout.stage_cols {
            let value = match col {
                Some(c) => parse_cell(row.get(c), line_no, stage, policy)?,
                None => 0.0,
            };
            stages.insert(stage.to_string(), value);
        }
        slots[idx] = Some(ProgressRecord {
            fluid_line: name.to_string(),
            stages,
            overall_progress: 0.0,
        });
    }

    let mut records = Vec::with_capacity(slots.len());
    for (slot, &line) in slots.into_iter().zip(schema.fluid_lines()) {
        match slot {
            Some(r) => records.push(r),
            None => {
                reject(policy, format!("missing row for fluid line {line:?}"))?;
                records.push(ProgressRecord::zeroed(line, schema));
            }
        }
    }

    let mut table = ProgressTable::from_records(records);
    recompute(&mut table, schema);
    Ok(table)
}

struct Layout {
    line_col: usize,
    stage_cols: Vec<(&'static str, Option<usize>)>,
    width: usize,
}

impl Layout {
    fn resolve(headers: &csv::StringRecord, schema: &Schema, policy: LoadPolicy) -> Result<Self> {
        let mut seen = HashSet::new();
        for h in headers.iter() {
            if !seen.insert(h) {
                reject(policy, format!("duplicate column {h:?}"))?;
            }
        }

        let find = |name: &str| headers.iter().position(|h| h == name);

        // Rows cannot be keyed without it, whatever the policy.
        let line_col = find(FLUID_LINE_COLUMN).ok_or_else(|| {
            ProgressError::MalformedPersistedData(format!("missing {FLUID_LINE_COLUMN:?} column"))
        })?;

        let mut stage_cols = Vec::with_capacity(schema.stages().len());
        for &stage in schema.stages() {
            let col = find(stage);
            if col.is_none() {
                reject(policy, format!("missing stage column {stage:?}"))?;
            }
            stage_cols.push((stage, col));
        }

        for h in headers.iter() {
            if h != FLUID_LINE_COLUMN && h != OVERALL_PROGRESS && !schema.has_stage(h) {
                reject(policy, format!("unexpected column {h:?}"))?;
            }
        }

        Ok(Self {
            line_col,
            stage_cols,
            width: headers.len(),
        })
    }
}

fn parse_cell(raw: Option<&str>, line_no: u64, column: &str, policy: LoadPolicy) -> Result<f64> {
    let raw = raw.unwrap_or_default();
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => {
            reject(
                policy,
                format!("line {line_no}, column {column:?}: expected a number, found {raw:?}"),
            )?;
            Ok(0.0)
        }
    }
}

/// Undecodable text is a data problem, not an I/O one.
fn read_error(e: csv::Error) -> ProgressError {
    match e.kind() {
        csv::ErrorKind::Utf8 { pos, err } => ProgressError::MalformedPersistedData(format!(
            "line {}, field {}: invalid UTF-8",
            pos.as_ref().map_or(0, |p| p.line()),
            err.field() + 1
        )),
        _ => e.into(),
    }
}

/// Strict: the problem is fatal. Lenient: log it and let the caller substitute.
fn reject(policy: LoadPolicy, msg: String) -> Result<()> {
    if policy.is_lenient() {
        warn!("lossy load: {msg}");
        Ok(())
    } else {
        Err(ProgressError::MalformedPersistedData(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FLUID_LINES, PRE_FLUSHING_FLUID_LINES, PRE_FLUSHING_STAGES, STAGES};
    use pretty_assertions::assert_eq;

    fn csv_text(header: &[&str], lines: &[&str], cell: impl Fn(&str, &str) -> String) -> String {
        let mut w = csv::Writer::from_writer(Vec::new());
        w.write_record(header).unwrap();
        for line in lines {
            let row: Vec<String> = header
                .iter()
                .map(|col| {
                    if *col == FLUID_LINE_COLUMN {
                        line.to_string()
                    } else {
                        cell(line, col)
                    }
                })
                .collect();
            w.write_record(&row).unwrap();
        }
        String::from_utf8(w.into_inner().unwrap()).unwrap()
    }

    fn canonical_header(with_overall: bool) -> Vec<&'static str> {
        let mut h = vec![FLUID_LINE_COLUMN];
        h.extend(STAGES.iter().copied());
        if with_overall {
            h.push(OVERALL_PROGRESS);
        }
        h
    }

    fn zeros(_: &str, _: &str) -> String {
        "0".to_string()
    }

    fn strict(text: &str) -> Result<ProgressTable> {
        read_table(text.as_bytes(), &Schema::canonical(), LoadPolicy::Strict)
    }

    fn lenient(text: &str) -> Result<ProgressTable> {
        read_table(text.as_bytes(), &Schema::canonical(), LoadPolicy::Lenient)
    }

    fn malformed_message(res: Result<ProgressTable>) -> String {
        match res {
            Err(ProgressError::MalformedPersistedData(msg)) => msg,
            other => panic!("expected MalformedPersistedData, got {other:?}"),
        }
    }

    #[test]
    fn writes_key_column_first_and_quotes_commas() {
        let schema = Schema::canonical();
        let mut out = Vec::new();
        write_table(&mut out, &ProgressTable::zeroed(&schema), &schema).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next().unwrap(), canonical_header(true).join(","));
        assert_eq!(lines.next().unwrap(), "N2 line,0,0,0,0,0,0,0,0");
        assert_eq!(lines.next().unwrap(), "\"25, 35 OLM\",0,0,0,0,0,0,0,0");
        assert_eq!(text.lines().count(), FLUID_LINES.len() + 1);
    }

    #[test]
    fn missing_overall_column_is_recomputed() {
        let text = csv_text(&canonical_header(false), FLUID_LINES, |line, col| {
            if line == "N2 line" && col == "Leak Check 1" {
                "50".into()
            } else {
                "0".into()
            }
        });
        let table = strict(&text).unwrap();
        let n2 = table.record("N2 line").unwrap();
        assert_eq!(n2.stage("Leak Check 1"), Some(50.0));
        assert!((n2.overall_progress - 50.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn stored_overall_is_not_trusted() {
        let text = csv_text(&canonical_header(true), FLUID_LINES, |_, col| {
            if col == OVERALL_PROGRESS { "99".into() } else { "0".into() }
        });
        let table = strict(&text).unwrap();
        assert!(table.records().iter().all(|r| r.overall_progress == 0.0));
    }

    #[test]
    fn stored_overall_is_never_parsed() {
        for junk in ["inf", "NaN", "n/a", ""] {
            let text = csv_text(&canonical_header(true), FLUID_LINES, |_, col| {
                if col == OVERALL_PROGRESS { junk.into() } else { "10".into() }
            });
            let table = strict(&text).unwrap();
            assert!(table.records().iter().all(|r| r.overall_progress == 10.0));
        }
    }

    #[test]
    fn huge_values_survive_save_and_strict_reload() {
        let schema = Schema::canonical();
        let text = csv_text(&canonical_header(false), FLUID_LINES, |_, _| "1e308".into());
        let loaded = strict(&text).unwrap();
        assert!(loaded.records().iter().all(|r| r.overall_progress.is_finite()));

        let mut out = Vec::new();
        write_table(&mut out, &loaded, &schema).unwrap();
        let saved = String::from_utf8(out).unwrap();
        assert!(!saved.contains("inf"), "{saved}");

        let reloaded = strict(&saved).unwrap();
        assert_eq!(reloaded, loaded);
        assert_eq!(reloaded.record("MS").unwrap().stage("Pressure Test"), Some(1e308));
    }

    #[test]
    fn invalid_utf8_is_malformed_data() {
        let text = csv_text(&canonical_header(true), FLUID_LINES, zeros);
        let at = text.find("WSA,0,").unwrap() + "WSA,".len();
        let mut bytes = text[..at].as_bytes().to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(text[at + 1..].as_bytes());

        match read_table(&bytes[..], &Schema::canonical(), LoadPolicy::Strict) {
            Err(ProgressError::MalformedPersistedData(msg)) => {
                assert!(msg.contains("invalid UTF-8"), "{msg}")
            }
            other => panic!("expected MalformedPersistedData, got {other:?}"),
        }

        let table = read_table(&bytes[..], &Schema::canonical(), LoadPolicy::Lenient).unwrap();
        assert_eq!(table.len(), FLUID_LINES.len());
        assert_eq!(table.record("WSA").unwrap(), &ProgressRecord::zeroed("WSA", &Schema::canonical()));
    }

    #[test]
    fn reads_layout_with_key_column_last() {
        let mut header: Vec<&str> = PRE_FLUSHING_STAGES.to_vec();
        header.push(OVERALL_PROGRESS);
        header.push(FLUID_LINE_COLUMN);
        let text = csv_text(&header, PRE_FLUSHING_FLUID_LINES, |line, col| match (line, col) {
            ("MS", "Leak Check") => "100".into(),
            (_, OVERALL_PROGRESS) => "0.0".into(),
            _ => "0".into(),
        });

        let table = read_table(text.as_bytes(), &Schema::pre_flushing(), LoadPolicy::Strict).unwrap();
        assert_eq!(table.len(), PRE_FLUSHING_FLUID_LINES.len());
        assert_eq!(table.record("MS").unwrap().overall_progress, 12.5);
    }

    #[test]
    fn other_variant_file_is_rejected_not_merged() {
        let mut header: Vec<&str> = PRE_FLUSHING_STAGES.to_vec();
        header.push(FLUID_LINE_COLUMN);
        let text = csv_text(&header, PRE_FLUSHING_FLUID_LINES, zeros);
        let msg = malformed_message(strict(&text));
        assert!(msg.contains("missing stage column"), "{msg}");
    }

    #[test]
    fn non_numeric_cell_strict_vs_lenient() {
        let text = csv_text(&canonical_header(true), FLUID_LINES, |line, col| {
            if line == "WSA" && col == "Pressure Test" {
                "abc".into()
            } else if line == "WSA" && col == "Reinstatement" {
                "70".into()
            } else {
                "0".into()
            }
        });

        let msg = malformed_message(strict(&text));
        assert!(msg.contains("\"abc\""), "{msg}");
        assert!(msg.contains("Pressure Test"), "{msg}");

        let table = lenient(&text).unwrap();
        let wsa = table.record("WSA").unwrap();
        assert_eq!(wsa.stage("Pressure Test"), Some(0.0));
        assert_eq!(wsa.overall_progress, 10.0);
    }

    #[test]
    fn empty_and_non_finite_cells_are_not_numbers() {
        for bad in ["", "NaN", "inf"] {
            let text = csv_text(&canonical_header(false), FLUID_LINES, |line, col| {
                if line == "HS" && col == "DSM Sign-Off" {
                    bad.into()
                } else {
                    "0".into()
                }
            });
            malformed_message(strict(&text));
        }
    }

    #[test]
    fn out_of_range_values_are_accepted_on_load() {
        let text = csv_text(&canonical_header(false), FLUID_LINES, |line, col| {
            if line == "POW" && col == "Line Preparation" {
                "140".into()
            } else {
                "0".into()
            }
        });
        let table = strict(&text).unwrap();
        assert_eq!(table.record("POW").unwrap().stage("Line Preparation"), Some(140.0));
        assert_eq!(table.record("POW").unwrap().overall_progress, 20.0);
    }

    #[test]
    fn unexpected_column_strict_vs_lenient() {
        let mut header = canonical_header(true);
        header.push("Notes");
        let text = csv_text(&header, FLUID_LINES, zeros);

        let msg = malformed_message(strict(&text));
        assert!(msg.contains("\"Notes\""), "{msg}");
        assert_eq!(lenient(&text).unwrap().len(), FLUID_LINES.len());
    }

    #[test]
    fn missing_stage_column_lenient_defaults_to_zero() {
        let header: Vec<&str> = canonical_header(false)
            .into_iter()
            .filter(|h| *h != "Reinstatement")
            .collect();
        let text = csv_text(&header, FLUID_LINES, |_, _| "70".into());

        malformed_message(strict(&text));
        let table = lenient(&text).unwrap();
        let n2 = table.record("N2 line").unwrap();
        assert_eq!(n2.stage("Reinstatement"), Some(0.0));
        assert_eq!(n2.overall_progress, 60.0);
    }

    #[test]
    fn missing_row_strict_vs_lenient() {
        let text = csv_text(&canonical_header(true), &FLUID_LINES[1..], zeros);

        let msg = malformed_message(strict(&text));
        assert!(msg.contains("N2 line"), "{msg}");

        let table = lenient(&text).unwrap();
        assert_eq!(table.len(), FLUID_LINES.len());
        assert_eq!(table.records()[0], ProgressRecord::zeroed("N2 line", &Schema::canonical()));
    }

    #[test]
    fn unknown_and_duplicate_rows() {
        let mut lines = FLUID_LINES.to_vec();
        lines.push("Helium line");
        let text = csv_text(&canonical_header(true), &lines, zeros);
        assert!(malformed_message(strict(&text)).contains("Helium line"));
        assert_eq!(lenient(&text).unwrap().len(), FLUID_LINES.len());

        let mut lines = FLUID_LINES.to_vec();
        lines.push("MS");
        let text = csv_text(&canonical_header(true), &lines, zeros);
        assert!(malformed_message(strict(&text)).contains("duplicate row"));
        assert_eq!(lenient(&text).unwrap().len(), FLUID_LINES.len());
    }

    #[test]
    fn missing_key_column_fails_even_when_lenient() {
        let text = csv_text(&STAGES.to_vec(), &["x"], zeros);
        malformed_message(lenient(&text));
    }

    #[test]
    fn ragged_row_is_rejected() {
        let mut text = csv_text(&canonical_header(true), FLUID_LINES, zeros);
        text.push_str("SM2,0\n");
        let msg = malformed_message(strict(&text));
        assert!(msg.contains("expected 9 fields, found 2"), "{msg}");
    }
}
