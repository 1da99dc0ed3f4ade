use crate::error::{ResultError, StoreResult};
use crate::marks::validate_marks;
use crate::store::EntityStore;
use serde::Serialize;
use std::path::Path;

pub const IMPORT_MAX_ROWS: usize = 5000;

/// One incoming row before its fields are checked. Blank cells count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawImportRow {
    pub roll_number: Option<String>,
    pub subject_code: Option<String>,
    pub marks: Option<String>,
}

impl RawImportRow {
    /// Reads a JSON row object. Accepts snake_case or camelCase keys and
    /// numeric or string cells.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let cell = |snake: &str, camel: &str| -> Option<String> {
            let v = value.get(snake).or_else(|| value.get(camel))?;
            match v {
                serde_json::Value::String(s) => non_blank(s),
                serde_json::Value::Number(n) => Some(number_cell(n)),
                _ => None,
            }
        };
        Self {
            roll_number: cell("roll_number", "rollNumber"),
            subject_code: cell("subject_code", "subjectCode"),
            marks: cell("marks", "marks"),
        }
    }
}

// Whole-valued floats such as 85.0 read the same as 85.
fn number_cell(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// A row with every required field present. Marks stay textual until the
/// subject they are scored against is known.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub roll_number: String,
    pub subject_code: String,
    pub marks: String,
}

impl TryFrom<RawImportRow> for ImportRow {
    type Error = ResultError;

    fn try_from(raw: RawImportRow) -> Result<Self, Self::Error> {
        Ok(Self {
            roll_number: raw
                .roll_number
                .ok_or(ResultError::MissingField("roll_number"))?,
            subject_code: raw
                .subject_code
                .ok_or(ResultError::MissingField("subject_code"))?,
            marks: raw.marks.ok_or(ResultError::MissingField("marks"))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedRow {
    /// 1-based position in the input.
    pub row: usize,
    pub roll_number: String,
    pub student_name: String,
    pub subject_code: String,
    pub subject_name: String,
    pub marks: i64,
    pub result_id: String,
    pub status: RowStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row: usize,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_code: Option<String>,
}

pub type RowOutcome = Result<ImportedRow, RowError>;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_rows: usize,
    pub success_count: usize,
    pub created_count: usize,
    pub updated_count: usize,
    pub error_count: usize,
    pub results: Vec<ImportedRow>,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    fn push(&mut self, outcome: RowOutcome) {
        self.total_rows += 1;
        match outcome {
            Ok(row) => {
                match row.status {
                    RowStatus::Created => self.created_count += 1,
                    RowStatus::Updated => self.updated_count += 1,
                }
                self.success_count += 1;
                self.results.push(row);
            }
            Err(e) => {
                self.error_count += 1;
                self.errors.push(e);
            }
        }
    }
}

/// Applies import rows to one exam, one row at a time.
pub struct Reconciler<'s, S: EntityStore> {
    store: &'s S,
    exam_id: String,
}

impl<'s, S: EntityStore> Reconciler<'s, S> {
    /// Fails with `ExamNotFound` before any row is looked at.
    pub fn new(store: &'s S, exam_id: &str) -> StoreResult<Self> {
        if store.exam(exam_id)?.is_none() {
            return Err(ResultError::ExamNotFound);
        }
        Ok(Self {
            store,
            exam_id: exam_id.to_string(),
        })
    }

    /// Lazily applies each row in input order. Nothing is written until the
    /// iterator is advanced; a failed row never stops the ones after it.
    pub fn outcomes<I>(&self, rows: I) -> Outcomes<'_, 's, S, I::IntoIter>
    where
        I: IntoIterator<Item = RawImportRow>,
    {
        Outcomes {
            reconciler: self,
            rows: rows.into_iter().enumerate(),
        }
    }

    fn apply(&self, row_no: usize, raw: RawImportRow) -> RowOutcome {
        let roll_hint = raw.roll_number.clone();
        let code_hint = raw.subject_code.clone();
        let fail = |e: ResultError, roll: Option<String>, code: Option<String>| RowError {
            row: row_no,
            code: e.code(),
            message: e.to_string(),
            roll_number: roll,
            subject_code: code,
        };

        let row = ImportRow::try_from(raw).map_err(|e| fail(e, roll_hint, code_hint))?;
        let roll = || Some(row.roll_number.clone());
        let code = || Some(row.subject_code.clone());

        let student = match self.store.student_by_roll(&row.roll_number) {
            Ok(Some(s)) => s,
            Ok(None) => return Err(fail(ResultError::StudentNotFound, roll(), None)),
            Err(e) => return Err(fail(e, roll(), None)),
        };
        let subject = match self.store.subject_by_code(&row.subject_code) {
            Ok(Some(s)) => s,
            Ok(None) => return Err(fail(ResultError::SubjectNotFound, roll(), code())),
            Err(e) => return Err(fail(e, roll(), code())),
        };

        let invalid = ResultError::InvalidMarks {
            max: subject.full_marks,
        };
        let marks = match row.marks.parse::<i64>() {
            Ok(v) => match validate_marks(v as f64, &subject) {
                Ok(m) => m,
                Err(_) => return Err(fail(invalid, roll(), code())),
            },
            Err(_) => return Err(fail(invalid, roll(), code())),
        };

        let existing = self
            .store
            .find_result(&student.id, &self.exam_id, &subject.id)
            .map_err(|e| fail(e, roll(), code()))?;

        let (result_id, status) = match existing {
            Some(r) => {
                self.store
                    .update_result_marks(&r.id, marks)
                    .map_err(|e| fail(e, roll(), code()))?;
                (r.id, RowStatus::Updated)
            }
            None => {
                let id = self
                    .store
                    .insert_result(&student.id, &self.exam_id, &subject.id, marks)
                    .map_err(|e| fail(e, roll(), code()))?;
                (id, RowStatus::Created)
            }
        };

        Ok(ImportedRow {
            row: row_no,
            roll_number: row.roll_number.clone(),
            student_name: student.name,
            subject_code: row.subject_code.clone(),
            subject_name: subject.name,
            marks,
            result_id,
            status,
        })
    }
}

pub struct Outcomes<'a, 's, S: EntityStore, I> {
    reconciler: &'a Reconciler<'s, S>,
    rows: std::iter::Enumerate<I>,
}

impl<S: EntityStore, I: Iterator<Item = RawImportRow>> Iterator for Outcomes<'_, '_, S, I> {
    type Item = RowOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        let (i, raw) = self.rows.next()?;
        Some(self.reconciler.apply(i + 1, raw))
    }
}

/// Runs a whole batch against one exam and collects the per-row outcomes.
pub fn reconcile<S: EntityStore>(
    store: &S,
    exam_id: &str,
    rows: Vec<RawImportRow>,
) -> StoreResult<ImportReport> {
    if rows.len() > IMPORT_MAX_ROWS {
        return Err(ResultError::bad_params(format!(
            "import exceeds max rows: {} > {}",
            rows.len(),
            IMPORT_MAX_ROWS
        )));
    }
    let reconciler = Reconciler::new(store, exam_id)?;

    let mut report = ImportReport::default();
    for outcome in reconciler.outcomes(rows) {
        if let Err(e) = &outcome {
            tracing::debug!(row = e.row, code = e.code, "import row rejected");
        }
        report.push(outcome);
    }

    tracing::info!(
        exam_id,
        total = report.total_rows,
        created = report.created_count,
        updated = report.updated_count,
        errors = report.error_count,
        "bulk import finished"
    );
    Ok(report)
}

/// Reads CSV text with a header line into import rows.
///
/// Columns are matched by header name, case-insensitively; other columns are
/// ignored. Quoted cells may contain commas.
pub fn rows_from_csv(text: &str) -> csv::Result<Vec<RawImportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
        .collect();
    let col = |name: &str| columns.iter().position(|c| c == name);
    let roll_col = col("roll_number");
    let code_col = col("subject_code");
    let marks_col = col("marks");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).and_then(non_blank);
        rows.push(RawImportRow {
            roll_number: cell(roll_col),
            subject_code: cell(code_col),
            marks: cell(marks_col),
        });
    }
    Ok(rows)
}

pub fn read_csv_rows(path: &Path) -> anyhow::Result<Vec<RawImportRow>> {
    use anyhow::Context;
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read csv {}", path.to_string_lossy()))?;
    rows_from_csv(&String::from_utf8_lossy(&bytes))
        .with_context(|| format!("malformed csv {}", path.to_string_lossy()))
}
