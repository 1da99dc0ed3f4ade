use crate::error::{ResultError, StoreResult};
use crate::model::{Exam, Student, SubjectResult};
use crate::store::EntityStore;
use serde::Serialize;

/// Minimum percentage for each grade, highest first. A percentage equal to a
/// threshold earns that grade.
pub const GRADE_THRESHOLDS: &[(f64, &str)] = &[
    (90.0, "A+"),
    (80.0, "A"),
    (70.0, "B+"),
    (60.0, "B"),
    (50.0, "C+"),
    (40.0, "C"),
    (33.0, "D"),
];

pub const FAILING_GRADE: &str = "F";

pub fn grade_for(percentage: f64) -> &'static str {
    GRADE_THRESHOLDS
        .iter()
        .find(|(min, _)| percentage >= *min)
        .map(|(_, grade)| *grade)
        .unwrap_or(FAILING_GRADE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PassStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectLine {
    pub subject_id: String,
    pub subject_name: String,
    pub subject_code: String,
    pub full_marks: i64,
    pub pass_marks: i64,
    pub marks: i64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_marks: i64,
    pub total_full_marks: i64,
    /// Always two decimals, e.g. `"78.00"`.
    pub percentage: String,
    pub grade: &'static str,
    pub pass_status: PassStatus,
    pub failed_subjects: usize,
    pub subject_count: usize,
    pub subjects: Vec<SubjectLine>,
}

/// Percentage of `total` over `full`, or 0 when nothing was scorable.
pub fn percentage(total: i64, full: i64) -> f64 {
    if full > 0 {
        (total as f64 / full as f64) * 100.0
    } else {
        0.0
    }
}

/// Folds per-subject results into totals, grade and pass status.
///
/// The grade follows the overall percentage while the pass status only looks
/// at each subject's own pass marks, so a high grade can still be a FAIL.
pub fn summarize(results: &[SubjectResult]) -> Summary {
    let mut total_marks: i64 = 0;
    let mut total_full_marks: i64 = 0;
    let mut failed_subjects: usize = 0;
    let mut subjects = Vec::with_capacity(results.len());

    for r in results {
        total_marks += r.marks;
        total_full_marks += r.full_marks;
        let passed = r.passed();
        if !passed {
            failed_subjects += 1;
        }
        subjects.push(SubjectLine {
            subject_id: r.subject_id.clone(),
            subject_name: r.subject_name.clone(),
            subject_code: r.subject_code.clone(),
            full_marks: r.full_marks,
            pass_marks: r.pass_marks,
            marks: r.marks,
            passed,
        });
    }

    let pct = percentage(total_marks, total_full_marks);
    Summary {
        total_marks,
        total_full_marks,
        percentage: format!("{:.2}", pct),
        grade: grade_for(pct),
        pass_status: if failed_subjects == 0 {
            PassStatus::Pass
        } else {
            PassStatus::Fail
        },
        failed_subjects,
        subject_count: results.len(),
        subjects,
    }
}

/// Student, exam and computed summary for one marksheet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marksheet {
    pub student: Student,
    pub exam: Exam,
    pub results: Vec<SubjectResult>,
    pub summary: Summary,
}

pub fn aggregate<S: EntityStore>(store: &S, student_id: &str, exam_id: &str) -> StoreResult<Summary> {
    Ok(marksheet(store, student_id, exam_id)?.summary)
}

pub fn marksheet<S: EntityStore>(
    store: &S,
    student_id: &str,
    exam_id: &str,
) -> StoreResult<Marksheet> {
    let student = store
        .student(student_id)?
        .ok_or(ResultError::StudentNotFound)?;
    let exam = store.exam(exam_id)?.ok_or(ResultError::ExamNotFound)?;
    let results = store.subject_results(student_id, exam_id)?;
    let summary = summarize(&results);
    Ok(Marksheet {
        student,
        exam,
        results,
        summary,
    })
}

pub fn marksheet_by_roll<S: EntityStore>(
    store: &S,
    roll_number: &str,
    exam_id: &str,
) -> StoreResult<Marksheet> {
    let student = store
        .student_by_roll(roll_number)?
        .ok_or(ResultError::StudentNotFound)?;
    marksheet(store, &student.id, exam_id)
}
