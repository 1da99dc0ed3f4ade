use crate::error::{ResultError, StoreResult};
use crate::model::{Subject, SubjectInput};
use crate::store::EntityStore;

/// Checks a marks value against the subject it is scored on.
///
/// Accepts whole numbers in `0..=subject.full_marks` and returns them as an
/// integer.
pub fn validate_marks(value: f64, subject: &Subject) -> Result<i64, ResultError> {
    let range = ResultError::InvalidMarksRange {
        min: 0,
        max: subject.full_marks,
    };
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(range);
    }
    if value < 0.0 || value > subject.full_marks as f64 {
        return Err(range);
    }
    Ok(value as i64)
}

pub fn validate_subject_input(input: &SubjectInput) -> Result<(), ResultError> {
    if input.full_marks <= 0 {
        return Err(ResultError::bad_params("fullMarks must be > 0"));
    }
    if input.pass_marks < 0 || input.pass_marks > input.full_marks {
        return Err(ResultError::bad_params(
            "passMarks must be between 0 and fullMarks",
        ));
    }
    Ok(())
}

/// Rewrites a subject. New bounds must still hold every mark already recorded
/// against it.
pub fn update_subject<S: EntityStore>(
    store: &S,
    subject_id: &str,
    input: &SubjectInput,
) -> StoreResult<()> {
    validate_subject_input(input)?;
    if store.subject(subject_id)?.is_none() {
        return Err(ResultError::SubjectNotFound);
    }
    if let Some(highest) = store.max_marks_for_subject(subject_id)? {
        if highest > input.full_marks {
            tracing::warn!(
                subject_id,
                highest,
                full_marks = input.full_marks,
                "subject update would strand recorded marks"
            );
            return Err(ResultError::InvalidMarksRange {
                min: 0,
                max: input.full_marks,
            });
        }
    }
    store.update_subject(subject_id, input)?;
    tracing::info!(subject_id, code = %input.code, "subject updated");
    Ok(())
}

/// Records marks for a (student, exam, subject) triple that has none yet.
pub fn create_result<S: EntityStore>(
    store: &S,
    student_id: &str,
    exam_id: &str,
    subject_id: &str,
    marks: f64,
) -> StoreResult<String> {
    if store.student(student_id)?.is_none() {
        return Err(ResultError::StudentNotFound);
    }
    if store.exam(exam_id)?.is_none() {
        return Err(ResultError::ExamNotFound);
    }
    let subject = store
        .subject(subject_id)?
        .ok_or(ResultError::SubjectNotFound)?;

    if store.exists_result(student_id, exam_id, subject_id)? {
        return Err(ResultError::DuplicateResult);
    }
    let marks = validate_marks(marks, &subject)?;

    // A concurrent writer can still win between the check and the insert; the
    // unique index reports that as DuplicateResult.
    let id = store.insert_result(student_id, exam_id, subject_id, marks)?;
    tracing::info!(result_id = %id, student_id, exam_id, subject_id, marks, "result created");
    Ok(id)
}

/// Replaces the marks of an existing result. Nothing else about it changes.
pub fn update_result<S: EntityStore>(store: &S, result_id: &str, marks: f64) -> StoreResult<()> {
    let existing = store
        .result(result_id)?
        .ok_or(ResultError::ResultNotFound)?;
    let subject = store
        .subject(&existing.subject_id)?
        .ok_or(ResultError::SubjectNotFound)?;
    let marks = validate_marks(marks, &subject)?;

    store.update_result_marks(result_id, marks)?;
    tracing::info!(result_id, marks, previous = existing.marks, "result updated");
    Ok(())
}

pub fn delete_result<S: EntityStore>(store: &S, result_id: &str) -> StoreResult<()> {
    store.delete_result(result_id)?;
    tracing::info!(result_id, "result deleted");
    Ok(())
}
