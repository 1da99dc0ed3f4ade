use serde_json::json;
use thiserror::Error;

/// Failures of store, grading and import operations.
///
/// Every variant maps to a stable wire code via [`ResultError::code`].
#[derive(Debug, Error)]
pub enum ResultError {
    #[error("student not found")]
    StudentNotFound,

    #[error("exam not found")]
    ExamNotFound,

    #[error("subject not found")]
    SubjectNotFound,

    #[error("result not found")]
    ResultNotFound,

    #[error("announcement not found")]
    AnnouncementNotFound,

    /// Marks outside `min..=max` or not a whole number.
    #[error("marks must be between {min} and {max}")]
    InvalidMarksRange { min: i64, max: i64 },

    #[error("result already exists for this student, exam, and subject")]
    DuplicateResult,

    #[error("roll number already exists")]
    DuplicateRollNumber,

    #[error("subject code already exists")]
    DuplicateSubjectCode,

    #[error("username or email already exists")]
    DuplicateUsername,

    /// Import row without one of its required fields.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Import row whose marks are not an integer within the subject's bounds.
    #[error("invalid marks, must be between 0 and {max}")]
    InvalidMarks { max: i64 },

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    BadParams(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, ResultError>;

impl ResultError {
    pub fn bad_params(message: impl Into<String>) -> Self {
        ResultError::BadParams(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ResultError::StudentNotFound => "student_not_found",
            ResultError::ExamNotFound => "exam_not_found",
            ResultError::SubjectNotFound => "subject_not_found",
            ResultError::ResultNotFound => "result_not_found",
            ResultError::AnnouncementNotFound => "announcement_not_found",
            ResultError::InvalidMarksRange { .. } => "invalid_marks_range",
            ResultError::DuplicateResult => "duplicate_result",
            ResultError::DuplicateRollNumber => "duplicate_roll_number",
            ResultError::DuplicateSubjectCode => "duplicate_subject_code",
            ResultError::DuplicateUsername => "duplicate_username",
            ResultError::MissingField(_) => "missing_field",
            ResultError::InvalidMarks { .. } => "invalid_marks",
            ResultError::InvalidCredentials => "invalid_credentials",
            ResultError::BadParams(_) => "bad_params",
            ResultError::Db(_) => "db_query_failed",
            ResultError::Io(_) => "io_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ResultError::InvalidMarksRange { min, max } => Some(json!({ "min": min, "max": max })),
            ResultError::InvalidMarks { max } => Some(json!({ "min": 0, "max": max })),
            ResultError::MissingField(field) => Some(json!({ "field": field })),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ResultError::StudentNotFound
                | ResultError::ExamNotFound
                | ResultError::SubjectNotFound
                | ResultError::ResultNotFound
                | ResultError::AnnouncementNotFound
        )
    }
}

/// True when a write failed on a UNIQUE index.
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => {
            err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}
