use serde::{Deserialize, Serialize};

pub const DEFAULT_FULL_MARKS: i64 = 100;
pub const DEFAULT_PASS_MARKS: i64 = 33;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub roll_number: String,
    pub name: String,
    pub class: String,
    pub section: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub roll_number: String,
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub class: String,
    pub year: i64,
    pub term: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub class: String,
    pub year: i64,
    pub term: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
    pub full_marks: i64,
    pub pass_marks: i64,
    pub class: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInput {
    pub name: String,
    pub code: String,
    #[serde(default = "default_full_marks")]
    pub full_marks: i64,
    #[serde(default = "default_pass_marks")]
    pub pass_marks: i64,
    pub class: String,
}

fn default_full_marks() -> i64 {
    DEFAULT_FULL_MARKS
}

fn default_pass_marks() -> i64 {
    DEFAULT_PASS_MARKS
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub id: String,
    pub student_id: String,
    pub exam_id: String,
    pub subject_id: String,
    pub marks: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// One result row joined with the subject it was scored against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub result_id: String,
    pub subject_id: String,
    pub subject_name: String,
    pub subject_code: String,
    pub full_marks: i64,
    pub pass_marks: i64,
    pub marks: i64,
}

impl SubjectResult {
    pub fn passed(&self) -> bool {
        self.marks >= self.pass_marks
    }
}

/// Result row joined with student, exam and subject labels for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultListing {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub roll_number: String,
    pub exam_id: String,
    pub exam_name: String,
    pub term: String,
    pub year: i64,
    pub subject_id: String,
    pub subject_name: String,
    pub subject_code: String,
    pub full_marks: i64,
    pub pass_marks: i64,
    pub marks: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementInput {
    pub title: String,
    pub content: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Admin account as exposed to callers; the password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub created_at: String,
}

pub struct AdminCredentials {
    pub admin: Admin,
    pub password_hash: String,
}
