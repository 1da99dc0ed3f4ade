use crate::error::{is_unique_violation, ResultError, StoreResult};
use crate::model::{
    Admin, AdminCredentials, Announcement, AnnouncementInput, Exam, ExamInput, ResultListing,
    ResultRecord, Student, StudentInput, Subject, SubjectInput, SubjectResult,
};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

/// Typed access to the persisted entities.
///
/// Lookups return `Ok(None)` for missing rows; updates and deletes of a
/// missing row fail with the matching `*NotFound` error. Unique-index
/// violations surface as the matching `Duplicate*` error.
pub trait EntityStore {
    fn list_students(&self) -> StoreResult<Vec<Student>>;
    fn search_students(&self, name: &str) -> StoreResult<Vec<Student>>;
    fn student(&self, id: &str) -> StoreResult<Option<Student>>;
    fn student_by_roll(&self, roll_number: &str) -> StoreResult<Option<Student>>;
    fn insert_student(&self, input: &StudentInput) -> StoreResult<String>;
    fn update_student(&self, id: &str, input: &StudentInput) -> StoreResult<()>;
    fn delete_student(&self, id: &str) -> StoreResult<()>;

    fn list_exams(&self) -> StoreResult<Vec<Exam>>;
    fn exam(&self, id: &str) -> StoreResult<Option<Exam>>;
    fn insert_exam(&self, input: &ExamInput) -> StoreResult<String>;
    fn update_exam(&self, id: &str, input: &ExamInput) -> StoreResult<()>;
    fn delete_exam(&self, id: &str) -> StoreResult<()>;

    fn list_subjects(&self) -> StoreResult<Vec<Subject>>;
    fn subject(&self, id: &str) -> StoreResult<Option<Subject>>;
    fn subject_by_code(&self, code: &str) -> StoreResult<Option<Subject>>;
    fn insert_subject(&self, input: &SubjectInput) -> StoreResult<String>;
    fn update_subject(&self, id: &str, input: &SubjectInput) -> StoreResult<()>;
    fn delete_subject(&self, id: &str) -> StoreResult<()>;
    /// Highest marks recorded against a subject, across all exams.
    fn max_marks_for_subject(&self, subject_id: &str) -> StoreResult<Option<i64>>;

    fn list_results(&self) -> StoreResult<Vec<ResultListing>>;
    fn result(&self, id: &str) -> StoreResult<Option<ResultRecord>>;
    fn find_result(
        &self,
        student_id: &str,
        exam_id: &str,
        subject_id: &str,
    ) -> StoreResult<Option<ResultRecord>>;
    fn insert_result(
        &self,
        student_id: &str,
        exam_id: &str,
        subject_id: &str,
        marks: i64,
    ) -> StoreResult<String>;
    fn update_result_marks(&self, id: &str, marks: i64) -> StoreResult<()>;
    fn delete_result(&self, id: &str) -> StoreResult<()>;
    /// All results of one student in one exam, joined with their subjects.
    fn subject_results(&self, student_id: &str, exam_id: &str)
        -> StoreResult<Vec<SubjectResult>>;

    fn list_announcements(&self, active_only: bool) -> StoreResult<Vec<Announcement>>;
    fn announcement(&self, id: &str) -> StoreResult<Option<Announcement>>;
    fn insert_announcement(&self, input: &AnnouncementInput) -> StoreResult<String>;
    fn update_announcement(&self, id: &str, input: &AnnouncementInput) -> StoreResult<()>;
    fn delete_announcement(&self, id: &str) -> StoreResult<()>;

    fn list_admins(&self) -> StoreResult<Vec<Admin>>;
    fn count_admins(&self) -> StoreResult<i64>;
    fn admin_credentials(&self, username: &str) -> StoreResult<Option<AdminCredentials>>;
    fn insert_admin(
        &self,
        username: &str,
        password_hash: &str,
        name: &str,
        email: Option<&str>,
    ) -> StoreResult<String>;

    fn exists_result(&self, student_id: &str, exam_id: &str, subject_id: &str) -> StoreResult<bool> {
        Ok(self.find_result(student_id, exam_id, subject_id)?.is_some())
    }
}

pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

const STUDENT_COLUMNS: &str = "id, roll_number, name, class, section, dob, gender, created_at";
const EXAM_COLUMNS: &str = "id, name, description, class, year, term, created_at";
const SUBJECT_COLUMNS: &str = "id, name, code, full_marks, pass_marks, class, created_at";
const RESULT_COLUMNS: &str = "id, student_id, exam_id, subject_id, marks, created_at, updated_at";
const ANNOUNCEMENT_COLUMNS: &str = "id, title, content, is_active, created_at";

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        roll_number: row.get(1)?,
        name: row.get(2)?,
        class: row.get(3)?,
        section: row.get(4)?,
        dob: row.get(5)?,
        gender: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn exam_from_row(row: &Row<'_>) -> rusqlite::Result<Exam> {
    Ok(Exam {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        class: row.get(3)?,
        year: row.get(4)?,
        term: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn subject_from_row(row: &Row<'_>) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        full_marks: row.get(3)?,
        pass_marks: row.get(4)?,
        class: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn result_from_row(row: &Row<'_>) -> rusqlite::Result<ResultRecord> {
    Ok(ResultRecord {
        id: row.get(0)?,
        student_id: row.get(1)?,
        exam_id: row.get(2)?,
        subject_id: row.get(3)?,
        marks: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn announcement_from_row(row: &Row<'_>) -> rusqlite::Result<Announcement> {
    let is_active: i64 = row.get(3)?;
    Ok(Announcement {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        is_active: is_active != 0,
        created_at: row.get(4)?,
    })
}

fn admin_from_row(row: &Row<'_>) -> rusqlite::Result<Admin> {
    Ok(Admin {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Maps a write error, turning unique-index violations into `duplicate`.
fn write_err(e: rusqlite::Error, duplicate: ResultError) -> ResultError {
    if is_unique_violation(&e) {
        duplicate
    } else {
        ResultError::Db(e)
    }
}

fn expect_changed(changes: usize, missing: ResultError) -> StoreResult<()> {
    if changes == 0 {
        return Err(missing);
    }
    Ok(())
}

impl SqliteStore<'_> {
    fn query_list<T>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> StoreResult<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn query_one<T>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> StoreResult<Option<T>> {
        Ok(self.conn.query_row(sql, params, map).optional()?)
    }
}

impl EntityStore for SqliteStore<'_> {
    fn list_students(&self) -> StoreResult<Vec<Student>> {
        self.query_list(
            &format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY name, roll_number"),
            [],
            student_from_row,
        )
    }

    fn search_students(&self, name: &str) -> StoreResult<Vec<Student>> {
        let pattern = format!("%{}%", name);
        self.query_list(
            &format!(
                "SELECT {STUDENT_COLUMNS} FROM students WHERE name LIKE ? ORDER BY name, roll_number"
            ),
            [&pattern],
            student_from_row,
        )
    }

    fn student(&self, id: &str) -> StoreResult<Option<Student>> {
        self.query_one(
            &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?"),
            [id],
            student_from_row,
        )
    }

    fn student_by_roll(&self, roll_number: &str) -> StoreResult<Option<Student>> {
        self.query_one(
            &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE roll_number = ?"),
            [roll_number],
            student_from_row,
        )
    }

    fn insert_student(&self, input: &StudentInput) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO students(id, roll_number, name, class, section, dob, gender, created_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    &id,
                    &input.roll_number,
                    &input.name,
                    &input.class,
                    &input.section,
                    &input.dob,
                    &input.gender,
                    now_timestamp(),
                ),
            )
            .map_err(|e| write_err(e, ResultError::DuplicateRollNumber))?;
        Ok(id)
    }

    fn update_student(&self, id: &str, input: &StudentInput) -> StoreResult<()> {
        let changes = self
            .conn
            .execute(
                "UPDATE students
                 SET roll_number = ?, name = ?, class = ?, section = ?, dob = ?, gender = ?
                 WHERE id = ?",
                (
                    &input.roll_number,
                    &input.name,
                    &input.class,
                    &input.section,
                    &input.dob,
                    &input.gender,
                    id,
                ),
            )
            .map_err(|e| write_err(e, ResultError::DuplicateRollNumber))?;
        expect_changed(changes, ResultError::StudentNotFound)
    }

    fn delete_student(&self, id: &str) -> StoreResult<()> {
        let changes = self.conn.execute("DELETE FROM students WHERE id = ?", [id])?;
        expect_changed(changes, ResultError::StudentNotFound)
    }

    fn list_exams(&self) -> StoreResult<Vec<Exam>> {
        self.query_list(
            &format!("SELECT {EXAM_COLUMNS} FROM exams ORDER BY year DESC, term, name"),
            [],
            exam_from_row,
        )
    }

    fn exam(&self, id: &str) -> StoreResult<Option<Exam>> {
        self.query_one(
            &format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = ?"),
            [id],
            exam_from_row,
        )
    }

    fn insert_exam(&self, input: &ExamInput) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO exams(id, name, description, class, year, term, created_at)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &id,
                &input.name,
                &input.description,
                &input.class,
                input.year,
                &input.term,
                now_timestamp(),
            ),
        )?;
        Ok(id)
    }

    fn update_exam(&self, id: &str, input: &ExamInput) -> StoreResult<()> {
        let changes = self.conn.execute(
            "UPDATE exams SET name = ?, description = ?, class = ?, year = ?, term = ? WHERE id = ?",
            (
                &input.name,
                &input.description,
                &input.class,
                input.year,
                &input.term,
                id,
            ),
        )?;
        expect_changed(changes, ResultError::ExamNotFound)
    }

    fn delete_exam(&self, id: &str) -> StoreResult<()> {
        let changes = self.conn.execute("DELETE FROM exams WHERE id = ?", [id])?;
        expect_changed(changes, ResultError::ExamNotFound)
    }

    fn list_subjects(&self) -> StoreResult<Vec<Subject>> {
        self.query_list(
            &format!("SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY name, code"),
            [],
            subject_from_row,
        )
    }

    fn subject(&self, id: &str) -> StoreResult<Option<Subject>> {
        self.query_one(
            &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = ?"),
            [id],
            subject_from_row,
        )
    }

    fn subject_by_code(&self, code: &str) -> StoreResult<Option<Subject>> {
        self.query_one(
            &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE code = ?"),
            [code],
            subject_from_row,
        )
    }

    fn insert_subject(&self, input: &SubjectInput) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO subjects(id, name, code, full_marks, pass_marks, class, created_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                (
                    &id,
                    &input.name,
                    &input.code,
                    input.full_marks,
                    input.pass_marks,
                    &input.class,
                    now_timestamp(),
                ),
            )
            .map_err(|e| write_err(e, ResultError::DuplicateSubjectCode))?;
        Ok(id)
    }

    fn update_subject(&self, id: &str, input: &SubjectInput) -> StoreResult<()> {
        let changes = self
            .conn
            .execute(
                "UPDATE subjects
                 SET name = ?, code = ?, full_marks = ?, pass_marks = ?, class = ?
                 WHERE id = ?",
                (
                    &input.name,
                    &input.code,
                    input.full_marks,
                    input.pass_marks,
                    &input.class,
                    id,
                ),
            )
            .map_err(|e| write_err(e, ResultError::DuplicateSubjectCode))?;
        expect_changed(changes, ResultError::SubjectNotFound)
    }

    fn delete_subject(&self, id: &str) -> StoreResult<()> {
        let changes = self.conn.execute("DELETE FROM subjects WHERE id = ?", [id])?;
        expect_changed(changes, ResultError::SubjectNotFound)
    }

    fn max_marks_for_subject(&self, subject_id: &str) -> StoreResult<Option<i64>> {
        Ok(self.conn.query_row(
            "SELECT MAX(marks) FROM results WHERE subject_id = ?",
            [subject_id],
            |r| r.get(0),
        )?)
    }

    fn list_results(&self) -> StoreResult<Vec<ResultListing>> {
        self.query_list(
            "SELECT
               r.id, r.student_id, s.name, s.roll_number,
               r.exam_id, e.name, e.term, e.year,
               r.subject_id, sub.name, sub.code, sub.full_marks, sub.pass_marks,
               r.marks
             FROM results r
             JOIN students s ON s.id = r.student_id
             JOIN exams e ON e.id = r.exam_id
             JOIN subjects sub ON sub.id = r.subject_id
             ORDER BY s.roll_number, e.year DESC, e.term, sub.name",
            [],
            |row| {
                Ok(ResultListing {
                    id: row.get(0)?,
                    student_id: row.get(1)?,
                    student_name: row.get(2)?,
                    roll_number: row.get(3)?,
                    exam_id: row.get(4)?,
                    exam_name: row.get(5)?,
                    term: row.get(6)?,
                    year: row.get(7)?,
                    subject_id: row.get(8)?,
                    subject_name: row.get(9)?,
                    subject_code: row.get(10)?,
                    full_marks: row.get(11)?,
                    pass_marks: row.get(12)?,
                    marks: row.get(13)?,
                })
            },
        )
    }

    fn result(&self, id: &str) -> StoreResult<Option<ResultRecord>> {
        self.query_one(
            &format!("SELECT {RESULT_COLUMNS} FROM results WHERE id = ?"),
            [id],
            result_from_row,
        )
    }

    fn find_result(
        &self,
        student_id: &str,
        exam_id: &str,
        subject_id: &str,
    ) -> StoreResult<Option<ResultRecord>> {
        self.query_one(
            &format!(
                "SELECT {RESULT_COLUMNS} FROM results
                 WHERE student_id = ? AND exam_id = ? AND subject_id = ?"
            ),
            [student_id, exam_id, subject_id],
            result_from_row,
        )
    }

    fn insert_result(
        &self,
        student_id: &str,
        exam_id: &str,
        subject_id: &str,
        marks: i64,
    ) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO results(id, student_id, exam_id, subject_id, marks, created_at)
                 VALUES(?, ?, ?, ?, ?, ?)",
                (&id, student_id, exam_id, subject_id, marks, now_timestamp()),
            )
            .map_err(|e| write_err(e, ResultError::DuplicateResult))?;
        Ok(id)
    }

    fn update_result_marks(&self, id: &str, marks: i64) -> StoreResult<()> {
        let changes = self.conn.execute(
            "UPDATE results SET marks = ?, updated_at = ? WHERE id = ?",
            (marks, now_timestamp(), id),
        )?;
        expect_changed(changes, ResultError::ResultNotFound)
    }

    fn delete_result(&self, id: &str) -> StoreResult<()> {
        let changes = self.conn.execute("DELETE FROM results WHERE id = ?", [id])?;
        expect_changed(changes, ResultError::ResultNotFound)
    }

    fn subject_results(
        &self,
        student_id: &str,
        exam_id: &str,
    ) -> StoreResult<Vec<SubjectResult>> {
        self.query_list(
            "SELECT r.id, sub.id, sub.name, sub.code, sub.full_marks, sub.pass_marks, r.marks
             FROM results r
             JOIN subjects sub ON sub.id = r.subject_id
             WHERE r.student_id = ? AND r.exam_id = ?
             ORDER BY sub.name, sub.code",
            [student_id, exam_id],
            |row| {
                Ok(SubjectResult {
                    result_id: row.get(0)?,
                    subject_id: row.get(1)?,
                    subject_name: row.get(2)?,
                    subject_code: row.get(3)?,
                    full_marks: row.get(4)?,
                    pass_marks: row.get(5)?,
                    marks: row.get(6)?,
                })
            },
        )
    }

    fn list_announcements(&self, active_only: bool) -> StoreResult<Vec<Announcement>> {
        let filter = if active_only { "WHERE is_active = 1" } else { "" };
        self.query_list(
            &format!(
                "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements {filter}
                 ORDER BY created_at DESC, rowid DESC"
            ),
            [],
            announcement_from_row,
        )
    }

    fn announcement(&self, id: &str) -> StoreResult<Option<Announcement>> {
        self.query_one(
            &format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE id = ?"),
            [id],
            announcement_from_row,
        )
    }

    fn insert_announcement(&self, input: &AnnouncementInput) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO announcements(id, title, content, is_active, created_at)
             VALUES(?, ?, ?, ?, ?)",
            (
                &id,
                &input.title,
                &input.content,
                input.is_active as i64,
                now_timestamp(),
            ),
        )?;
        Ok(id)
    }

    fn update_announcement(&self, id: &str, input: &AnnouncementInput) -> StoreResult<()> {
        let changes = self.conn.execute(
            "UPDATE announcements SET title = ?, content = ?, is_active = ? WHERE id = ?",
            (&input.title, &input.content, input.is_active as i64, id),
        )?;
        expect_changed(changes, ResultError::AnnouncementNotFound)
    }

    fn delete_announcement(&self, id: &str) -> StoreResult<()> {
        let changes = self
            .conn
            .execute("DELETE FROM announcements WHERE id = ?", [id])?;
        expect_changed(changes, ResultError::AnnouncementNotFound)
    }

    fn list_admins(&self) -> StoreResult<Vec<Admin>> {
        self.query_list(
            "SELECT id, username, name, email, created_at FROM admins ORDER BY username",
            [],
            admin_from_row,
        )
    }

    fn count_admins(&self) -> StoreResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM admins", [], |r| r.get(0))?)
    }

    fn admin_credentials(&self, username: &str) -> StoreResult<Option<AdminCredentials>> {
        self.query_one(
            "SELECT id, username, name, email, created_at, password_hash
             FROM admins WHERE username = ?",
            [username],
            |row| {
                Ok(AdminCredentials {
                    admin: admin_from_row(row)?,
                    password_hash: row.get(5)?,
                })
            },
        )
    }

    fn insert_admin(
        &self,
        username: &str,
        password_hash: &str,
        name: &str,
        email: Option<&str>,
    ) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        self.conn
            .execute(
                "INSERT INTO admins(id, username, password_hash, name, email, created_at)
                 VALUES(?, ?, ?, ?, ?, ?)",
                (&id, username, password_hash, name, email, now_timestamp()),
            )
            .map_err(|e| write_err(e, ResultError::DuplicateUsername))?;
        Ok(id)
    }
}
