//! SQLite-backed record store.
//!
//! Schema:
//! - `student`: academic identity (id, names, email)
//! - `course`: catalog keyed by course code
//! - `student_course`: enrollment records
//! - `grade`: letter grades with the date they were recorded
//! - `peer_tutor`: registered tutors, each linked to exactly one student by `student_id`
//! - `peer_tutor_course`: assignments, unique per (tutor, course)

mod pool;

pub use pool::{ConnectionPool, PooledConnection};

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::catalog::{Catalog, ImportSummary};
use super::domain::{CandidatePair, CourseCode, LetterGrade, Tutor, TutorId, TutorName};
use super::repository::{RecordStore, StoreError};
use crate::config::StoreConfig;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS student (
    student_id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT
);
CREATE TABLE IF NOT EXISTS course (
    course_code TEXT PRIMARY KEY,
    title TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS student_course (
    student_id INTEGER NOT NULL REFERENCES student(student_id),
    course_code TEXT NOT NULL REFERENCES course(course_code),
    PRIMARY KEY (student_id, course_code)
);
CREATE TABLE IF NOT EXISTS grade (
    grade_id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL REFERENCES student(student_id),
    course_code TEXT NOT NULL REFERENCES course(course_code),
    grade_code TEXT NOT NULL,
    recorded_on TEXT NOT NULL,
    UNIQUE (student_id, course_code, recorded_on)
);
CREATE TABLE IF NOT EXISTS peer_tutor (
    peer_tutor_id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    student_id INTEGER NOT NULL UNIQUE REFERENCES student(student_id)
);
CREATE INDEX IF NOT EXISTS peer_tutor_name_idx ON peer_tutor (first_name, last_name);
CREATE TABLE IF NOT EXISTS peer_tutor_course (
    peer_tutor_id INTEGER NOT NULL REFERENCES peer_tutor(peer_tutor_id),
    course_code TEXT NOT NULL REFERENCES course(course_code),
    assigned_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (peer_tutor_id, course_code)
);
";

const FIND_TUTOR: &str = "SELECT peer_tutor_id, first_name, last_name FROM peer_tutor
    WHERE first_name = ?1 AND last_name = ?2
    ORDER BY peer_tutor_id LIMIT 1";

const COURSE_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM course WHERE course_code = ?1)";

const HAS_TAKEN_COURSE: &str = "SELECT EXISTS (
    SELECT 1 FROM peer_tutor pt
    JOIN student_course sc ON sc.student_id = pt.student_id
    WHERE pt.peer_tutor_id = (
        SELECT peer_tutor_id FROM peer_tutor
        WHERE first_name = ?1 AND last_name = ?2
        ORDER BY peer_tutor_id LIMIT 1
    )
    AND sc.course_code = ?3
)";

const LATEST_GRADE: &str = "SELECT g.grade_code FROM peer_tutor pt
    JOIN grade g ON g.student_id = pt.student_id
    WHERE pt.peer_tutor_id = (
        SELECT peer_tutor_id FROM peer_tutor
        WHERE first_name = ?1 AND last_name = ?2
        ORDER BY peer_tutor_id LIMIT 1
    )
    AND g.course_code = ?3
    ORDER BY g.recorded_on DESC, g.grade_id DESC
    LIMIT 1";

const IS_ASSIGNED: &str = "SELECT EXISTS (
    SELECT 1 FROM peer_tutor_course ptc
    WHERE ptc.peer_tutor_id = (
        SELECT peer_tutor_id FROM peer_tutor
        WHERE first_name = ?1 AND last_name = ?2
        ORDER BY peer_tutor_id LIMIT 1
    )
    AND ptc.course_code = ?3
)";

const INSERT_ASSIGNMENT: &str =
    "INSERT INTO peer_tutor_course (peer_tutor_id, course_code) VALUES (?1, ?2)";

const ROSTER: &str = "SELECT pt.peer_tutor_id, pt.first_name, pt.last_name
    FROM peer_tutor_course ptc
    JOIN peer_tutor pt ON pt.peer_tutor_id = ptc.peer_tutor_id
    WHERE ptc.course_code = ?1
    ORDER BY pt.peer_tutor_id";

/// Record store persisting tutors, the course catalog, and assignments in SQLite.
#[derive(Debug)]
pub struct SqliteRecordStore {
    pool: ConnectionPool,
}

impl SqliteRecordStore {
    /// Open (creating if needed) the database described by the configuration.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::open_path(&config.database_path, config.pool_size, config.busy_timeout)
    }

    pub fn open_path(
        path: impl AsRef<Path>,
        pool_size: usize,
        busy_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = ConnectionPool::new(path, pool_size, busy_timeout);
        {
            let conn = pool.get()?;
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
                .map_err(store_error)?;
            conn.execute_batch(SCHEMA).map_err(store_error)?;
        }
        debug!(path = %pool.path().display(), size = pool.size(), "record store ready");
        Ok(Self { pool })
    }

    pub fn path(&self) -> &Path {
        self.pool.path()
    }

    /// Upsert catalog rows in a single transaction.
    pub fn load_catalog(&self, catalog: &Catalog) -> Result<ImportSummary, StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(store_error)?;

        for course in &catalog.courses {
            tx.execute(
                "INSERT INTO course (course_code, title) VALUES (?1, ?2)
                 ON CONFLICT (course_code) DO UPDATE SET title = excluded.title",
                params![course.code, course.title],
            )
            .map_err(store_error)?;
        }

        for student in &catalog.students {
            tx.execute(
                "INSERT INTO student (student_id, first_name, last_name, email)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (student_id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    email = excluded.email",
                params![
                    student.student_id,
                    student.first_name,
                    student.last_name,
                    student.email
                ],
            )
            .map_err(store_error)?;
        }

        for enrollment in &catalog.enrollments {
            tx.execute(
                "INSERT OR IGNORE INTO student_course (student_id, course_code) VALUES (?1, ?2)",
                params![enrollment.student_id, enrollment.course_code],
            )
            .map_err(store_error)?;
        }

        for grade in &catalog.grades {
            tx.execute(
                "INSERT INTO grade (student_id, course_code, grade_code, recorded_on)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (student_id, course_code, recorded_on)
                 DO UPDATE SET grade_code = excluded.grade_code",
                params![
                    grade.student_id,
                    grade.course_code,
                    grade.grade,
                    grade.recorded_on
                ],
            )
            .map_err(store_error)?;
        }

        for tutor in &catalog.tutors {
            tx.execute(
                "INSERT INTO peer_tutor (first_name, last_name, student_id) VALUES (?1, ?2, ?3)
                 ON CONFLICT (student_id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name",
                params![tutor.first_name, tutor.last_name, tutor.student_id],
            )
            .map_err(store_error)?;
        }

        tx.commit().map_err(store_error)?;

        Ok(ImportSummary {
            courses: catalog.courses.len(),
            students: catalog.students.len(),
            enrollments: catalog.enrollments.len(),
            grades: catalog.grades.len(),
            tutors: catalog.tutors.len(),
        })
    }

    /// Number of assignment rows recorded for the pair.
    pub fn assignment_count(&self, pair: &CandidatePair) -> Result<u32, StoreError> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT COUNT(*) FROM peer_tutor_course ptc
             JOIN peer_tutor pt ON pt.peer_tutor_id = ptc.peer_tutor_id
             WHERE pt.first_name = ?1 AND pt.last_name = ?2 AND ptc.course_code = ?3",
            params![
                pair.tutor.first_name,
                pair.tutor.last_name,
                pair.course.as_str()
            ],
            |row| row.get(0),
        )
        .map_err(store_error)
    }
}

impl RecordStore for SqliteRecordStore {
    fn find_tutor(&self, name: &TutorName) -> Result<Option<Tutor>, StoreError> {
        let conn = self.pool.get()?;
        conn.query_row(FIND_TUTOR, params![name.first_name, name.last_name], tutor_row)
            .optional()
            .map_err(store_error)
    }

    fn course_exists(&self, course: &CourseCode) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        conn.query_row(COURSE_EXISTS, params![course.as_str()], |row| row.get(0))
            .map_err(store_error)
    }

    fn has_taken_course(&self, name: &TutorName, course: &CourseCode) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        conn.query_row(
            HAS_TAKEN_COURSE,
            params![name.first_name, name.last_name, course.as_str()],
            |row| row.get(0),
        )
        .map_err(store_error)
    }

    fn latest_grade(
        &self,
        name: &TutorName,
        course: &CourseCode,
    ) -> Result<Option<LetterGrade>, StoreError> {
        let conn = self.pool.get()?;
        conn.query_row(
            LATEST_GRADE,
            params![name.first_name, name.last_name, course.as_str()],
            |row| row.get(0).map(LetterGrade),
        )
        .optional()
        .map_err(store_error)
    }

    fn is_assigned(&self, name: &TutorName, course: &CourseCode) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        conn.query_row(
            IS_ASSIGNED,
            params![name.first_name, name.last_name, course.as_str()],
            |row| row.get(0),
        )
        .map_err(store_error)
    }

    fn commit_assignment(&self, pair: &CandidatePair) -> Result<Vec<Tutor>, StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(store_error)?;

        let tutor = tx
            .query_row(
                FIND_TUTOR,
                params![pair.tutor.first_name, pair.tutor.last_name],
                tutor_row,
            )
            .optional()
            .map_err(store_error)?
            .ok_or_else(|| StoreError::NotFound(format!("peer tutor {}", pair.tutor)))?;

        tx.execute(INSERT_ASSIGNMENT, params![tutor.id.0, pair.course.as_str()])
            .map_err(store_error)?;

        let roster = load_roster(&tx, &pair.course)?;
        tx.commit().map_err(store_error)?;
        Ok(roster)
    }

    fn roster(&self, course: &CourseCode) -> Result<Vec<Tutor>, StoreError> {
        let conn = self.pool.get()?;
        load_roster(&conn, course)
    }
}

fn load_roster(conn: &Connection, course: &CourseCode) -> Result<Vec<Tutor>, StoreError> {
    let mut stmt = conn.prepare_cached(ROSTER).map_err(store_error)?;
    let rows = stmt
        .query_map(params![course.as_str()], tutor_row)
        .map_err(store_error)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(store_error)
}

fn tutor_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tutor> {
    Ok(Tutor {
        id: TutorId(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
    })
}

fn store_error(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::ConstraintViolation
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                StoreError::Conflict
            }
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::NotADatabase
            | ErrorCode::SystemIoFailure => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        },
        _ => StoreError::Query(err.to_string()),
    }
}
