use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::repository::StoreError;
use super::sqlite::SqliteRecordStore;

pub const COURSES_FILE: &str = "courses.csv";
pub const STUDENTS_FILE: &str = "students.csv";
pub const ENROLLMENTS_FILE: &str = "enrollments.csv";
pub const GRADES_FILE: &str = "grades.csv";
pub const TUTORS_FILE: &str = "tutors.csv";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CourseRow {
    pub code: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StudentRow {
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnrollmentRow {
    pub student_id: i64,
    pub course_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GradeRow {
    pub student_id: i64,
    pub course_code: String,
    pub grade: String,
    pub recorded_on: NaiveDate,
}

/// Registers an existing student as a peer tutor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TutorRow {
    pub first_name: String,
    pub last_name: String,
    pub student_id: i64,
}

/// Academic records loaded from a directory of CSV exports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub courses: Vec<CourseRow>,
    pub students: Vec<StudentRow>,
    pub enrollments: Vec<EnrollmentRow>,
    pub grades: Vec<GradeRow>,
    pub tutors: Vec<TutorRow>,
}

impl Catalog {
    /// Read every known table from `dir`. Files that are absent are left empty.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ImportError> {
        let dir = dir.as_ref();
        Ok(Self {
            courses: read_optional(&dir.join(COURSES_FILE))?,
            students: read_optional(&dir.join(STUDENTS_FILE))?,
            enrollments: read_optional(&dir.join(ENROLLMENTS_FILE))?,
            grades: read_optional(&dir.join(GRADES_FILE))?,
            tutors: read_optional(&dir.join(TUTORS_FILE))?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
            && self.students.is_empty()
            && self.enrollments.is_empty()
            && self.grades.is_empty()
            && self.tutors.is_empty()
    }
}

/// Row counts applied by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub courses: usize,
    pub students: usize,
    pub enrollments: usize,
    pub grades: usize,
    pub tutors: usize,
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn import_dir<P: AsRef<Path>>(
        store: &SqliteRecordStore,
        dir: P,
    ) -> Result<ImportSummary, ImportError> {
        let catalog = Catalog::from_dir(dir)?;
        let summary = store.load_catalog(&catalog)?;
        Ok(summary)
    }
}

pub fn parse_table<T, R>(reader: R) -> Result<Vec<T>, csv::Error>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader.deserialize::<T>().collect()
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ImportError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    parse_table(file).map_err(|source| ImportError::Csv {
        file: path.display().to_string(),
        source,
    })
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv { file: String, source: csv::Error },
    Store(StoreError),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read catalog export: {}", err),
            ImportError::Csv { file, source } => {
                write!(f, "invalid CSV data in {}: {}", file, source)
            }
            ImportError::Store(err) => write!(f, "could not load catalog into store: {}", err),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv { source, .. } => Some(source),
            ImportError::Store(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<StoreError> for ImportError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_students_with_blank_email() {
        let csv = "student_id,first_name,last_name,email\n7, Jane ,Doe,\n";
        let rows: Vec<StudentRow> = parse_table(Cursor::new(csv)).expect("students parse");
        assert_eq!(
            rows,
            vec![StudentRow {
                student_id: 7,
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: None,
            }]
        );
    }

    #[test]
    fn grade_rows_require_iso_dates() {
        let csv = "student_id,course_code,grade,recorded_on\n7,CS101,A,May 2023\n";
        let parsed: Result<Vec<GradeRow>, _> = parse_table(Cursor::new(csv));
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_files_yield_empty_catalog() {
        let dir = tempfile::tempdir().expect("temp dir");
        let catalog = Catalog::from_dir(dir.path()).expect("empty dir reads");
        assert!(catalog.is_empty());
    }
}
