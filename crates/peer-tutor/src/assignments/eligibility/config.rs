use serde::{Deserialize, Serialize};

/// Letter grades that make a student eligible to tutor a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradePolicy {
    pub qualifying_grades: Vec<String>,
}

impl Default for GradePolicy {
    fn default() -> Self {
        Self {
            qualifying_grades: vec!["A".to_string(), "A-".to_string(), "A+".to_string()],
        }
    }
}

impl GradePolicy {
    /// Parse a comma-separated list such as `A,A-,A+`; `None` when nothing remains after trimming.
    pub fn from_list(raw: &str) -> Option<Self> {
        let qualifying_grades: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|grade| !grade.is_empty())
            .map(str::to_string)
            .collect();

        if qualifying_grades.is_empty() {
            None
        } else {
            Some(Self { qualifying_grades })
        }
    }

    /// Exact, case-sensitive comparison against the recorded grade.
    pub fn qualifies(&self, grade: &str) -> bool {
        let grade = grade.trim();
        self.qualifying_grades
            .iter()
            .any(|qualifying| qualifying == grade)
    }
}
