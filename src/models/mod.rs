use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Portal API Models
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub nisn: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Role {
    pub name: String,
}

/// A learning material / assignment record ("materi").
///
/// `deadline` and `passing_grade` are both optional: no deadline means
/// submissions are accepted indefinitely, no passing grade means any graded
/// submission counts as complete.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Materi {
    pub id: u64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub passing_grade: Option<u8>,
    #[serde(default)]
    pub rubric: Option<String>,
    #[serde(default)]
    pub user: Option<Author>,
    // List endpoints annotate each materi with the caller's progress.
    #[serde(default)]
    pub is_submitted: bool,
    #[serde(default)]
    pub needs_improvement: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Author {
    pub name: String,
}

/// Assignment detail as served by `GET /materi/:slug`, including the calling
/// student's submission when one exists.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MateriDetail {
    #[serde(flatten)]
    pub materi: Materi,
    #[serde(default)]
    pub my_submission: Option<Submission>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Submission {
    pub id: u64,
    #[serde(default)]
    pub user_id: Option<u64>,
    pub file_path: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub grade: Option<u8>,
    #[serde(default)]
    pub feedback: Option<String>,
    // Present on the admin listing endpoint only.
    #[serde(default)]
    pub user: Option<StudentRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StudentRef {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub nisn: Option<String>,
}

impl Submission {
    /// The grading process writes grade and feedback together; until it has
    /// run, both are absent. An empty feedback string counts as absent.
    pub fn is_ungraded(&self) -> bool {
        self.grade.is_none()
            && self
                .feedback
                .as_deref()
                .map(|f| f.trim().is_empty())
                .unwrap_or(true)
    }

    pub fn file_name(&self) -> &str {
        self.file_path.rsplit('/').next().unwrap_or(&self.file_path)
    }
}

/// Entry of the student dashboard's "not yet done" list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskSummary {
    pub id: u64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub passing_grade: Option<u8>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassRoom {
    pub id: u64,
    pub name: String,
}

// ============================================================================
// Grade Recap Models
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GradeRecap {
    pub class_room: ClassRoom,
    pub materis: Vec<MateriRef>,
    pub students: Vec<RecapStudent>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MateriRef {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecapStudent {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub nisn: Option<String>,
    /// Keyed by materi id (as a string, matching the wire format); preserves
    /// the column order the backend sends.
    pub grades: IndexMap<String, Option<u8>>,
}

// ============================================================================
// Error Body
// ============================================================================

/// Error payload shapes the backend uses: a `message` or `error` string for
/// generic failures, and a field-keyed `errors` map for 422 validation.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Option<IndexMap<String, Vec<String>>>,
}

impl ErrorBody {
    /// Flatten a 422-style field-error map into one human-readable string.
    pub fn flatten_field_errors(&self) -> Option<String> {
        let errors = self.errors.as_ref()?;
        let flat: Vec<String> = errors.values().flatten().cloned().collect();
        if flat.is_empty() {
            None
        } else {
            Some(flat.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn submission(grade: Option<u8>, feedback: Option<&str>) -> Submission {
        Submission {
            id: 1,
            user_id: Some(7),
            file_path: "submissions/7/jawaban.pdf".to_string(),
            submitted_at: Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap(),
            grade,
            feedback: feedback.map(str::to_string),
            user: None,
        }
    }

    #[test]
    fn ungraded_requires_both_fields_absent() {
        assert!(submission(None, None).is_ungraded());
        assert!(submission(None, Some("")).is_ungraded());
        assert!(submission(None, Some("   ")).is_ungraded());
        assert!(!submission(Some(80), Some("ok")).is_ungraded());
        // Half-written records still count as graded.
        assert!(!submission(Some(80), None).is_ungraded());
        assert!(!submission(None, Some("perlu revisi")).is_ungraded());
    }

    #[test]
    fn submission_wire_shape_parses() {
        let json = r#"{
            "id": 12,
            "file_path": "submissions/3/tugas-1.docx",
            "submitted_at": "2025-01-10T08:00:00Z",
            "grade": null,
            "feedback": null
        }"#;
        let sub: Submission = serde_json::from_str(json).unwrap();
        assert!(sub.is_ungraded());
        assert_eq!(sub.file_name(), "tugas-1.docx");
    }

    #[test]
    fn materi_detail_carries_my_submission() {
        let json = r#"{
            "id": 3,
            "title": "Jaringan Dasar",
            "slug": "jaringan-dasar",
            "content": "...",
            "created_at": "2025-01-01T00:00:00Z",
            "deadline": "2025-02-01T00:00:00Z",
            "passing_grade": 75,
            "my_submission": {
                "id": 12,
                "file_path": "submissions/3/tugas.pdf",
                "submitted_at": "2025-01-10T08:00:00Z",
                "grade": 80,
                "feedback": "Bagus"
            }
        }"#;
        let detail: MateriDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.materi.passing_grade, Some(75));
        assert_eq!(detail.my_submission.unwrap().grade, Some(80));
    }

    #[test]
    fn field_errors_flatten_in_order() {
        let json = r#"{
            "message": "The given data was invalid.",
            "errors": {
                "file": ["File wajib diisi.", "Format file tidak didukung."],
                "materi_id": ["Materi tidak ditemukan."]
            }
        }"#;
        let body: ErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(
            body.flatten_field_errors().unwrap(),
            "File wajib diisi. Format file tidak didukung. Materi tidak ditemukan."
        );
    }
}
