mod portal;

pub use portal::PortalClient;

use crate::error::ApiError;
use crate::models::Submission;

/// The two calls the submission workflow makes, abstracted so the uploader
/// and the grading watcher can be exercised against an in-memory double.
#[allow(async_fn_in_trait)]
pub trait SubmissionApi {
    /// `GET /materi/:id/my-submission`. `None` means the student currently
    /// has no submission for this materi (never submitted, or an admin
    /// deleted it).
    async fn fetch_my_submission(&self, materi_id: u64) -> Result<Option<Submission>, ApiError>;

    /// `POST /materi/:id/submit` with the file as a multipart part. Replaces
    /// any previous submission for this (student, materi) pair.
    async fn submit_file(
        &self,
        materi_id: u64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Submission, ApiError>;
}
