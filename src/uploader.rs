use crate::api::SubmissionApi;
use crate::config::ALLOWED_EXTENSIONS;
use crate::error::ApiError;
use crate::models::Submission;
use std::path::Path;
use thiserror::Error;

/// Client-side rejection; no request is made when one of these fires.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileCheckError {
    #[error("Format file harus PDF, DOC, atau DOCX.")]
    UnsupportedExtension,
    #[error("Ukuran file maksimal {0}MB.")]
    TooLarge(u64),
}

// Not `transparent`: the wrapped error must stay visible via `source()` so
// the command layer can spot an expired session inside an upload failure.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    Rejected(#[from] FileCheckError),
    #[error("{0}")]
    Api(#[from] ApiError),
}

/// Validate the answer file against the portal's constraints: extension in
/// {pdf, doc, docx} (case-insensitive) and size within the configured cap.
pub fn check_file(file_name: &str, size_bytes: u64, max_bytes: u64) -> Result<(), FileCheckError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => return Err(FileCheckError::UnsupportedExtension),
    }

    if size_bytes > max_bytes {
        return Err(FileCheckError::TooLarge(max_bytes / (1024 * 1024)));
    }

    Ok(())
}

/// Sends a student's answer file for one materi, enforcing the client-side
/// constraints before any request goes out.
pub struct Uploader<S> {
    api: S,
    max_bytes: u64,
}

impl<S: SubmissionApi> Uploader<S> {
    pub fn new(api: S, max_bytes: u64) -> Self {
        Self { api, max_bytes }
    }

    /// On success the returned record replaces any previously held
    /// submission, entering "pending grading" immediately.
    pub async fn submit(
        &self,
        materi_id: u64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Submission, UploadError> {
        check_file(file_name, bytes.len() as u64, self.max_bytes)?;
        let submission = self.api.submit_file(materi_id, file_name, bytes).await?;
        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts requests and answers every submit with a fixed record.
    #[derive(Clone, Default)]
    struct CountingApi {
        requests: Arc<AtomicUsize>,
    }

    impl SubmissionApi for CountingApi {
        async fn fetch_my_submission(
            &self,
            _materi_id: u64,
        ) -> Result<Option<Submission>, ApiError> {
            panic!("fetch_my_submission not expected in uploader tests");
        }

        async fn submit_file(
            &self,
            materi_id: u64,
            file_name: &str,
            _bytes: Vec<u8>,
        ) -> Result<Submission, ApiError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(Submission {
                id: 99,
                user_id: Some(7),
                file_path: format!("submissions/{}/{}", materi_id, file_name),
                submitted_at: Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap(),
                grade: None,
                feedback: None,
                user: None,
            })
        }
    }

    #[test]
    fn accepts_the_allowed_extensions() {
        for name in ["jawaban.pdf", "jawaban.doc", "jawaban.docx", "JAWABAN.PDF"] {
            assert_eq!(check_file(name, 1024, DEFAULT_MAX_UPLOAD_BYTES), Ok(()));
        }
    }

    #[test]
    fn rejects_other_extensions() {
        for name in ["jawaban.zip", "jawaban.exe", "jawaban", "jawaban.pdf.txt"] {
            assert_eq!(
                check_file(name, 1024, DEFAULT_MAX_UPLOAD_BYTES),
                Err(FileCheckError::UnsupportedExtension)
            );
        }
    }

    #[test]
    fn size_cap_is_inclusive() {
        assert_eq!(
            check_file("jawaban.pdf", DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MAX_UPLOAD_BYTES),
            Ok(())
        );
        assert_eq!(
            check_file("jawaban.pdf", DEFAULT_MAX_UPLOAD_BYTES + 1, DEFAULT_MAX_UPLOAD_BYTES),
            Err(FileCheckError::TooLarge(10))
        );
    }

    #[test]
    fn oversize_message_names_the_limit() {
        let err = check_file("jawaban.pdf", 3 * 1024 * 1024, 2 * 1024 * 1024).unwrap_err();
        assert_eq!(err.to_string(), "Ukuran file maksimal 2MB.");
    }

    #[tokio::test]
    async fn oversized_file_makes_no_request() {
        let api = CountingApi::default();
        let uploader = Uploader::new(api.clone(), DEFAULT_MAX_UPLOAD_BYTES);

        // 10.5 MB payload against the 10 MB cap.
        let bytes = vec![0u8; (10 * 1024 * 1024) + (512 * 1024)];
        let err = uploader.submit(3, "jawaban.pdf", bytes).await.unwrap_err();

        assert!(matches!(
            err,
            UploadError::Rejected(FileCheckError::TooLarge(10))
        ));
        assert_eq!(err.to_string(), "Ukuran file maksimal 10MB.");
        assert_eq!(api.requests.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unauthorized_upload_surfaces_in_the_error_chain() {
        // The session-clearing path walks the anyhow chain looking for a
        // 401; the upload wrapper must not hide it.
        let err = anyhow::Error::from(UploadError::Api(ApiError::Unauthorized));
        let expired = err
            .chain()
            .any(|cause| matches!(cause.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)));
        assert!(expired);
    }

    #[tokio::test]
    async fn valid_file_submits_and_returns_pending_record() {
        let api = CountingApi::default();
        let uploader = Uploader::new(api.clone(), DEFAULT_MAX_UPLOAD_BYTES);

        let submission = uploader
            .submit(3, "jawaban.docx", vec![0u8; 2048])
            .await
            .unwrap();

        assert_eq!(api.requests.load(Ordering::SeqCst), 1);
        assert!(submission.is_ungraded());
        assert_eq!(submission.file_name(), "jawaban.docx");
    }
}
