use super::SubmissionApi;
use crate::error::ApiError;
use crate::models::{
    ClassRoom, ErrorBody, GradeRecap, LoginResponse, Materi, MateriDetail, Submission, TaskSummary,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct PortalClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("materi-fetcher"));
        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Resolve a stored file reference against the portal's `/storage`
    /// prefix, unless it is already an absolute URL.
    pub fn storage_url(&self, file_path: &str) -> String {
        if file_path.starts_with("http://") || file_path.starts_with("https://") {
            file_path.to_string()
        } else {
            format!("{}/storage/{}", self.base_url, file_path.trim_start_matches('/'))
        }
    }

    /// Map a response to the error taxonomy: 401 ends the session, 422-style
    /// field errors are flattened, other failures surface the server's
    /// message verbatim (or a generic one when it sends none).
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        let text = response.text().await.map_err(ApiError::Connection)?;

        if !status.is_success() {
            let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
            if let Some(flat) = body.flatten_field_errors() {
                return Err(ApiError::Validation(flat));
            }
            if let Some(message) = body.message.or(body.error) {
                return Err(ApiError::Server(message));
            }
            return Err(ApiError::generic_server());
        }

        serde_json::from_str(&text).map_err(ApiError::Decode)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.api_url(path))
            .headers(self.build_headers())
            .send()
            .await
            .map_err(ApiError::Connection)?;
        Self::decode(response).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .client
            .post(self.api_url("/login"))
            .headers(self.build_headers())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(ApiError::Connection)?;

        // A wrong password comes back as 401 here, which is a message to
        // show, not an expired session.
        if response.status() == StatusCode::UNAUTHORIZED {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            let message = body.message.or(body.error).unwrap_or_else(|| {
                "Login gagal. Periksa kembali email dan password Anda.".to_string()
            });
            return Err(ApiError::Server(message));
        }

        Self::decode(response).await
    }

    pub async fn list_materi(&self) -> Result<Vec<Materi>, ApiError> {
        self.get("/materi").await
    }

    pub async fn pending_tasks(&self) -> Result<Vec<TaskSummary>, ApiError> {
        self.get("/materi/pending-tasks").await
    }

    pub async fn get_materi(&self, slug: &str) -> Result<MateriDetail, ApiError> {
        self.get(&format!("/materi/{}", slug)).await
    }

    pub async fn list_submissions(&self, materi_id: u64) -> Result<Vec<Submission>, ApiError> {
        self.get(&format!("/materi/{}/submissions", materi_id)).await
    }

    pub async fn delete_submission(&self, submission_id: u64) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.api_url(&format!("/submissions/{}", submission_id)))
            .headers(self.build_headers())
            .send()
            .await
            .map_err(ApiError::Connection)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            return Err(body
                .message
                .or(body.error)
                .map(ApiError::Server)
                .unwrap_or_else(ApiError::generic_server));
        }
        Ok(())
    }

    pub async fn class_rooms(&self) -> Result<Vec<ClassRoom>, ApiError> {
        self.get("/class-rooms").await
    }

    pub async fn grade_recap(&self, class_id: u64) -> Result<GradeRecap, ApiError> {
        self.get(&format!("/rekap-nilai/{}", class_id)).await
    }
}

impl SubmissionApi for PortalClient {
    async fn fetch_my_submission(&self, materi_id: u64) -> Result<Option<Submission>, ApiError> {
        let response = self
            .client
            .get(self.api_url(&format!("/materi/{}/my-submission", materi_id)))
            .headers(self.build_headers())
            .send()
            .await
            .map_err(ApiError::Connection)?;

        // No submission on record yet (or an admin deleted it).
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Self::decode(response).await
    }

    async fn submit_file(
        &self,
        materi_id: u64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Submission, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.api_url(&format!("/materi/{}/submit", materi_id)))
            .headers(self.build_headers())
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::Connection)?;

        Self::decode(response).await
    }
}
