use thiserror::Error;

/// Failure categories for calls against the portal API.
///
/// `Unauthorized` is special-cased by the command layer: the stored session
/// is cleared and the user is told to log in again. Everything else is shown
/// as-is (server text verbatim, generic text for transport failures).
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (DNS, refused connection, timeout).
    #[error("Terjadi kesalahan koneksi. Silahkan coba lagi.")]
    Connection(#[source] reqwest::Error),

    /// 401 from any endpoint; the bearer token is no longer valid.
    #[error("Sesi Anda telah berakhir. Silahkan login kembali.")]
    Unauthorized,

    /// 422-style response: field errors flattened into one string.
    #[error("{0}")]
    Validation(String),

    /// Any other non-2xx with a server-provided (or generic) message.
    #[error("{0}")]
    Server(String),

    /// 2xx whose body did not match the expected shape.
    #[error("Gagal membaca respons server.")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    /// Generic message used when the server replies without a usable
    /// `message`/`error` field.
    pub fn generic_server() -> Self {
        ApiError::Server("Terjadi kesalahan pada server. Silahkan coba lagi.".to_string())
    }
}
