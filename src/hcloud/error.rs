/// Errors that can occur when talking to the HCloud API.
///
/// # Examples
///
/// ```rust
/// use hcloud_pricing_exporter::hcloud::error::ApiError;
///
/// let err = ApiError::Http { status: 503, body: "maintenance".to_string() };
/// assert!(err.to_string().contains("503"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// An underlying HTTP transport error from `reqwest`, including timeouts.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx status code without a recognisable HCloud error body.
    #[error("HCloud API HTTP error: status={status}, body={body}")]
    Http { status: u16, body: String },

    /// Non-2xx status code carrying the HCloud error envelope.
    #[error("HCloud API error: status={status}, code={code}, message={message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Response payload did not match the expected shape.
    #[error("failed to decode HCloud API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A price string in the catalog is not a decimal number.
    #[error("invalid price '{value}' for {field}")]
    InvalidPrice { field: String, value: String },
}

impl ApiError {
    /// True when the request never produced a response within the client timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network(e) if e.is_timeout())
    }
}

/// Convenience alias for client results.
pub type Result<T> = std::result::Result<T, ApiError>;
