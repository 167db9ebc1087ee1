use reqwest::StatusCode;
use thiserror::Error;

/// Failures of a partner API call.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not signed in - partner session is missing or expired")]
    Unauthorized,

    #[error("Signed-in user does not manage a store: {0}")]
    NotStoreManager(String),

    #[error("Managed store not found: {0}")]
    StoreNotFound(String),

    #[error("Profile rejected by the partner API: {0}")]
    Rejected(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Partner API error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedStatus(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Cut a response body down to `MAX_ERROR_BODY_LENGTH` bytes on a char
    /// boundary.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let end = (0..=MAX_ERROR_BODY_LENGTH)
            .rev()
            .find(|&i| body.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}... ({} bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = Self::truncate_body(body);
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::NotStoreManager(body),
            StatusCode::NOT_FOUND => ApiError::StoreNotFound(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Rejected(body),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
            s if s.is_server_error() => ApiError::ServerError(body),
            s => ApiError::UnexpectedStatus(format!("{}: {}", s, body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_partner_api_codes() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, ApiError::Unauthorized));

        let err = ApiError::from_status(StatusCode::FORBIDDEN, "no store");
        assert!(matches!(err, ApiError::NotStoreManager(b) if b == "no store"));

        let err = ApiError::from_status(StatusCode::NOT_FOUND, "");
        assert!(matches!(err, ApiError::StoreNotFound(_)));

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "name required");
        assert!(matches!(err, ApiError::Rejected(b) if b == "name required"));

        let err = ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, ApiError::RateLimited));

        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(err, ApiError::ServerError(_)));

        let err = ApiError::from_status(StatusCode::IM_A_TEAPOT, "");
        assert!(matches!(err, ApiError::UnexpectedStatus(_)));
    }

    #[test]
    fn test_truncate_body() {
        let long = "é".repeat(400); // 800 bytes, two per char
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.ends_with("... (800 bytes)"));

        assert_eq!(ApiError::truncate_body("short"), "short");
    }
}
