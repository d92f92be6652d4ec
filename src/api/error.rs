use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unauthorized - please log in again")]
    Unauthorized,
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("no authentication token")]
    NotAuthenticated,
    #[error("channel is closed")]
    ChannelClosed,
    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Picks the human readable message out of an error body.
///
/// The backend is not consistent: structured errors use `{"error": {"message"}}`,
/// framework errors use `{"detail"}` and the register route uses `{"Error"}`.
pub fn error_message(body: &serde_json::Value) -> String {
    const FALLBACK: &str = "Something went wrong";
    if let Some(err) = body.get("error") {
        return err
            .get("message")
            .and_then(|v| v.as_str())
            .or_else(|| err.as_str())
            .unwrap_or(FALLBACK)
            .to_string();
    }
    body.get("detail")
        .or_else(|| body.get("Error"))
        .and_then(|v| v.as_str())
        .unwrap_or(FALLBACK)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn picks_structured_message() {
        let body = json!({"error": {"code": "unauthorized", "message": "Invalid username or password"}});
        assert_eq!(error_message(&body), "Invalid username or password");
    }

    #[test]
    fn picks_detail_and_legacy_keys() {
        let detail = json!({"detail": "Internal Server Error"});
        assert_eq!(error_message(&detail), "Internal Server Error");
        let register = json!({"Error": "username is already taken"});
        assert_eq!(error_message(&register), "username is already taken");
        assert_eq!(error_message(&json!({"error": "boom"})), "boom");
    }

    #[test]
    fn falls_back() {
        assert_eq!(error_message(&json!({"error": {"code": "x"}})), "Something went wrong");
        assert_eq!(error_message(&json!([])), "Something went wrong");
    }
}
