//! Error classification for SharePoint and identity provider responses.
//!
//! Identity provider failures carry `AADSTS` codes. A handful of them mean
//! the user typed the wrong thing and must re-enter their credentials;
//! anything else is a transport or service problem.

use std::fmt;

use serde::Deserialize;

use crate::error::StockdeskError;

/// Identity provider codes that reject the credential itself
pub const CREDENTIAL_REJECTION_CODES: &[&str] = &[
    // Invalid username or password
    "AADSTS50126",
    // User account does not exist in the directory
    "AADSTS50034",
    // Account is locked
    "AADSTS50053",
    // Account is disabled
    "AADSTS50057",
];

/// Whether a failure message carries a credential rejection code
pub fn is_credential_rejection(message: &str) -> bool {
    CREDENTIAL_REJECTION_CODES
        .iter()
        .any(|code| message.contains(code))
}

/// Error body returned by the identity provider token endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: String,
    #[serde(default)]
    pub error_codes: Vec<u64>,
}

/// A failed HTTP exchange with the site or the identity provider
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code, if a response was received
    pub status: Option<reqwest::StatusCode>,
    /// Human-readable error message
    pub message: String,
    /// Operation that failed, for log context
    pub operation: &'static str,
}

impl ApiError {
    pub fn new(message: impl Into<String>, operation: &'static str) -> Self {
        Self {
            status: None,
            message: message.into(),
            operation,
        }
    }

    pub fn with_status(
        message: impl Into<String>,
        operation: &'static str,
        status: reqwest::StatusCode,
    ) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            operation,
        }
    }

    /// Build from a token endpoint failure.
    ///
    /// The description normally starts with its `AADSTS` code. When it does
    /// not, the first structured code is prefixed so classification still
    /// sees it.
    pub fn from_token_error(status: reqwest::StatusCode, body: &TokenErrorBody) -> Self {
        let message = if body.error_description.is_empty() {
            body.error.clone()
        } else {
            body.error_description.clone()
        };
        let message = match body.error_codes.first() {
            Some(code) if !message.contains("AADSTS") => format!("AADSTS{code}: {message}"),
            _ => message,
        };
        Self::with_status(message, "authenticate", status)
    }

    pub fn to_stockdesk_error(&self) -> StockdeskError {
        if is_credential_rejection(&self.message) {
            return StockdeskError::InvalidCredentials(first_line(&self.message).to_string());
        }

        match self.status {
            Some(status) => StockdeskError::Api {
                status: status.as_u16(),
                message: format!("{} failed: {}", self.operation, self.message),
            },
            None => StockdeskError::Transport(format!("{} failed: {}", self.operation, self.message)),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({}): {}", self.operation, status, self.message),
            None => write!(f, "{}: {}", self.operation, self.message),
        }
    }
}

impl From<ApiError> for StockdeskError {
    fn from(error: ApiError) -> Self {
        error.to_stockdesk_error()
    }
}

/// Extract the message from a SharePoint REST error body.
///
/// The body looks like `{"odata.error": {"code": "...", "message": {"value": "..."}}}`;
/// anything else is returned as-is.
pub fn sharepoint_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        #[serde(rename = "odata.error", alias = "error")]
        error: ODataError,
    }

    #[derive(Deserialize)]
    struct ODataError {
        #[serde(default)]
        code: String,
        message: ODataMessage,
    }

    #[derive(Deserialize)]
    struct ODataMessage {
        value: String,
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) if envelope.error.code.is_empty() => envelope.error.message.value,
        Ok(envelope) => format!("{} ({})", envelope.error.message.value, envelope.error.code),
        Err(_) => body.trim().to_string(),
    }
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or(message).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_code_detection() {
        assert!(is_credential_rejection(
            "AADSTS50126: Error validating credentials due to invalid username or password."
        ));
        assert!(!is_credential_rejection("AADSTS700016: Application not found"));
        assert!(!is_credential_rejection("operation timed out"));
    }

    #[test]
    fn test_token_error_codes_without_description_code() {
        let body: TokenErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"The password is wrong.","error_codes":[50126]}"#,
        )
        .unwrap();
        let err = ApiError::from_token_error(reqwest::StatusCode::BAD_REQUEST, &body);
        assert_eq!(err.message, "AADSTS50126: The password is wrong.");
        assert!(matches!(
            err.to_stockdesk_error(),
            StockdeskError::InvalidCredentials(_)
        ));

        let body: TokenErrorBody = serde_json::from_str(
            r#"{"error":"unauthorized_client","error_description":"AADSTS700016: app missing","error_codes":[700016]}"#,
        )
        .unwrap();
        let err = ApiError::from_token_error(reqwest::StatusCode::BAD_REQUEST, &body);
        assert_eq!(err.message, "AADSTS700016: app missing");
        assert!(matches!(
            err.to_stockdesk_error(),
            StockdeskError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_token_rejection_classifies_as_invalid_credentials() {
        let body = TokenErrorBody {
            error: "invalid_grant".to_string(),
            error_description: "AADSTS50126: Error validating credentials.\r\nTrace ID: x"
                .to_string(),
            error_codes: vec![50126],
        };
        let err = ApiError::from_token_error(reqwest::StatusCode::BAD_REQUEST, &body);
        match err.to_stockdesk_error() {
            StockdeskError::InvalidCredentials(msg) => {
                assert_eq!(msg, "AADSTS50126: Error validating credentials.")
            }
            other => panic!("expected InvalidCredentials, got {other:?}"),
        }
    }

    #[test]
    fn test_status_errors_classify_as_api() {
        let err = ApiError::with_status(
            "List 'Inventory' does not exist",
            "list_items",
            reqwest::StatusCode::NOT_FOUND,
        );
        assert!(matches!(
            err.to_stockdesk_error(),
            StockdeskError::Api { status: 404, .. }
        ));
    }

    #[test]
    fn test_statusless_errors_classify_as_transport() {
        let err = ApiError::new("connection reset", "get_item");
        assert!(matches!(
            err.to_stockdesk_error(),
            StockdeskError::Transport(_)
        ));
    }

    #[test]
    fn test_sharepoint_error_message() {
        let body = r#"{"odata.error":{"code":"-2147024809, System.ArgumentException","message":{"lang":"en-US","value":"Item does not exist."}}}"#;
        assert_eq!(
            sharepoint_error_message(body),
            "Item does not exist. (-2147024809, System.ArgumentException)"
        );
        assert_eq!(sharepoint_error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
