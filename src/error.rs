//! Error handling and custom error types
//!
//! Provides unified error handling across the gateway using thiserror, plus the
//! classification that turns any failure into one of a handful of user-facing
//! categories.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    MissingCredentials,
    Timeout,
    TransportError,
    MalformedOutput,
    SchemaViolation,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingCredentials(_) => ErrorCategory::MissingCredentials,
            Error::Timeout(_) => ErrorCategory::Timeout,
            Error::Http(e) if e.is_timeout() => ErrorCategory::Timeout,
            Error::Http(_) | Error::AiProvider(_) => ErrorCategory::TransportError,
            Error::MalformedOutput(_) => ErrorCategory::MalformedOutput,
            Error::SchemaViolation(_) => ErrorCategory::SchemaViolation,
        }
    }

    /// Build the blocking notification shown for a failed `operation`.
    pub fn notice(&self, operation: &str) -> UserNotice {
        let title = format!("{}失败", operation);
        match self.category() {
            ErrorCategory::MissingCredentials => UserNotice {
                message: format!(
                    "{}\n原因：未检测到有效的 API Key。\n请在设置中配置 Key。",
                    title
                ),
                title,
                actionable: true,
            },
            _ => UserNotice {
                message: format!("{}，请稍后重试。", title),
                title,
                actionable: false,
            },
        }
    }
}

/// What the UI shows when an operation fails. Details go to the diagnostic log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserNotice {
    pub title: String,
    pub message: String,
    pub actionable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::MissingCredentials("x".into()).category(),
            ErrorCategory::MissingCredentials
        );
        assert_eq!(
            Error::Timeout(Duration::from_secs(30)).category(),
            ErrorCategory::Timeout
        );
        assert_eq!(
            Error::AiProvider("500".into()).category(),
            ErrorCategory::TransportError
        );
        let request_error = reqwest::Client::new().get("not a url").build().unwrap_err();
        assert_eq!(
            Error::from(request_error).category(),
            ErrorCategory::TransportError
        );
        assert_eq!(
            Error::MalformedOutput("x".into()).category(),
            ErrorCategory::MalformedOutput
        );
        assert_eq!(
            Error::SchemaViolation("x".into()).category(),
            ErrorCategory::SchemaViolation
        );
    }

    #[test]
    fn test_only_missing_credentials_is_actionable() {
        let notice = Error::MissingCredentials("official".into()).notice("作文批改");
        assert!(notice.actionable);
        assert_eq!(notice.title, "作文批改失败");
        assert!(notice.message.contains("API Key"));

        let notice = Error::Timeout(Duration::from_secs(30)).notice("作文批改");
        assert!(!notice.actionable);
        assert!(!notice.message.contains("API Key"));
        assert!(notice.message.contains("重试"));
    }
}
