//! GitHub API error types.
//!
//! This module defines error types that sort GitHub API failures into the
//! categories the reconciler acts on:
//!
//! - **NotFound** (HTTP 404): the object is absent. Depending on the operation
//!   this is a tombstone, a race with a concurrent applier, or a plain failure.
//! - **NotModified** (HTTP 304): a conditional request matched the stored
//!   entity tag. This is a no-op signal, not a failure.
//! - **Transient** errors are worth retrying (5xx, rate limits, network errors).
//! - **Permanent** errors need human intervention (most other 4xx).

use std::fmt;
use thiserror::Error;

/// The kind of GitHub API error, categorized for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// HTTP 404. The object does not exist (yet, or any more).
    NotFound,

    /// HTTP 304 in answer to a conditional request.
    NotModified,

    /// Transient error - safe to retry.
    ///
    /// Examples:
    /// - HTTP 5xx (server errors)
    /// - HTTP 429 (rate limited)
    /// - HTTP 403 with rate limit messages
    /// - Network timeouts
    Transient,

    /// Permanent error - requires human intervention.
    ///
    /// Examples:
    /// - HTTP 422 (validation failed, e.g. a duplicate team name)
    /// - Authentication failures (401, 403 non-rate-limit)
    Permanent,
}

/// A GitHub API error with categorization for retry decisions.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    /// The kind of error.
    pub kind: GitHubErrorKind,

    /// The HTTP status code, if available.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Creates a not-found error without an octocrab source.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::NotFound,
            status_code: Some(404),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a not-modified signal for a conditional request.
    pub fn not_modified(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::NotModified,
            status_code: Some(304),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a permanent error without an octocrab source.
    pub fn permanent_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transient error without an octocrab source.
    pub fn transient_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error of the kind implied by an HTTP status code.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify(Some(status), &message),
            status_code: Some(status),
            message,
            source: None,
        }
    }

    /// Returns true if GitHub reported the object as absent.
    pub fn is_not_found(&self) -> bool {
        self.kind == GitHubErrorKind::NotFound
    }

    /// Returns true if this is the not-modified signal of a conditional request.
    pub fn is_not_modified(&self) -> bool {
        self.kind == GitHubErrorKind::NotModified
    }

    /// Categorizes an octocrab error.
    ///
    /// The categorization is based on:
    /// - HTTP status codes
    /// - Error message patterns for rate limiting and network failures
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = Self::extract_status_code(&err);
        let message = match &err {
            octocrab::Error::GitHub { source, .. } => source.message.clone(),
            other => other.to_string(),
        };

        Self {
            kind: classify(status_code, &message),
            status_code,
            message,
            source: Some(err),
        }
    }

    /// Extracts the HTTP status code from an octocrab error, if present.
    ///
    /// Errors GitHub answered with carry a typed status. Transport-level errors
    /// don't, and their message is scanned for a status as a fallback, which
    /// yields `None` for genuine network failures.
    fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
        if let octocrab::Error::GitHub { source, .. } = err {
            return Some(source.status_code.as_u16());
        }

        let err_str = err.to_string();

        if let Some(idx) = err_str.find("status: ") {
            let rest = &err_str[idx + 8..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if let Ok(code) = rest[..end].parse() {
                return Some(code);
            }
        }

        if err_str.contains("404") && err_str.to_lowercase().contains("not found") {
            return Some(404);
        }

        None
    }
}

/// Maps a status code and message onto an error kind.
fn classify(status_code: Option<u16>, message: &str) -> GitHubErrorKind {
    match status_code {
        Some(304) => GitHubErrorKind::NotModified,
        Some(404) => GitHubErrorKind::NotFound,
        Some(429) => GitHubErrorKind::Transient,
        Some(403) if is_rate_limit_error(message) => GitHubErrorKind::Transient,
        Some(code) if (500..600).contains(&code) => GitHubErrorKind::Transient,
        Some(_) => GitHubErrorKind::Permanent,
        None => {
            if is_network_error(message) {
                GitHubErrorKind::Transient
            } else {
                GitHubErrorKind::Permanent
            }
        }
    }
}

/// Checks if an error message indicates a rate limit.
fn is_rate_limit_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("api rate")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}

/// Checks if an error message indicates a network-level error.
fn is_network_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("timeout")
        || message_lower.contains("connection")
        || message_lower.contains("network")
        || message_lower.contains("dns")
        || message_lower.contains("timed out")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_kinds() {
        assert_eq!(classify(Some(304), ""), GitHubErrorKind::NotModified);
        assert_eq!(classify(Some(404), ""), GitHubErrorKind::NotFound);
        assert_eq!(classify(Some(429), ""), GitHubErrorKind::Transient);
        assert_eq!(classify(Some(502), ""), GitHubErrorKind::Transient);
        assert_eq!(classify(Some(422), "Validation Failed"), GitHubErrorKind::Permanent);
        assert_eq!(classify(Some(401), "Bad credentials"), GitHubErrorKind::Permanent);
    }

    #[test]
    fn forbidden_is_transient_only_when_rate_limited() {
        assert_eq!(
            classify(Some(403), "API rate limit exceeded for user"),
            GitHubErrorKind::Transient
        );
        assert_eq!(
            classify(Some(403), "Must have admin rights to Repository."),
            GitHubErrorKind::Permanent
        );
    }

    #[test]
    fn missing_status_falls_back_to_message() {
        assert_eq!(classify(None, "connection reset by peer"), GitHubErrorKind::Transient);
        assert_eq!(classify(None, "invalid JSON"), GitHubErrorKind::Permanent);
    }

    #[test]
    fn rate_limit_detection() {
        assert!(is_rate_limit_error("API rate limit exceeded"));
        assert!(is_rate_limit_error("secondary rate limit"));
        assert!(is_rate_limit_error("abuse detection mechanism"));
        assert!(!is_rate_limit_error("Permission denied"));
    }

    #[test]
    fn network_error_detection() {
        assert!(is_network_error("connection timeout"));
        assert!(is_network_error("DNS resolution failed"));
        assert!(is_network_error("request timed out"));
        assert!(!is_network_error("Not found"));
    }

    #[test]
    fn constructors_set_status_and_kind() {
        let err = GitHubApiError::not_found("team 7");
        assert!(err.is_not_found());
        assert_eq!(err.status_code, Some(404));
        assert_eq!(err.to_string(), "GitHub API error (HTTP 404): team 7");

        let err = GitHubApiError::not_modified("team 7");
        assert!(err.is_not_modified());

        let err = GitHubApiError::from_status(503, "unavailable");
        assert_eq!(err.kind, GitHubErrorKind::Transient);
    }
}
