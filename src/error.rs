use thiserror::Error;

/// Patterns (lowercase) that indicate sensitive data not safe for display.
/// Used by `contains_sensitive()` for case-insensitive matching.
pub(crate) const SENSITIVE_PATTERNS: &[&str] = &[
    "token token=",
    "authorization:",
    "api_key=",
    "bearer ",
];

/// Upper bound on the upstream body excerpt kept for diagnostics.
pub(crate) const BODY_PREVIEW_CHARS: usize = 2_000;

/// Returns true if the message contains any sensitive pattern (case-insensitive).
fn contains_sensitive(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Sanitizes a message for display.
/// If sensitive content is detected, returns the fallback instead.
fn sanitize_message(msg: &str, fallback: &str) -> String {
    if contains_sensitive(msg) {
        fallback.into()
    } else {
        msg.to_string()
    }
}

/// Truncates an upstream body to at most `BODY_PREVIEW_CHARS` characters.
pub(crate) fn body_preview(body: &str) -> String {
    match body.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

/// User-friendly error presentation.
#[derive(Debug, Clone)]
pub struct ErrorPresentation {
    pub title: String,
    pub message: String,
    pub action: Option<String>,
}

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Configuration ─────────────────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    // ── Upstream ──────────────────────────────────────────────────────────────
    #[error("Upstream request failed with status {status}")]
    Upstream { status: u16, body: String },

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    // ── Caller input ──────────────────────────────────────────────────────────
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    // ── Files ─────────────────────────────────────────────────────────────────
    #[error("I/O error: {0}")]
    Io(String),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds an upstream error, keeping only a bounded preview of the body.
    pub fn upstream(status: u16, body: &str) -> Self {
        AppError::Upstream {
            status,
            body: body_preview(body),
        }
    }

    /// The single message string handed to the caller.
    ///
    /// For upstream failures the most specific detail wins: `details`, then
    /// `error`, then the first JSON:API error's `detail` or `title`, and
    /// finally a message derived from the status code.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Upstream { status, body } => {
                let detail = upstream_detail(body)
                    .map(|d| sanitize_message(&d, "Upstream rejected the request."));
                detail.unwrap_or_else(|| format!("Upstream request failed with status {}", status))
            }
            AppError::Config(msg)
            | AppError::MalformedResponse(msg)
            | AppError::MalformedRequest(msg)
            | AppError::ConnectionFailed(msg)
            | AppError::Io(msg)
            | AppError::Internal(msg) => sanitize_message(msg, "An unexpected error occurred."),
        }
    }

    /// Converts the error into a presentation suitable for display.
    /// Never leaks the API key or the Authorization header.
    pub fn to_presentation(&self) -> ErrorPresentation {
        match self {
            AppError::Config(msg) => ErrorPresentation {
                title: "Configuration Error".into(),
                message: sanitize_message(msg, "The exporter is not configured correctly."),
                action: Some("Set API_KEY and restart".into()),
            },

            AppError::Upstream { status, .. } => ErrorPresentation {
                title: format!("Upstream Error ({})", status),
                message: self.user_message(),
                action: Some("Retry the same batch".into()),
            },

            AppError::MalformedResponse(_) => ErrorPresentation {
                title: "Unexpected Response".into(),
                message: "The candidate source returned data that could not be read.".into(),
                action: Some("Retry the same batch".into()),
            },

            AppError::ConnectionFailed(_) => ErrorPresentation {
                title: "Connection Failed".into(),
                message: "Could not reach the candidate source.".into(),
                action: Some("Check network and retry".into()),
            },

            AppError::MalformedRequest(msg) => ErrorPresentation {
                title: "Invalid Request".into(),
                message: sanitize_message(msg, "The request could not be read."),
                action: None,
            },

            AppError::Io(msg) => ErrorPresentation {
                title: "File Error".into(),
                message: sanitize_message(msg, "Could not write the export file."),
                action: Some("Check the output directory".into()),
            },

            AppError::Internal(_) => ErrorPresentation {
                title: "Unexpected Error".into(),
                message: "Something went wrong. Please try again.".into(),
                action: Some("Try again".into()),
            },
        }
    }
}

/// Pulls the most specific error text out of an upstream JSON body.
fn upstream_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let non_empty = |v: Option<&serde_json::Value>| {
        v.and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    non_empty(value.get("details"))
        .or_else(|| non_empty(value.get("error")))
        .or_else(|| {
            let first = value.get("errors")?.as_array()?.first()?;
            non_empty(first.get("detail")).or_else(|| non_empty(first.get("title")))
        })
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::Internal(format!("CSV serialization failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<AppError> {
        vec![
            AppError::Config("API_KEY is required".into()),
            AppError::upstream(500, "{}"),
            AppError::MalformedResponse("expected value at line 1".into()),
            AppError::ConnectionFailed("timeout".into()),
            AppError::MalformedRequest("trailing characters".into()),
            AppError::Io("permission denied".into()),
            AppError::Internal("something broke".into()),
        ]
    }

    #[test]
    fn all_variants_have_nonempty_title_and_message() {
        for variant in all_variants() {
            let presentation = variant.to_presentation();
            assert!(!presentation.title.trim().is_empty(), "Empty title for {:?}", variant);
            assert!(!presentation.message.trim().is_empty(), "Empty message for {:?}", variant);
            assert!(!variant.user_message().trim().is_empty(), "Empty user message for {:?}", variant);
        }
    }

    #[test]
    fn upstream_message_prefers_details() {
        let err = AppError::upstream(500, r#"{"error":"X","details":"Y"}"#);
        assert_eq!(err.user_message(), "Y");
    }

    #[test]
    fn upstream_message_falls_back_to_error() {
        let err = AppError::upstream(500, r#"{"error":"X"}"#);
        assert_eq!(err.user_message(), "X");
    }

    #[test]
    fn upstream_message_falls_back_to_status_code() {
        let err = AppError::upstream(500, "{}");
        assert!(err.user_message().contains("500"));

        let err = AppError::upstream(503, "<html>Service Unavailable</html>");
        assert!(err.user_message().contains("503"));
    }

    #[test]
    fn upstream_message_reads_json_api_errors() {
        let body = r#"{"errors":[{"status":"401","title":"Unauthorized","detail":"Invalid API key"}]}"#;
        assert_eq!(AppError::upstream(401, body).user_message(), "Invalid API key");

        let body = r#"{"errors":[{"title":"Forbidden"}]}"#;
        assert_eq!(AppError::upstream(403, body).user_message(), "Forbidden");
    }

    #[test]
    fn upstream_body_is_truncated() {
        let long = "x".repeat(BODY_PREVIEW_CHARS + 500);
        match AppError::upstream(500, &long) {
            AppError::Upstream { body, .. } => {
                assert_eq!(body.chars().count(), BODY_PREVIEW_CHARS + 1);
                assert!(body.ends_with('…'));
            }
            other => panic!("Expected Upstream, got {:?}", other),
        }
    }

    #[test]
    fn body_preview_respects_char_boundaries() {
        let long = "é".repeat(BODY_PREVIEW_CHARS + 1);
        let preview = body_preview(&long);
        assert!(preview.starts_with('é'));
        assert_eq!(preview.chars().count(), BODY_PREVIEW_CHARS + 1);
    }

    #[test]
    fn no_secret_leakage_in_presentation() {
        let test_cases: Vec<(&str, AppError)> = vec![
            ("Config", AppError::Config("Authorization: Token token=abc123".into())),
            ("Upstream", AppError::upstream(401, r#"{"details":"Token token=abc123 rejected"}"#)),
            ("MalformedRequest", AppError::MalformedRequest("api_key=abc123".into())),
            ("Io", AppError::Io("Bearer abc123".into())),
        ];

        for (label, variant) in test_cases {
            let presentation = variant.to_presentation();
            let output_lower = format!(
                "{} {} {}",
                presentation.title,
                presentation.message,
                presentation.action.as_deref().unwrap_or("")
            )
            .to_ascii_lowercase();

            for pattern in SENSITIVE_PATTERNS {
                assert!(
                    !output_lower.contains(pattern),
                    "{} presentation contains sensitive pattern",
                    label
                );
            }
            assert!(!variant.user_message().contains("abc123"), "{} user message leaks", label);
        }
    }
}
