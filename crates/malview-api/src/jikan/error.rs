//! Jikan fetch errors.

/// Failure of a Jikan request.
///
/// Page-scoped variants carry the page number so a failed multi-page
/// fetch reports where it stopped. Never retried automatically.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum FetchError {
    /// The API answered with a non-success status.
    #[error("Jikan API error on page {page} (HTTP {status}): {body}")]
    Http {
        /// Page number (0 for non-paginated requests).
        page: u32,
        /// HTTP status code.
        status: u16,
        /// Response body, or a placeholder when unreadable.
        body: String,
    },

    /// The request could not be sent or the body could not be read.
    #[error("request failed on page {page}")]
    Transport {
        /// Page number (0 for non-paginated requests).
        page: u32,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the expected envelope.
    #[error("failed to decode JSON response on page {page}")]
    Decode {
        /// Page number (0 for non-paginated requests).
        page: u32,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The base URL cannot carry path segments (e.g. `mailto:`).
    #[error("base URL cannot take path segments: {base}")]
    Url {
        /// The offending base URL.
        base: String,
    },
}

impl FetchError {
    /// Returns the page number this error belongs to, if page-scoped.
    #[must_use]
    pub const fn page(&self) -> Option<u32> {
        match self {
            Self::Http { page, .. } | Self::Transport { page, .. } | Self::Decode { page, .. } => {
                Some(*page)
            }
            Self::Url { .. } => None,
        }
    }

    /// Returns the HTTP status code, if the API answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_includes_page_and_status() {
        // Arrange
        let err = FetchError::Http {
            page: 3,
            status: 503,
            body: String::from("Service Unavailable"),
        };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("page 3"));
        assert!(msg.contains("503"));
        assert_eq!(err.page(), Some(3));
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_url_error_has_no_page() {
        // Arrange & Act
        let err = FetchError::Url {
            base: String::from("mailto:someone@example.com"),
        };

        // Assert
        assert!(err.to_string().contains("mailto:someone@example.com"));
        assert_eq!(err.page(), None);
        assert_eq!(err.status(), None);
    }
}
