//! OpenCTI Error Types
//!
//! Closed set of failures the query layer can report. They are turned into
//! text only at the tool boundary.

use thiserror::Error;

/// Errors that can occur while talking to OpenCTI
#[derive(Debug, Error)]
pub enum OpenCtiError {
    /// Required connection settings are missing
    #[error("OpenCTI configuration error: {0}")]
    Configuration(String),

    /// Network-level failure (connection, DNS, timeout, HTTP status)
    #[error("HTTP connection error with OpenCTI: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body is not a GraphQL JSON envelope
    #[error("Invalid response from OpenCTI (not JSON): {0}")]
    ResponseFormat(String),

    /// The server answered with one or more GraphQL errors
    #[error("OpenCTI GraphQL errors: {}", .0.join("; "))]
    RemoteQuery(Vec<String>),
}

pub type Result<T> = std::result::Result<T, OpenCtiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_query_joins_all_messages() {
        let err = OpenCtiError::RemoteQuery(vec![
            "Unknown argument".to_string(),
            "Access denied".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "OpenCTI GraphQL errors: Unknown argument; Access denied"
        );
    }

    #[test]
    fn test_configuration_message() {
        let err = OpenCtiError::Configuration("OPENCTI_URL is not set".to_string());
        assert!(err.to_string().contains("OPENCTI_URL"));
    }
}
