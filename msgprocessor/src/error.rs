use std::fmt;

use thiserror::Error;

use crate::message::{MessageType, Namespace};

pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by user supplied builders and deduplication strategies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Phase of [crate::ParallelProcessor::make_documents] in which an [Error] happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    BuildDocuments,
    DeduplicateDocuments,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::BuildDocuments => write!(f, "FAILED_BUILD_DOCUMENTS"),
            ErrorCode::DeduplicateDocuments => write!(f, "FAILED_DEDUPLICATE_DOCUMENTS"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Build Error - {0}")]
    Build(#[from] BuildError),

    #[error("Deduplicate Error - namespace={namespace} - {source}")]
    Deduplicate {
        namespace: Namespace,
        source: BoxError,
    },
}

impl Error {
    /// Returns the phase the error originated from.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Build(_) => ErrorCode::BuildDocuments,
            Error::Deduplicate { .. } => ErrorCode::DeduplicateDocuments,
        }
    }
}

/// Failure of a single build task. Only the first one of a batch is surfaced.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("message type has no document builder [type={0}]")]
    BuilderNotFound(MessageType),

    #[error("document builder failed [type={message_type}, index={index}] - {source}")]
    Builder {
        message_type: MessageType,
        index: usize,
        #[source]
        source: BoxError,
    },

    /// The build task panicked or was aborted.
    #[error("build task failed [type={message_type}, index={index}] - {reason}")]
    Task {
        message_type: MessageType,
        index: usize,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(
            ErrorCode::BuildDocuments.to_string(),
            "FAILED_BUILD_DOCUMENTS"
        );
        assert_eq!(
            ErrorCode::DeduplicateDocuments.to_string(),
            "FAILED_DEDUPLICATE_DOCUMENTS"
        );
    }

    #[test]
    fn test_builder_not_found_message() {
        let err: Error = BuildError::BuilderNotFound(MessageType::from("type-1")).into();
        assert_eq!(err.code(), ErrorCode::BuildDocuments);
        assert_eq!(
            err.to_string(),
            "Build Error - message type has no document builder [type=type-1]"
        );
    }

    #[test]
    fn test_deduplicate_error_keeps_source() {
        let err = Error::Deduplicate {
            namespace: Namespace::from("tiramisu"),
            source: "boom".into(),
        };
        assert_eq!(err.code(), ErrorCode::DeduplicateDocuments);
        assert_eq!(
            err.to_string(),
            "Deduplicate Error - namespace=tiramisu - boom"
        );
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".into()));
    }

    #[test]
    fn test_builder_error_names_the_message() {
        let err: Error = BuildError::Builder {
            message_type: MessageType::from("type-1"),
            index: 2,
            source: "boom".into(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::BuildDocuments);
        assert_eq!(
            err.to_string(),
            "Build Error - document builder failed [type=type-1, index=2] - boom"
        );
        let source = err.source().and_then(|s| s.source());
        assert_eq!(source.map(|s| s.to_string()), Some("boom".into()));
    }
}
