//! AWS error classification
//!
//! Absent objects and stacks are normal during teardown, so callers need to
//! tell "not found" apart from real failures. Classification uses the error
//! code from `ProvideErrorMetadata`, not the Debug text.

use aws_sdk_s3::error::ProvideErrorMetadata;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AwsError {
    /// The object or stack does not exist
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }
}

const NOT_FOUND_CODES: &[&str] = &["NoSuchKey", "NotFound", "NoSuchBucket"];

/// CloudFormation reports a missing stack as a generic validation error.
const STACK_MISSING_CODE: &str = "ValidationError";
const STACK_MISSING_MESSAGE: &str = "does not exist";

pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(STACK_MISSING_CODE) if message.contains(STACK_MISSING_MESSAGE) => {
            AwsError::NotFound { message }
        }
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK operation error. The metadata trait is shared by all
/// service crates, so this works for S3, CloudFormation and SES alike.
pub fn classify_sdk_error<E: ProvideErrorMetadata>(error: &E) -> AwsError {
    classify_aws_error(error.code(), error.message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_object_is_not_found() {
        assert!(classify_aws_error(Some("NoSuchKey"), Some("The specified key does not exist.")).is_not_found());
    }

    #[test]
    fn test_missing_stack_is_not_found() {
        let err = classify_aws_error(
            Some("ValidationError"),
            Some("Stack with id eksctl-demo-cluster does not exist"),
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_other_validation_errors_are_kept() {
        let err = classify_aws_error(Some("ValidationError"), Some("Template format error"));
        assert!(matches!(err, AwsError::Sdk { code: Some(ref c), .. } if c == "ValidationError"));
    }

    #[test]
    fn test_throttling_is_a_plain_sdk_error() {
        let err = classify_aws_error(Some("Throttling"), Some("Rate exceeded"));
        assert!(matches!(err, AwsError::Sdk { code: Some(ref c), .. } if c == "Throttling"));
    }

    #[test]
    fn test_unknown_code() {
        let err = classify_aws_error(None, None);
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "AWS error: Unknown error");
    }
}
