//! AWS implementations of the backend traits
//!
//! - S3: cluster records, one JSON object per cluster
//! - CloudFormation: stack discovery and teardown
//! - SES: owner notifications

pub mod cloudformation;
pub mod context;
pub mod error;
pub mod s3;
pub mod ses;

pub use cloudformation::CloudFormationStacks;
pub use context::AwsContext;
pub use error::{classify_aws_error, classify_sdk_error, AwsError};
pub use s3::S3RecordStore;
pub use ses::SesNotifier;
