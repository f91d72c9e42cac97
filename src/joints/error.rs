use thiserror::Error;

use super::{BodyId, JointId};
use crate::adapter::AdapterError;

/// Joint creation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JointError {
    /// A body id did not resolve in the world's body registry
    #[error("Joint {joint}: body {body} is not registered")]
    UnresolvedBody { joint: JointId, body: BodyId },
    #[error("Joint {joint}: invalid attribute: {reason}")]
    InvalidAttribute { joint: JointId, reason: String },
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

impl JointError {
    /// Whether retrying later can succeed, e.g. once the missing body is spawned
    pub fn is_retryable(&self) -> bool {
        matches!(self, JointError::UnresolvedBody { .. })
    }
}
