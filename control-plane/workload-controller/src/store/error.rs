use std::fmt;

use kube::core::ErrorResponse;

pub type StoreResult<T> = Result<T, StoreError>;

const PORT_ALLOCATED: &str = "port is already allocated";

/// Why the platform rejected an object as invalid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidReason {
    /// The requested node port is held by another Service in the cluster.
    NodePortAllocated(String),
    Other(String),
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::NodePortAllocated(msg)
            | InvalidReason::Other(msg) => f.write_str(msg),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid: {0}")]
    Invalid(InvalidReason),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Failure of a store that is not backed by the API server, such as
    /// the in-memory store used by the reconciler tests.
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Kube(kube::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_))
    }

    pub fn is_node_port_allocated(&self) -> bool {
        matches!(
            self,
            StoreError::Invalid(InvalidReason::NodePortAllocated(_))
        )
    }
}

fn classify_response(resp: &ErrorResponse) -> Option<StoreError> {
    let msg = resp.message.clone();
    match (resp.code, resp.reason.as_str()) {
        (404, _) => Some(StoreError::NotFound(msg)),
        (409, "AlreadyExists") => Some(StoreError::AlreadyExists(msg)),
        (409, _) => Some(StoreError::Conflict(msg)),
        (422, _) if msg.contains(PORT_ALLOCATED) => Some(StoreError::Invalid(
            InvalidReason::NodePortAllocated(msg),
        )),
        (422, _) => Some(StoreError::Invalid(InvalidReason::Other(msg))),
        _ => None,
    }
}

impl From<kube::Error> for StoreError {
    fn from(e: kube::Error) -> Self {
        match &e {
            kube::Error::Api(resp) => {
                classify_response(resp).unwrap_or(StoreError::Kube(e))
            }
            _ => StoreError::Kube(e),
        }
    }
}
