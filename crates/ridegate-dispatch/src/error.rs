use thiserror::Error;

/// Terminal failures that cross the dispatcher boundary.
///
/// Individual replica call errors never appear here: they are absorbed by
/// the retry loop and only surface as `AllReplicasUnavailable` once every
/// replica has been skipped or exhausted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The service name is not present in the replica registry. This is a
    /// configuration error, never retried.
    #[error("unknown service: {0}")]
    UnknownService(String),

    /// The aggregate per-request deadline elapsed before any replica
    /// produced a result.
    #[error("request deadline elapsed")]
    Timeout,

    /// Every replica was blacklisted or exhausted its retry budget during
    /// this call.
    #[error("all replicas unavailable for service: {0}")]
    AllReplicasUnavailable(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
