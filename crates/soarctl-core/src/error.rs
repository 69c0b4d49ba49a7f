use soarctl_client::ClientError;
use thiserror::Error;

/// A caught failure during create, update or delete.
///
/// Mutation failures are soft at the adapter level: the adapter converts
/// the transport error into a message describing the attempted action and
/// a detail string carrying the underlying cause.
#[derive(Debug, Error)]
#[error("{message}: {detail}")]
pub struct MutationError {
    pub message: String,
    pub detail: String,
}

impl MutationError {
    #[must_use]
    pub fn new(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: detail.into(),
        }
    }
}

/// A terminal reconciliation failure.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The existence check failed. Not caught anywhere below the driver;
    /// the run aborts before any mutation is attempted.
    #[error("existence check for {kind} {name} failed: {source}")]
    Check {
        kind: String,
        name: String,
        #[source]
        source: ClientError,
    },

    /// A mutation failed and was reported by the adapter.
    #[error("{message}: {detail}")]
    Mutation { message: String, detail: String },
}

impl ApplyError {
    /// Wraps a probe failure with the resource it occurred for.
    #[must_use]
    pub fn check(kind: impl Into<String>, name: impl Into<String>, source: ClientError) -> Self {
        Self::Check {
            kind: kind.into(),
            name: name.into(),
            source,
        }
    }
}

impl From<MutationError> for ApplyError {
    fn from(err: MutationError) -> Self {
        Self::Mutation {
            message: err.message,
            detail: err.detail,
        }
    }
}
