use serde::{Deserialize, Serialize};

/// The state a resource should be left in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}

/// What the existence check observed on the remote system.
///
/// `D` is the adapter-specific observation, typically the server-assigned
/// identifier and, for kinds that update by merging, the raw remote
/// document. The observation is threaded explicitly into `update`/`delete`
/// so that no adapter state survives between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteState<D> {
    /// No uniquely named object exists. Zero matches and multiple
    /// same-named matches both land here; ambiguity is never
    /// disambiguated.
    Absent,
    /// A uniquely named object exists but at least one desired field
    /// differs.
    Drifted(D),
    /// A uniquely named object exists and every desired field matches.
    Converged(D),
}

/// The result of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Whether a mutation was performed (or would have been, in dry-run).
    pub changed: bool,
    /// Human-readable description of the mutation; `None` for no-op runs.
    pub message: Option<String>,
}

impl ApplyOutcome {
    /// Outcome of a run that performed a mutation.
    #[must_use]
    pub fn changed(message: impl Into<String>) -> Self {
        Self {
            changed: true,
            message: Some(message.into()),
        }
    }

    /// Outcome of a run that found nothing to do.
    #[must_use]
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            message: None,
        }
    }
}
