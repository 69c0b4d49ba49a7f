//! # soarctl-core
//!
//! The generic read-compare-write reconciliation pattern shared by every
//! soarctl resource adapter.
//!
//! ## Overview
//!
//! A resource adapter implements [`ResourceAdapter`]: it can probe the
//! remote collection for the object it manages and create, update or delete
//! it. The [`reconcile`] driver turns a probe result and a
//! [`DesiredState`] into at most one mutation:
//!
//! | desired | observed              | action    |
//! |---------|-----------------------|-----------|
//! | present | absent                | create    |
//! | present | drifted               | update    |
//! | present | converged             | nothing   |
//! | absent  | converged             | delete    |
//! | absent  | absent or drifted     | nothing   |
//!
//! A same-named object whose fields drifted from the desired configuration
//! is deliberately not deleted; only a fully converged object is.
//!
//! ## Error policy
//!
//! Failures are asymmetric. A probe failure is fatal and propagates as
//! [`ApplyError::Check`]; the run aborts before any mutation. A failure
//! inside create/update/delete is caught by the adapter and reported as a
//! [`MutationError`], which the driver surfaces as
//! [`ApplyError::Mutation`]: still terminal for the run, but carrying the
//! adapter's own description of what it was doing.

mod adapter;
mod error;
mod reconcile;
mod state;

pub use adapter::ResourceAdapter;
pub use error::{ApplyError, MutationError};
pub use reconcile::reconcile;
pub use state::{ApplyOutcome, DesiredState, RemoteState};

/// Type alias for a reconciliation result.
pub type ApplyResult = Result<ApplyOutcome, ApplyError>;
