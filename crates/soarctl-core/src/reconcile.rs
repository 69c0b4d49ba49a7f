use soarctl_client::ApiClient;

use crate::adapter::ResourceAdapter;
use crate::error::ApplyError;
use crate::state::{ApplyOutcome, DesiredState, RemoteState};

/// Runs one read-compare-write cycle for a single resource.
///
/// Issues the adapter's probe, then at most one mutation. See the crate
/// docs for the full decision table.
///
/// # Errors
///
/// [`ApplyError::Check`] if the probe fails; [`ApplyError::Mutation`] if
/// the chosen mutation reports a failure.
pub async fn reconcile<A: ResourceAdapter>(
    client: &ApiClient,
    adapter: &A,
    desired: DesiredState,
) -> Result<ApplyOutcome, ApplyError> {
    let observed = adapter
        .probe(client)
        .await
        .map_err(|source| ApplyError::check(adapter.kind(), adapter.name(), source))?;

    let mutation = match (desired, observed) {
        (DesiredState::Present, RemoteState::Absent) => Some(adapter.create(client).await),
        (DesiredState::Present, RemoteState::Drifted(obs)) => {
            Some(adapter.update(client, obs).await)
        }
        (DesiredState::Absent, RemoteState::Converged(obs)) => {
            Some(adapter.delete(client, obs).await)
        }
        _ => None,
    };

    match mutation {
        Some(Ok(message)) => {
            tracing::info!(kind = adapter.kind(), name = adapter.name(), %message, "resource changed");
            Ok(ApplyOutcome::changed(message))
        }
        Some(Err(err)) => {
            tracing::warn!(kind = adapter.kind(), name = adapter.name(), %err, "mutation failed");
            Err(err.into())
        }
        None => {
            tracing::debug!(kind = adapter.kind(), name = adapter.name(), "resource unchanged");
            Ok(ApplyOutcome::unchanged())
        }
    }
}
