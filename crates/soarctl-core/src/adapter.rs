use async_trait::async_trait;
use soarctl_client::{ApiClient, ClientError};

use crate::error::MutationError;
use crate::state::RemoteState;

/// Contract every resource adapter implements.
///
/// Implementations hold only desired-state parameters; everything learned
/// about the remote system flows through [`RemoteState`] and the
/// `Observed` associated type.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Adapter-specific observation produced by [`probe`](Self::probe) and
    /// consumed by `update`/`delete` (server id, raw document, or nothing).
    type Observed: Send;

    /// The resource kind, for messages ("API key", "job", ...).
    fn kind(&self) -> &'static str;

    /// The managed object's name.
    fn name(&self) -> &str;

    /// Lists or searches the remote collection, filters by exact name, and
    /// classifies the result.
    ///
    /// # Errors
    ///
    /// Transport and decode failures propagate unchanged; existence
    /// checks fail loudly.
    async fn probe(&self, client: &ApiClient) -> Result<RemoteState<Self::Observed>, ClientError>;

    /// Creates the resource. Returns the success message.
    async fn create(&self, client: &ApiClient) -> Result<String, MutationError>;

    /// Brings a drifted resource in line with the desired configuration.
    ///
    /// The default delegates to [`create`](Self::create); kinds whose save
    /// endpoint is the same full-payload request either way (credentials,
    /// lists) rely on it. Kinds that merge into the observed document
    /// override it.
    async fn update(
        &self,
        client: &ApiClient,
        _observed: Self::Observed,
    ) -> Result<String, MutationError> {
        self.create(client).await
    }

    /// Deletes the resource. Returns the success message.
    async fn delete(
        &self,
        client: &ApiClient,
        observed: Self::Observed,
    ) -> Result<String, MutationError>;
}
