//! API key adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use soarctl_client::{ApiClient, ClientError};
use soarctl_core::{DesiredState, MutationError, RemoteState, ResourceAdapter};

use crate::util::{id_to_string, unique};

/// Desired state of an API key.
///
/// Keys are compared by name only; the key material itself is never read
/// back, so an existing key with the right name always counts as
/// converged.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub state: DesiredState,
    #[serde(default)]
    pub account: Option<String>,
}

/// An API key as returned by the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyDocument {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[async_trait]
impl ResourceAdapter for ApiKey {
    type Observed = String;

    fn kind(&self) -> &'static str {
        "API key"
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, client: &ApiClient) -> Result<RemoteState<String>, ClientError> {
        let listing = client.get_json("apikeys").await?;
        let Ok(docs) = serde_json::from_value::<Vec<ApiKeyDocument>>(listing) else {
            return Ok(RemoteState::Absent);
        };

        let Some(doc) = unique(docs, |d| d.name.as_deref() == Some(self.name.as_str())) else {
            return Ok(RemoteState::Absent);
        };
        let Some(id) = doc.id.as_ref().and_then(id_to_string) else {
            return Ok(RemoteState::Absent);
        };

        Ok(RemoteState::Converged(id))
    }

    async fn create(&self, client: &ApiClient) -> Result<String, MutationError> {
        let body = json!({
            "name": self.name,
            "apikey": self.key,
        });

        match client.post_json("apikeys", &body).await {
            Ok(_) => Ok(format!("API key {} created", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to create API key {}", self.name),
                format!("error creating API key: {err}"),
            )),
        }
    }

    async fn delete(&self, client: &ApiClient, id: String) -> Result<String, MutationError> {
        match client.delete(&format!("apikeys/{id}")).await {
            Ok(()) => Ok(format!("API key {} deleted", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to delete API key {}", self.name),
                format!("error deleting API key: {err}"),
            )),
        }
    }
}
