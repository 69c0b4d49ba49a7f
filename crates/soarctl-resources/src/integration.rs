//! Integration instance adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use soarctl_client::{ApiClient, ClientError};
use soarctl_core::{DesiredState, MutationError, RemoteState, ResourceAdapter};

use crate::util::{bool_str, id_to_string, unique};

/// Configuration item types whose values the platform stores encrypted.
/// They are never value-compared, and type 9 (credential sets) is never
/// overwritten on update.
const TYPE_ENCRYPTED: i64 = 4;
const TYPE_CREDENTIALS: i64 = 9;

fn default_true() -> bool {
    true
}

/// Desired state of an integration instance.
#[derive(Debug, Clone, Deserialize)]
pub struct Integration {
    pub name: String,
    pub brand: String,
    /// Key/value pairs matched against the instance's `data` items.
    #[serde(default)]
    pub configuration: Map<String, Value>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub default_ignore: bool,
    #[serde(default)]
    pub propagation_labels: Vec<String>,
    #[serde(default)]
    pub incoming_mapper_id: Option<String>,
    #[serde(default)]
    pub state: DesiredState,
    #[serde(default)]
    pub account: Option<String>,
}

/// One entry of an instance's `data` configuration array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(rename = "type", default)]
    pub item_type: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An integration instance as returned by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationDocument {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub enabled: Option<Value>,
    #[serde(default)]
    pub default_ignore: bool,
    #[serde(default)]
    pub incoming_mapper_id: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub data: Vec<ConfigItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct InstanceSearch {
    #[serde(default)]
    instances: Option<Vec<IntegrationDocument>>,
}

impl Integration {
    fn matches(&self, doc: &IntegrationDocument) -> bool {
        if doc.default_ignore != self.default_ignore {
            return false;
        }
        if doc.brand.as_deref() != Some(self.brand.as_str()) {
            return false;
        }
        if doc.incoming_mapper_id != self.incoming_mapper_id {
            return false;
        }

        for (key, desired) in &self.configuration {
            let Some(item) = unique(&doc.data, |item| {
                item.name.as_deref() == Some(key.as_str())
            }) else {
                return false;
            };
            let encrypted = matches!(item.item_type, Some(TYPE_ENCRYPTED) | Some(TYPE_CREDENTIALS));
            if !encrypted && item.value.as_ref() != Some(desired) {
                return false;
            }
        }

        true
    }

    /// Merges the desired configuration into the fetched instance,
    /// preserving every field the caller did not set.
    fn merged(&self, mut doc: IntegrationDocument) -> IntegrationDocument {
        for item in &mut doc.data {
            if item.item_type == Some(TYPE_CREDENTIALS) {
                continue;
            }
            if let Some(name) = item.name.as_deref()
                && let Some(desired) = self.configuration.get(name)
            {
                item.value = Some(desired.clone());
            }
        }

        doc.version = Some(-1);
        doc.default_ignore = self.default_ignore || doc.default_ignore;
        doc.enabled = Some(Value::String(bool_str(self.enabled).to_string()));
        doc.incoming_mapper_id = self.incoming_mapper_id.clone();
        doc
    }

    fn creation_payload(&self) -> Value {
        let data: Vec<Value> = self
            .configuration
            .iter()
            .map(|(key, value)| {
                // A map value carrying a password is a credential-set item.
                let is_credentials = value
                    .as_object()
                    .and_then(|obj| obj.get("password"))
                    .is_some_and(|p| p.as_str().map_or(!p.is_null(), |s| !s.is_empty()));
                if is_credentials {
                    json!({"name": key, "value": value, "type": TYPE_CREDENTIALS})
                } else {
                    json!({"name": key, "value": value})
                }
            })
            .collect();

        let mut payload = json!({
            "name": self.name,
            "enabled": bool_str(self.enabled),
            "data": data,
            "brand": self.brand,
            "version": 0,
            "isIntegrationScript": true,
            "defaultIgnore": self.default_ignore,
            "incomingMapperId": self.incoming_mapper_id,
        });
        if !self.propagation_labels.is_empty() {
            payload["propagationLabels"] = json!(self.propagation_labels);
        }
        payload
    }
}

#[async_trait]
impl ResourceAdapter for Integration {
    type Observed = (String, IntegrationDocument);

    fn kind(&self) -> &'static str {
        "integration instance"
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(
        &self,
        client: &ApiClient,
    ) -> Result<RemoteState<(String, IntegrationDocument)>, ClientError> {
        let query = json!({"size": 500});
        let response = client.search_json("settings/integration/search", &query).await?;
        let Ok(search) = serde_json::from_value::<InstanceSearch>(response) else {
            return Ok(RemoteState::Absent);
        };

        let Some(doc) = unique(search.instances.unwrap_or_default(), |d| {
            d.name.as_deref() == Some(self.name.as_str())
        }) else {
            return Ok(RemoteState::Absent);
        };
        let Some(id) = doc.id.as_ref().and_then(id_to_string) else {
            return Ok(RemoteState::Absent);
        };

        if self.matches(&doc) {
            Ok(RemoteState::Converged((id, doc)))
        } else {
            Ok(RemoteState::Drifted((id, doc)))
        }
    }

    async fn create(&self, client: &ApiClient) -> Result<String, MutationError> {
        let body = self.creation_payload();
        match client.put_json("settings/integration", &body).await {
            Ok(_) => Ok(format!("integration instance {} created", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to create integration instance {}", self.name),
                format!("error creating integration instance: {err}"),
            )),
        }
    }

    async fn update(
        &self,
        client: &ApiClient,
        (_id, doc): (String, IntegrationDocument),
    ) -> Result<String, MutationError> {
        let merged = self.merged(doc);
        let body = serde_json::to_value(&merged).unwrap_or_default();
        match client.put_json("settings/integration", &body).await {
            Ok(_) => Ok(format!("integration instance {} updated", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to update integration instance {}", self.name),
                format!("error updating integration instance: {err}"),
            )),
        }
    }

    async fn delete(
        &self,
        client: &ApiClient,
        (id, _doc): (String, IntegrationDocument),
    ) -> Result<String, MutationError> {
        match client.delete(&format!("settings/integration/{id}")).await {
            Ok(()) => Ok(format!("integration instance {} deleted", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to delete integration instance {}", self.name),
                format!("error deleting integration instance: {err}"),
            )),
        }
    }
}
