//! List adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use soarctl_client::{ApiClient, ClientError};
use soarctl_core::{DesiredState, MutationError, RemoteState, ResourceAdapter};

use crate::util::unique;

fn default_content_type() -> String {
    "Text".to_string()
}

fn default_propagation_labels() -> Vec<String> {
    vec!["all".to_string()]
}

/// Desired state of a list.
///
/// `content` carries text-like bodies (Text, HTML, Markdown, CSS);
/// `json_content` carries JSON lists and is compared structurally against
/// the remote `data` string. The two are mutually exclusive; the manifest
/// loader enforces that before an adapter is built.
#[derive(Debug, Clone, Deserialize)]
pub struct List {
    pub name: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub json_content: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_propagation_labels")]
    pub propagation_labels: Vec<String>,
    #[serde(default)]
    pub read_roles: Option<Vec<String>>,
    #[serde(default)]
    pub edit_roles: Option<Vec<String>>,
    #[serde(default)]
    pub state: DesiredState,
    #[serde(default)]
    pub account: Option<String>,
}

/// A list as returned by the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub propagation_labels: Option<Vec<String>>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(rename = "xsoarReadOnlyRoles", default)]
    pub read_only_roles: Option<Vec<String>>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl List {
    fn matches(&self, doc: &ListDocument) -> bool {
        if doc.id.as_deref() != Some(self.name.as_str()) {
            return false;
        }
        if doc.content_type.as_deref() != Some(self.content_type.as_str()) {
            return false;
        }
        if let Some(description) = &self.description
            && doc.description.as_deref() != Some(description.as_str())
        {
            return false;
        }
        if !self.propagation_labels.is_empty()
            && doc.propagation_labels.as_ref() != Some(&self.propagation_labels)
        {
            return false;
        }
        if let Some(content) = &self.content
            && doc.data.as_deref() != Some(content.as_str())
        {
            return false;
        }
        if let Some(json_content) = &self.json_content
            && doc.content_type.as_deref() == Some("JSON")
        {
            // Structural comparison; an unparseable remote body is drift.
            let remote = doc
                .data
                .as_deref()
                .and_then(|data| serde_json::from_str::<Value>(data).ok());
            if remote.as_ref() != Some(json_content) {
                return false;
            }
        }
        if let Some(read_roles) = &self.read_roles
            && doc.read_only_roles.as_ref() != Some(read_roles)
        {
            return false;
        }
        if let Some(edit_roles) = &self.edit_roles
            && doc.roles.as_ref() != Some(edit_roles)
        {
            return false;
        }
        true
    }

    fn save_payload(&self) -> Value {
        let content = if self.content_type == "JSON" {
            self.json_content
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_default()
        } else {
            self.content.clone().unwrap_or_default()
        };

        let mut payload = json!({
            "id": self.name,
            "version": -1,
            "propagationLabels": self.propagation_labels,
            "name": self.name,
            "data": content,
            "type": self.content_type,
            "description": self.description,
        });

        match &self.read_roles {
            Some(read_roles) => {
                payload["xsoarReadOnlyRoles"] = json!(read_roles);
                payload["allRead"] = json!(false);
            }
            None => payload["allRead"] = json!(true),
        }
        match &self.edit_roles {
            Some(edit_roles) => {
                payload["roles"] = json!(edit_roles);
                payload["allReadWrite"] = json!(false);
            }
            None => payload["allReadWrite"] = json!(true),
        }
        payload
    }
}

#[async_trait]
impl ResourceAdapter for List {
    type Observed = ();

    fn kind(&self) -> &'static str {
        "list"
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, client: &ApiClient) -> Result<RemoteState<()>, ClientError> {
        let listing = client.get_json("lists").await?;
        let Ok(docs) = serde_json::from_value::<Vec<ListDocument>>(listing) else {
            return Ok(RemoteState::Absent);
        };

        let Some(doc) = unique(docs, |d| d.name.as_deref() == Some(self.name.as_str())) else {
            return Ok(RemoteState::Absent);
        };

        if self.matches(&doc) {
            Ok(RemoteState::Converged(()))
        } else {
            Ok(RemoteState::Drifted(()))
        }
    }

    // The save endpoint replaces the whole list either way; the default
    // `update` delegates here.
    async fn create(&self, client: &ApiClient) -> Result<String, MutationError> {
        let body = self.save_payload();
        match client.post_json("lists/save", &body).await {
            Ok(_) => Ok(format!("list {} created", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to create list {}", self.name),
                format!("error creating list: {err}"),
            )),
        }
    }

    async fn delete(&self, client: &ApiClient, _observed: ()) -> Result<String, MutationError> {
        let body = json!({"id": self.name});
        match client.post_json("lists/delete", &body).await {
            Ok(_) => Ok(format!("list {} deleted", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to delete list {}", self.name),
                format!("error deleting list: {err}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired() -> List {
        List {
            name: "Configuration".to_string(),
            content_type: "Text".to_string(),
            content: Some("key=value".to_string()),
            json_content: None,
            description: None,
            propagation_labels: vec!["all".to_string()],
            read_roles: None,
            edit_roles: None,
            state: DesiredState::Present,
            account: None,
        }
    }

    fn remote() -> ListDocument {
        serde_json::from_value(json!({
            "id": "Configuration",
            "name": "Configuration",
            "type": "Text",
            "propagationLabels": ["all"],
            "data": "key=value",
            "modified": "2024-05-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn matching_text_list_converges() {
        assert!(desired().matches(&remote()));
    }

    #[test]
    fn content_change_is_drift() {
        let mut spec = desired();
        spec.content = Some("key=other".to_string());
        assert!(!spec.matches(&remote()));
    }

    #[test]
    fn json_content_is_compared_structurally() {
        let mut spec = desired();
        spec.content_type = "JSON".to_string();
        spec.content = None;
        spec.json_content = Some(json!({"a": 1, "b": [2, 3]}));

        let mut doc = remote();
        doc.content_type = Some("JSON".to_string());
        // Different key order, same structure.
        doc.data = Some("{\"b\": [2, 3], \"a\": 1}".to_string());
        assert!(spec.matches(&doc));

        doc.data = Some("{\"a\": 2}".to_string());
        assert!(!spec.matches(&doc));

        doc.data = Some("not json".to_string());
        assert!(!spec.matches(&doc));
    }

    #[test]
    fn roles_are_compared_only_when_set() {
        let mut doc = remote();
        doc.read_only_roles = Some(vec!["Analyst".to_string()]);
        doc.roles = Some(vec!["Administrator".to_string()]);
        assert!(desired().matches(&doc));

        let mut spec = desired();
        spec.read_roles = Some(vec!["Analyst".to_string()]);
        spec.edit_roles = Some(vec!["Administrator".to_string()]);
        assert!(spec.matches(&doc));

        spec.edit_roles = Some(vec!["Analyst".to_string()]);
        assert!(!spec.matches(&doc));
    }

    #[test]
    fn save_payload_computes_permission_flags() {
        let mut spec = desired();
        spec.read_roles = Some(vec!["Analyst".to_string()]);
        let payload = spec.save_payload();
        assert_eq!(payload["allRead"], json!(false));
        assert_eq!(payload["allReadWrite"], json!(true));
        assert_eq!(payload["xsoarReadOnlyRoles"], json!(["Analyst"]));
        assert_eq!(payload["version"], json!(-1));
    }

    #[test]
    fn save_payload_serializes_json_content() {
        let mut spec = desired();
        spec.content_type = "JSON".to_string();
        spec.content = None;
        spec.json_content = Some(json!({"a": 1}));
        let payload = spec.save_payload();
        assert_eq!(payload["data"], json!("{\"a\":1}"));
    }
}
