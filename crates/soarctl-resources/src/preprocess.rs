//! Pre-process rule adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use soarctl_client::{ApiClient, ClientError};
use soarctl_core::{DesiredState, MutationError, RemoteState, ResourceAdapter};

use crate::util::{id_to_string, unique};

fn default_true() -> bool {
    true
}

/// Desired state of a pre-process rule.
///
/// The only scripted action the platform supports is `"script"`, which
/// requires `script_id`; the manifest loader enforces the pairing.
#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessRule {
    pub name: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub script_id: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub propagation_labels: Vec<String>,
    #[serde(default)]
    pub state: DesiredState,
    #[serde(default)]
    pub account: Option<String>,
}

/// A pre-process rule as returned by the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessRuleDocument {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(rename = "scriptID", default)]
    pub script_id: Option<String>,
    #[serde(rename = "propagationLabels", default)]
    pub propagation_labels: Option<Vec<String>>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PreprocessRule {
    fn matches(&self, doc: &PreprocessRuleDocument) -> bool {
        if doc.enabled != Some(self.enabled) {
            return false;
        }
        if !self.propagation_labels.is_empty()
            && doc.propagation_labels.as_ref() != Some(&self.propagation_labels)
        {
            return false;
        }
        if let Some(action) = &self.action
            && doc.action.as_deref() != Some(action.as_str())
        {
            return false;
        }
        if let Some(script_id) = &self.script_id
            && doc.script_id.as_deref() != Some(script_id.as_str())
        {
            return false;
        }
        true
    }

    fn merged(&self, mut doc: PreprocessRuleDocument) -> PreprocessRuleDocument {
        doc.action = self.action.clone();
        doc.script_id = self.script_id.clone();
        doc.propagation_labels = Some(self.propagation_labels.clone());
        doc.enabled = Some(self.enabled);
        doc.version = Some(-1);
        doc
    }

    fn creation_payload(&self) -> Value {
        json!({
            "propagationLabels": self.propagation_labels,
            "name": self.name,
            "newEventFilters": [],
            "existingEventsFilters": [],
            "searchClosed": false,
            "period": {"fromValue": 30, "by": "days"},
            "action": self.action,
            "linkTo": "oldest",
            "scriptID": self.script_id,
            "enabled": self.enabled,
            "id": "",
            "shouldPublish": true,
            "shouldCommit": true,
            "commitMessage": "Preprocess rule edited",
        })
    }
}

#[async_trait]
impl ResourceAdapter for PreprocessRule {
    type Observed = (String, PreprocessRuleDocument);

    fn kind(&self) -> &'static str {
        "pre-process rule"
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(
        &self,
        client: &ApiClient,
    ) -> Result<RemoteState<(String, PreprocessRuleDocument)>, ClientError> {
        let listing = client.get_json("preprocess/rules").await?;
        let Ok(docs) = serde_json::from_value::<Vec<PreprocessRuleDocument>>(listing) else {
            return Ok(RemoteState::Absent);
        };

        let Some(doc) = unique(docs, |d| d.name.as_deref() == Some(self.name.as_str())) else {
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
        match client.post_json("preprocess/rule", &body).await {
            Ok(_) => Ok(format!("pre-process rule {} created", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to create pre-process rule {}", self.name),
                format!("error creating pre-process rule: {err}"),
            )),
        }
    }

    async fn update(
        &self,
        client: &ApiClient,
        (_id, doc): (String, PreprocessRuleDocument),
    ) -> Result<String, MutationError> {
        let merged = self.merged(doc);
        let body = serde_json::to_value(&merged).unwrap_or_default();
        match client.post_json("preprocess/rule", &body).await {
            Ok(_) => Ok(format!("pre-process rule {} updated", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to update pre-process rule {}", self.name),
                format!("error updating pre-process rule: {err}"),
            )),
        }
    }

    async fn delete(
        &self,
        client: &ApiClient,
        (id, _doc): (String, PreprocessRuleDocument),
    ) -> Result<String, MutationError> {
        match client.delete(&format!("preprocess/rule/{id}")).await {
            Ok(()) => Ok(format!("pre-process rule {} deleted", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to delete pre-process rule {}", self.name),
                format!("error deleting pre-process rule: {err}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired() -> PreprocessRule {
        PreprocessRule {
            name: "Drop duplicates".to_string(),
            action: Some("script".to_string()),
            script_id: Some("script-1".to_string()),
            enabled: true,
            propagation_labels: Vec::new(),
            state: DesiredState::Present,
            account: None,
        }
    }

    fn remote() -> PreprocessRuleDocument {
        serde_json::from_value(json!({
            "id": 12,
            "name": "Drop duplicates",
            "enabled": true,
            "action": "script",
            "scriptID": "script-1",
            "propagationLabels": [],
            "version": 2,
            "linkTo": "oldest",
        }))
        .unwrap()
    }

    #[test]
    fn matching_rule_converges() {
        assert!(desired().matches(&remote()));
    }

    #[test]
    fn disabled_rule_is_drift() {
        let mut doc = remote();
        doc.enabled = Some(false);
        assert!(!desired().matches(&doc));
    }

    #[test]
    fn script_change_is_drift() {
        let mut spec = desired();
        spec.script_id = Some("script-2".to_string());
        assert!(!spec.matches(&remote()));
    }

    #[test]
    fn merge_overwrites_rule_fields_and_keeps_the_rest() {
        let mut spec = desired();
        spec.enabled = false;
        let merged = spec.merged(remote());
        assert_eq!(merged.enabled, Some(false));
        assert_eq!(merged.version, Some(-1));
        assert_eq!(merged.extra.get("linkTo"), Some(&json!("oldest")));
    }

    #[test]
    fn creation_payload_carries_publishing_flags() {
        let payload = desired().creation_payload();
        assert_eq!(payload["shouldPublish"], json!(true));
        assert_eq!(payload["shouldCommit"], json!(true));
        assert_eq!(payload["linkTo"], json!("oldest"));
        assert_eq!(payload["period"], json!({"fromValue": 30, "by": "days"}));
    }
}
