//! Multi-tenant account adapter.
//!
//! Accounts live on the main tenant; every request here is root-scoped and
//! ignores any account the client happens to be namespaced to. The remote
//! system stores account names with an `acc_` prefix.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use soarctl_client::{ApiClient, ClientError};
use soarctl_core::{DesiredState, MutationError, RemoteState, ResourceAdapter};
use thiserror::Error;

use crate::util::{id_to_string, unique};

fn default_true() -> bool {
    true
}

fn default_propagation_labels() -> Vec<String> {
    vec!["all".to_string()]
}

fn default_account_roles() -> Vec<String> {
    vec!["Administrator".to_string()]
}

/// Failure to resolve a host name to a high-availability group id.
///
/// Resolution runs before reconciliation and fails loudly, like an
/// existence check.
#[derive(Debug, Error)]
pub enum HostResolveError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("could not find host group for host {0}")]
    NotFound(String),
}

/// Desired state of a tenant account.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(default = "default_propagation_labels")]
    pub propagation_labels: Vec<String>,
    #[serde(default = "default_account_roles")]
    pub account_roles: Vec<String>,
    #[serde(default = "default_true")]
    pub sync_on_creation: bool,
    /// Host group to create the account on. Mutually exclusive with
    /// `host_name`; the manifest loader enforces that.
    #[serde(default)]
    pub host_group_id: Option<String>,
    /// Host name resolved to a group id via [`Account::resolve_host_group`].
    #[serde(default)]
    pub host_name: Option<String>,
    #[serde(default)]
    pub state: DesiredState,
}

/// An account as returned by the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub propagation_labels: Option<Vec<String>>,
    #[serde(default)]
    pub roles: Option<AccountRoles>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRoles {
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct HostGroup {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
}

impl Account {
    /// Resolves `host_name` into `host_group_id` via the `ha-groups`
    /// listing. Group names carry a `host:port` suffix; matching is on the
    /// segment before the colon. No-op when no host name is set.
    ///
    /// # Errors
    ///
    /// [`HostResolveError::NotFound`] when zero or several groups match;
    /// transport failures propagate.
    pub async fn resolve_host_group(&mut self, client: &ApiClient) -> Result<(), HostResolveError> {
        let Some(host_name) = self.host_name.clone() else {
            return Ok(());
        };

        let listing = client.root_get_json("ha-groups").await?;
        let groups: Vec<HostGroup> = serde_json::from_value(listing).unwrap_or_default();

        let id = unique(groups, |group| {
            group
                .name
                .as_deref()
                .is_some_and(|name| name.split(':').next() == Some(host_name.as_str()))
        })
        .and_then(|group| group.id.as_ref().and_then(id_to_string))
        .ok_or_else(|| HostResolveError::NotFound(host_name.clone()))?;

        tracing::debug!(host = %host_name, group = %id, "resolved host group");
        self.host_group_id = Some(id);
        Ok(())
    }

    fn remote_name(&self) -> String {
        format!("acc_{}", self.name)
    }

    fn matches(&self, doc: &AccountDocument) -> bool {
        if !self.propagation_labels.is_empty()
            && doc.propagation_labels.as_ref() != Some(&self.propagation_labels)
        {
            return false;
        }
        if !self.account_roles.is_empty() {
            let remote_roles = doc.roles.as_ref().and_then(|r| r.roles.as_ref());
            if remote_roles != Some(&self.account_roles) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl ResourceAdapter for Account {
    type Observed = ();

    fn kind(&self) -> &'static str {
        "account"
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, client: &ApiClient) -> Result<RemoteState<()>, ClientError> {
        let listing = client.root_get_json("accounts").await?;
        let Ok(docs) = serde_json::from_value::<Vec<AccountDocument>>(listing) else {
            return Ok(RemoteState::Absent);
        };

        let remote_name = self.remote_name();
        let Some(doc) = unique(docs, |d| d.name.as_deref() == Some(remote_name.as_str())) else {
            return Ok(RemoteState::Absent);
        };

        if self.matches(&doc) {
            Ok(RemoteState::Converged(()))
        } else {
            Ok(RemoteState::Drifted(()))
        }
    }

    async fn create(&self, client: &ApiClient) -> Result<String, MutationError> {
        let body = json!({
            "name": self.name,
            "accountRoles": self.account_roles,
            "propagationLabels": self.propagation_labels,
            "syncOnCreation": self.sync_on_creation,
            "hostGroupId": self.host_group_id.clone().unwrap_or_default(),
        });

        match client.root_post_json("account", &body).await {
            Ok(_) => Ok(format!("account {} created", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to create account {}", self.name),
                format!("error creating account: {err}"),
            )),
        }
    }

    async fn update(&self, client: &ApiClient, _observed: ()) -> Result<String, MutationError> {
        let body = json!({
            "selectedRoles": self.account_roles,
            "selectedPropagationLabels": self.propagation_labels,
        });
        let path = format!("account/update/{}", self.remote_name());

        match client.root_post_json(&path, &body).await {
            Ok(_) => Ok(format!("account {} updated", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to update account {}", self.name),
                format!("error updating account: {err}"),
            )),
        }
    }

    async fn delete(&self, client: &ApiClient, _observed: ()) -> Result<String, MutationError> {
        let path = format!("account/purge/{}", self.remote_name());
        match client.root_delete(&path).await {
            Ok(()) => Ok(format!("account {} deleted", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to delete account {}", self.name),
                format!("error deleting account: {err}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired() -> Account {
        Account {
            name: "Client01".to_string(),
            propagation_labels: vec!["all".to_string()],
            account_roles: vec!["Administrator".to_string()],
            sync_on_creation: true,
            host_group_id: None,
            host_name: None,
            state: DesiredState::Present,
        }
    }

    fn remote() -> AccountDocument {
        serde_json::from_value(json!({
            "name": "acc_Client01",
            "displayName": "Client01",
            "propagationLabels": ["all"],
            "roles": {"roles": ["Administrator"]},
            "hostGroupId": "1",
        }))
        .unwrap()
    }

    #[test]
    fn matching_account_converges() {
        assert!(desired().matches(&remote()));
    }

    #[test]
    fn role_change_is_drift() {
        let mut spec = desired();
        spec.account_roles = vec!["Analyst".to_string()];
        assert!(!spec.matches(&remote()));
    }

    #[test]
    fn label_change_is_drift() {
        let mut doc = remote();
        doc.propagation_labels = Some(vec!["europe".to_string()]);
        assert!(!desired().matches(&doc));
    }
}
