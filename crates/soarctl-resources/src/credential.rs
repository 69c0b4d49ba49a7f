//! Credential adapter.
//!
//! The platform never returns stored secrets; probing compares the
//! `hasPassword`/`hasCertificate` presence flags instead of values, so a
//! rotated password with an unchanged name is invisible to reconciliation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use soarctl_client::{ApiClient, ClientError};
use soarctl_core::{DesiredState, MutationError, RemoteState, ResourceAdapter};

use crate::util::unique;

/// Desired state of a credential.
#[derive(Debug, Clone, Deserialize)]
pub struct Credential {
    pub name: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub workgroup: Option<String>,
    #[serde(default)]
    pub certificate: Option<String>,
    #[serde(default)]
    pub state: DesiredState,
    #[serde(default)]
    pub account: Option<String>,
}

/// A credential as returned by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub workgroup: Option<String>,
    #[serde(default)]
    pub has_password: bool,
    #[serde(default)]
    pub has_certificate: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CredentialListing {
    #[serde(default)]
    credentials: Option<Vec<CredentialDocument>>,
}

impl Credential {
    fn matches(&self, doc: &CredentialDocument) -> bool {
        if doc.id.as_deref() != Some(self.name.as_str()) {
            return false;
        }
        if let Some(user) = &self.user
            && doc.user.as_deref() != Some(user.as_str())
        {
            return false;
        }
        if let Some(workgroup) = &self.workgroup
            && doc.workgroup.as_deref() != Some(workgroup.as_str())
        {
            return false;
        }
        if self.password.is_some() && !doc.has_password {
            return false;
        }
        if self.certificate.is_some() && !doc.has_certificate {
            return false;
        }
        true
    }
}

#[async_trait]
impl ResourceAdapter for Credential {
    type Observed = ();

    fn kind(&self) -> &'static str {
        "credential"
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, client: &ApiClient) -> Result<RemoteState<()>, ClientError> {
        let query = json!({"page": 0, "query": "", "size": 200});
        let response = client.search_json("settings/credentials", &query).await?;
        let Ok(listing) = serde_json::from_value::<CredentialListing>(response) else {
            return Ok(RemoteState::Absent);
        };

        let Some(doc) = unique(listing.credentials.unwrap_or_default(), |d| {
            d.name.as_deref() == Some(self.name.as_str())
        }) else {
            return Ok(RemoteState::Absent);
        };

        if self.matches(&doc) {
            Ok(RemoteState::Converged(()))
        } else {
            Ok(RemoteState::Drifted(()))
        }
    }

    // Update and create are the same full-payload save; the default
    // `update` delegating here is exactly right.
    async fn create(&self, client: &ApiClient) -> Result<String, MutationError> {
        let body = json!({
            "id": null,
            "version": 0,
            "name": self.name,
            "password": self.password,
            "sshkey": self.certificate,
            "user": self.user,
            "workgroup": self.workgroup,
            "hasPassword": self.password.is_some(),
            "hasCertificate": self.certificate.is_some(),
        });

        match client.put_json("settings/credentials", &body).await {
            Ok(_) => Ok(format!("credential {} created", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to create credential {}", self.name),
                format!("error creating credential: {err}"),
            )),
        }
    }

    async fn delete(&self, client: &ApiClient, _observed: ()) -> Result<String, MutationError> {
        let body = json!({"id": self.name});
        match client.post_json("settings/credentials/delete", &body).await {
            Ok(_) => Ok(format!("credential {} deleted", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to delete credential {}", self.name),
                format!("error deleting credential: {err}"),
            )),
        }
    }
}
