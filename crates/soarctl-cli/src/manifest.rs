use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use soarctl_resources::{Account, ApiKey, Credential, Integration, Job, List, PreprocessRule};

/// A desired-state manifest: connection defaults plus resources in the
/// order they are applied.
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub integrations: Vec<Integration>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default)]
    pub preprocess_rules: Vec<PreprocessRule>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub sync: Option<SyncSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectionSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    /// Default tenant account for resources that do not set one.
    pub account: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub insecure: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncSection {
    #[serde(default)]
    pub all_accounts: bool,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub all_items: bool,
    #[serde(default)]
    pub items: Vec<String>,
}

pub fn load(path: &Path) -> Result<Manifest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    let manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("parsing manifest {}", path.display()))?;
    validate(&manifest)?;
    Ok(manifest)
}

/// Cross-field checks serde cannot express.
fn validate(manifest: &Manifest) -> Result<()> {
    for list in &manifest.lists {
        if list.content.is_some() && list.json_content.is_some() {
            bail!(
                "list {}: content and json_content are mutually exclusive",
                list.name
            );
        }
        if list.content_type == "JSON" && list.json_content.is_none() {
            bail!("list {}: content_type JSON requires json_content", list.name);
        }
    }

    for rule in &manifest.preprocess_rules {
        if rule.action.as_deref() == Some("script") && rule.script_id.is_none() {
            bail!(
                "pre-process rule {}: action script requires script_id",
                rule.name
            );
        }
    }

    for account in &manifest.accounts {
        if account.host_group_id.is_some() && account.host_name.is_some() {
            bail!(
                "account {}: host_group_id and host_name are mutually exclusive",
                account.name
            );
        }
    }

    if let Some(sync) = &manifest.sync {
        if sync.all_accounts && !sync.accounts.is_empty() {
            bail!("sync: all_accounts and accounts are mutually exclusive");
        }
        if sync.all_items && !sync.items.is_empty() {
            bail!("sync: all_items and items are mutually exclusive");
        }
    }

    Ok(())
}
