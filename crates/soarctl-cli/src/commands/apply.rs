use std::time::Duration;

use anyhow::{Context, Result, bail};
use soarctl_client::ApiClient;
use soarctl_core::{ResourceAdapter, reconcile};
use soarctl_resources::{AccountScope, ContentSync, ItemScope};

use crate::cli::{ApplyArgs, Cli};
use crate::manifest::{Manifest, SyncSection};
use crate::{config, manifest, output};

/// Connection settings shared by every resource of one apply run.
struct RunSettings {
    url: String,
    api_key: String,
    default_account: Option<String>,
    timeout: Option<Duration>,
    insecure: bool,
    dry_run: bool,
}

impl RunSettings {
    fn client(&self, account: Option<&str>) -> Result<ApiClient> {
        let mut builder = ApiClient::builder(self.url.as_str())
            .api_key(self.api_key.as_str())
            .danger_accept_invalid_certs(self.insecure)
            .dry_run(self.dry_run);
        if let Some(account) = account.or(self.default_account.as_deref()) {
            builder = builder.account(account);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

pub async fn apply(cli: &Cli, args: &ApplyArgs) -> Result<()> {
    let manifest = manifest::load(&args.file)?;

    let connection = config::resolve_connection(
        &cli.url,
        &cli.api_key,
        manifest.connection.url.as_deref(),
        manifest.connection.api_key.as_deref(),
        &cli.profile,
    )?;
    let settings = RunSettings {
        url: connection.url,
        api_key: connection.api_key,
        default_account: args
            .account
            .clone()
            .or_else(|| manifest.connection.account.clone()),
        timeout: cli
            .timeout
            .or(manifest.connection.timeout_secs)
            .map(Duration::from_secs),
        insecure: cli.insecure || manifest.connection.insecure,
        dry_run: cli.dry_run,
    };

    run(&settings, manifest).await
}

async fn run(settings: &RunSettings, manifest: Manifest) -> Result<()> {
    for spec in &manifest.api_keys {
        let client = settings.client(spec.account.as_deref())?;
        apply_one(&client, spec, spec.state).await?;
    }

    for spec in &manifest.credentials {
        let client = settings.client(spec.account.as_deref())?;
        apply_one(&client, spec, spec.state).await?;
    }

    for spec in &manifest.integrations {
        let client = settings.client(spec.account.as_deref())?;
        apply_one(&client, spec, spec.state).await?;
    }

    for spec in &manifest.jobs {
        if spec.account.is_none() && settings.default_account.is_none() {
            bail!("job {}: jobs require a tenant account", spec.name);
        }
        let spec = spec
            .clone()
            .normalized()
            .with_context(|| format!("job {}", spec.name))?;
        let client = settings.client(spec.account.as_deref())?;
        apply_one(&client, &spec, spec.state).await?;
    }

    for spec in &manifest.lists {
        let client = settings.client(spec.account.as_deref())?;
        apply_one(&client, spec, spec.state).await?;
    }

    for spec in &manifest.preprocess_rules {
        let client = settings.client(spec.account.as_deref())?;
        apply_one(&client, spec, spec.state).await?;
    }

    for spec in &manifest.accounts {
        // Accounts are root-scoped; host resolution fails loudly before
        // the reconcile, like an existence check.
        let client = settings.client(None)?;
        let mut spec = spec.clone();
        spec.resolve_host_group(&client)
            .await
            .with_context(|| format!("account {}", spec.name))?;
        apply_one(&client, &spec, spec.state).await?;
    }

    if let Some(sync) = &manifest.sync {
        let client = settings.client(None)?;
        run_sync(&client, sync).await?;
    }

    Ok(())
}

async fn apply_one<A: ResourceAdapter>(
    client: &ApiClient,
    spec: &A,
    state: soarctl_core::DesiredState,
) -> Result<()> {
    let outcome = reconcile(client, spec, state)
        .await
        .with_context(|| format!("{} {}", spec.kind(), spec.name()))?;
    output::report(spec.kind(), spec.name(), &outcome);
    Ok(())
}

async fn run_sync(client: &ApiClient, section: &SyncSection) -> Result<()> {
    let sync = ContentSync {
        accounts: if section.all_accounts {
            AccountScope::All
        } else {
            AccountScope::Named(section.accounts.clone())
        },
        items: if section.all_items {
            ItemScope::All
        } else {
            ItemScope::Named(section.items.clone())
        },
    };
    let outcome = sync.run(client).await.context("content sync")?;
    output::report("content sync", "accounts", &outcome);
    Ok(())
}
