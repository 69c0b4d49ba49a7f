use std::time::Duration;

use anyhow::{Context, Result};
use soarctl_client::ApiClient;
use soarctl_resources::{AccountScope, ContentSync, ItemScope};

use crate::cli::{Cli, SyncArgs};
use crate::{config, output};

pub async fn sync(cli: &Cli, args: &SyncArgs) -> Result<()> {
    let connection =
        config::resolve_connection(&cli.url, &cli.api_key, None, None, &cli.profile)?;

    let mut builder = ApiClient::builder(connection.url.as_str())
        .api_key(connection.api_key.as_str())
        .danger_accept_invalid_certs(cli.insecure)
        .dry_run(cli.dry_run);
    if let Some(timeout) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(timeout));
    }
    let client = builder.build()?;

    let sync = ContentSync {
        accounts: if args.all_accounts {
            AccountScope::All
        } else {
            AccountScope::Named(args.accounts.clone())
        },
        items: if args.all_items {
            ItemScope::All
        } else {
            ItemScope::Named(args.items.clone())
        },
    };

    let outcome = sync.run(&client).await.context("content sync")?;
    output::report("content sync", "accounts", &outcome);
    Ok(())
}
