//! # soarctl-resources
//!
//! One adapter per managed resource kind of the SOAR platform's REST
//! administration API: API keys, credentials, integration instances,
//! scheduled jobs, lists, pre-process rules, multi-tenant accounts, and
//! content synchronization.
//!
//! Each adapter is a deserializable desired-state struct implementing
//! [`soarctl_core::ResourceAdapter`]; the shared
//! [`soarctl_core::reconcile`] driver turns it into at most one mutation.
//! Remote documents are modeled as structs with named optional fields plus
//! a flattened extension map, so update-merges round-trip fields the
//! structured model does not cover.
//!
//! Content synchronization does not fit the present/absent contract; it
//! exposes its own plan/apply pair on [`ContentSync`].

mod account;
mod api_key;
mod content_sync;
mod credential;
mod integration;
mod job;
mod list;
mod preprocess;
mod util;

pub use account::{Account, AccountDocument, AccountRoles, HostResolveError};
pub use api_key::{ApiKey, ApiKeyDocument};
pub use content_sync::{AccountScope, ContentItem, ContentSync, ItemScope, SyncActions, SyncPlan};
pub use credential::{Credential, CredentialDocument};
pub use integration::{ConfigItem, Integration, IntegrationDocument};
pub use job::{InvalidJobDate, Job, JobDocument};
pub use list::{List, ListDocument};
pub use preprocess::{PreprocessRule, PreprocessRuleDocument};
