//! Scheduled job adapter.
//!
//! Jobs only exist inside tenant accounts; the driver must be handed a
//! client scoped to one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use soarctl_client::{ApiClient, ClientError};
use soarctl_core::{DesiredState, MutationError, RemoteState, ResourceAdapter};
use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::util::{bool_str, id_to_string, unique};

/// Timestamp format the scheduler stores (UTC, microsecond precision).
const UTC_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z");

fn default_true() -> bool {
    true
}

fn default_incident_type() -> String {
    "Unclassified".to_string()
}

fn default_ending_type() -> String {
    "never".to_string()
}

fn default_start_date() -> String {
    "now".to_string()
}

/// A job date that could not be parsed.
#[derive(Debug, Error)]
#[error("invalid job date {value}: {source}")]
pub struct InvalidJobDate {
    pub value: String,
    #[source]
    source: time::error::Parse,
}

/// Desired state of a scheduled job.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub name: String,
    pub cron: String,
    pub playbook_id: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub close_previous_run: bool,
    #[serde(default)]
    pub should_trigger_new: bool,
    #[serde(default)]
    pub notify_owner: bool,
    #[serde(default = "default_incident_type")]
    pub incident_type: String,
    #[serde(default = "default_ending_type")]
    pub ending_type: String,
    /// `"now"` or an RFC 3339 timestamp.
    #[serde(default = "default_start_date")]
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub state: DesiredState,
    pub account: Option<String>,
}

/// A job as returned by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDocument {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub raw_name: Option<String>,
    #[serde(default)]
    pub cron: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub playbook_id: Option<String>,
    #[serde(default)]
    pub close_prev_run: Option<bool>,
    #[serde(default)]
    pub should_trigger_new: Option<bool>,
    #[serde(default)]
    pub notify_owner: Option<bool>,
    #[serde(rename = "type", default)]
    pub incident_type: Option<String>,
    #[serde(default)]
    pub raw_type: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub ending_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub ending_date: Option<String>,
    #[serde(rename = "CustomFields", default)]
    pub custom_fields: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct JobSearch {
    #[serde(default)]
    data: Option<Vec<JobDocument>>,
}

fn parse_utc(value: &str) -> Result<OffsetDateTime, InvalidJobDate> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map(|dt| dt.to_offset(UtcOffset::UTC))
        .map_err(|source| InvalidJobDate {
            value: value.to_string(),
            source,
        })
}

fn stamp(dt: OffsetDateTime) -> String {
    dt.format(UTC_STAMP).expect("UTC timestamp formatting cannot fail")
}

impl Job {
    /// Resolves `start_date`/`end_date` to the scheduler's canonical UTC
    /// format. `"now"` becomes the current instant; an ending type of
    /// `"never"` pins the end date to the start date.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidJobDate`] when a caller-supplied date is not
    /// RFC 3339.
    pub fn normalized(mut self) -> Result<Self, InvalidJobDate> {
        self.start_date = if self.start_date == "now" {
            stamp(OffsetDateTime::now_utc())
        } else {
            stamp(parse_utc(&self.start_date)?)
        };

        if self.ending_type == "never" {
            self.end_date = Some(self.start_date.clone());
        } else if let Some(end) = &self.end_date {
            self.end_date = Some(stamp(parse_utc(end)?));
        }

        Ok(self)
    }

    fn matches(&self, doc: &JobDocument) -> bool {
        if doc.cron.as_deref() != Some(self.cron.as_str()) {
            return false;
        }
        if let Some(owner) = &self.owner
            && doc.owner.as_deref() != Some(owner.as_str())
        {
            return false;
        }
        if doc.playbook_id.as_deref() != Some(self.playbook_id.as_str()) {
            return false;
        }
        if doc.close_prev_run != Some(self.close_previous_run) {
            return false;
        }
        if doc.should_trigger_new != Some(self.should_trigger_new) {
            return false;
        }
        if doc.notify_owner != Some(self.notify_owner) {
            return false;
        }
        let active = doc.custom_fields.get("isactive").and_then(Value::as_str);
        if active != Some(bool_str(self.active)) {
            return false;
        }
        if doc.incident_type.as_deref() != Some(self.incident_type.as_str()) {
            return false;
        }
        true
    }

    fn merged(&self, mut doc: JobDocument) -> JobDocument {
        doc.version = Some(-1);
        doc.custom_fields.insert(
            "isactive".to_string(),
            Value::String(bool_str(self.active).to_string()),
        );
        doc.name = Some(self.name.clone());
        doc.raw_name = Some(self.name.clone());
        doc.incident_type = Some(self.incident_type.clone());
        doc.raw_type = Some(self.incident_type.clone());
        doc.playbook_id = Some(self.playbook_id.clone());
        doc.cron = Some(self.cron.clone());
        doc.should_trigger_new =
            Some(self.should_trigger_new || doc.should_trigger_new.unwrap_or(false));
        doc.close_prev_run =
            Some(self.close_previous_run || doc.close_prev_run.unwrap_or(false));
        doc.notify_owner = Some(self.notify_owner || doc.notify_owner.unwrap_or(false));
        if let Some(owner) = &self.owner {
            doc.owner = Some(owner.clone());
        }
        doc.ending_type = Some(self.ending_type.clone());
        doc.start_date = Some(self.start_date.clone());
        if let Some(end) = &self.end_date {
            doc.ending_date = Some(end.clone());
        }
        doc
    }

    fn creation_payload(&self) -> Value {
        json!({
            "owner": self.owner,
            "type": self.incident_type,
            "playbookId": self.playbook_id,
            "CustomFields": {"isactive": bool_str(self.active)},
            "scheduled": true,
            "recurrent": true,
            "startDate": self.start_date,
            "endingDate": self.end_date,
            "endingType": self.ending_type,
            "times": 0,
            "cron": self.cron,
            "cronView": true,
            "humanCron": {},
            "tags": [],
            "isFeed": false,
            "selectedFeeds": [],
            "name": self.name,
            "runOnce": false,
            "valid": true,
            "schedulerEmpty": false,
            "timezoneOffset": -60,
            "timezone": "Europe/Brussels",
            "isDateSelectionOpen": false,
            "isStartDateSelectionOpen": false,
            "endingMomentOb": self.end_date,
            "startMomentOb": self.start_date,
            "atTimeHour": "",
            "atTimeMinute": "",
            "isAllFeeds": false,
            "shouldTriggerNew": self.should_trigger_new,
            "closePrevRun": self.close_previous_run,
            "notifyOwner": self.notify_owner,
        })
    }
}

#[async_trait]
impl ResourceAdapter for Job {
    type Observed = (String, JobDocument);

    fn kind(&self) -> &'static str {
        "job"
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(
        &self,
        client: &ApiClient,
    ) -> Result<RemoteState<(String, JobDocument)>, ClientError> {
        let query = json!({
            "page": 0,
            "size": 500,
            "query": "",
            "sort": [{"field": "id", "asc": false}],
        });
        let response = client.search_json("jobs/search", &query).await?;
        let Ok(search) = serde_json::from_value::<JobSearch>(response) else {
            return Ok(RemoteState::Absent);
        };

        let Some(doc) = unique(search.data.unwrap_or_default(), |d| {
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
        match client.post_json("jobs", &body).await {
            Ok(_) => Ok(format!("job {} created", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to create job {}", self.name),
                format!("error creating job: {err}"),
            )),
        }
    }

    async fn update(
        &self,
        client: &ApiClient,
        (_id, doc): (String, JobDocument),
    ) -> Result<String, MutationError> {
        let merged = self.merged(doc);
        let body = serde_json::to_value(&merged).unwrap_or_default();
        match client.post_json("jobs", &body).await {
            Ok(_) => Ok(format!("job {} updated", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to update job {}", self.name),
                format!("error updating job: {err}"),
            )),
        }
    }

    async fn delete(
        &self,
        client: &ApiClient,
        (id, _doc): (String, JobDocument),
    ) -> Result<String, MutationError> {
        match client.delete(&format!("jobs/{id}")).await {
            Ok(()) => Ok(format!("job {} deleted", self.name)),
            Err(err) => Err(MutationError::new(
                format!("failed to delete job {}", self.name),
                format!("error deleting job: {err}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired() -> Job {
        Job {
            name: "Nightly enrichment".to_string(),
            cron: "0 2 * * *".to_string(),
            playbook_id: "pb-1".to_string(),
            owner: None,
            active: true,
            close_previous_run: false,
            should_trigger_new: false,
            notify_owner: false,
            incident_type: "Unclassified".to_string(),
            ending_type: "never".to_string(),
            start_date: "now".to_string(),
            end_date: None,
            state: DesiredState::Present,
            account: Some("Client01".to_string()),
        }
    }

    fn remote() -> JobDocument {
        serde_json::from_value(json!({
            "id": "job-1",
            "name": "Nightly enrichment",
            "rawName": "Nightly enrichment",
            "cron": "0 2 * * *",
            "playbookId": "pb-1",
            "closePrevRun": false,
            "shouldTriggerNew": false,
            "notifyOwner": false,
            "type": "Unclassified",
            "rawType": "Unclassified",
            "version": 7,
            "endingType": "never",
            "startDate": "2024-05-01T02:00:00.000000Z",
            "endingDate": "2024-05-01T02:00:00.000000Z",
            "CustomFields": {"isactive": "true"},
            "scheduled": true,
        }))
        .unwrap()
    }

    #[test]
    fn matching_job_converges() {
        assert!(desired().matches(&remote()));
    }

    #[test]
    fn cron_change_is_drift() {
        let mut spec = desired();
        spec.cron = "*/30 * * * *".to_string();
        assert!(!spec.matches(&remote()));
    }

    #[test]
    fn inactive_job_is_drift_when_active_desired() {
        let mut doc = remote();
        doc.custom_fields
            .insert("isactive".to_string(), json!("false"));
        assert!(!desired().matches(&doc));
    }

    #[test]
    fn unset_owner_is_not_compared() {
        let mut doc = remote();
        doc.owner = Some("Administrator".to_string());
        assert!(desired().matches(&doc));

        let mut spec = desired();
        spec.owner = Some("Analyst".to_string());
        assert!(!spec.matches(&doc));
    }

    #[test]
    fn normalized_resolves_now_and_pins_never_ending() {
        let job = desired().normalized().unwrap();
        assert!(job.start_date.ends_with('Z'));
        assert_ne!(job.start_date, "now");
        assert_eq!(job.end_date.as_deref(), Some(job.start_date.as_str()));
    }

    #[test]
    fn normalized_canonicalizes_rfc3339_input() {
        let mut spec = desired();
        spec.start_date = "2024-05-01T03:00:00+01:00".to_string();
        let job = spec.normalized().unwrap();
        assert_eq!(job.start_date, "2024-05-01T02:00:00.000000Z");
    }

    #[test]
    fn normalized_rejects_garbage_dates() {
        let mut spec = desired();
        spec.start_date = "yesterday".to_string();
        assert!(spec.normalized().is_err());
    }

    #[test]
    fn merge_sets_version_and_preserves_unknown_fields() {
        let mut spec = desired();
        spec.cron = "*/30 * * * *".to_string();
        let spec = spec.normalized().unwrap();
        let merged = spec.merged(remote());

        assert_eq!(merged.version, Some(-1));
        assert_eq!(merged.cron.as_deref(), Some("*/30 * * * *"));
        assert_eq!(merged.extra.get("scheduled"), Some(&json!(true)));
        assert_eq!(
            merged.custom_fields.get("isactive"),
            Some(&json!("true"))
        );
    }

    #[test]
    fn merge_keeps_observed_flags_when_desired_is_false() {
        let mut doc = remote();
        doc.notify_owner = Some(true);
        let merged = desired().normalized().unwrap().merged(doc);
        assert_eq!(merged.notify_owner, Some(true));
    }
}
