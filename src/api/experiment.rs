use chrono::{DateTime, TimeZone, Utc};
use serde::{Serialize, Deserialize};

use crate::api::{int_or_str, tag::Tags, NAMESPACE_TAG};
use crate::ExperimentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStage {
    Active,
    Deleted,
}

/// A collection of runs used to track and document an experiment over time.
///
/// The default value is the "zero" experiment: nothing set, not yet created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    /// Computed by the server, must not be set before creation.
    #[serde(default, skip_serializing_if = "ExperimentId::is_empty")]
    pub experiment_id: ExperimentId,
    /// Required when creating an experiment.
    #[serde(default)]
    pub name: String,
    /// Where artifacts are stored. The server picks a location if unset.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub artifact_location: String,
    /// Seconds since the unix epoch, computed by the server.
    #[serde(default, deserialize_with = "int_or_str::deserialize", skip_serializing_if = "is_zero")]
    pub creation_time: i64,
    /// Seconds since the unix epoch, computed by the server.
    #[serde(default, alias = "last_update_time", deserialize_with = "int_or_str::deserialize", skip_serializing_if = "is_zero")]
    pub last_updated_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_stage: Option<LifecycleStage>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

fn is_zero(int: &i64) -> bool {
    *int == 0
}

fn from_unix(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().unwrap_or_default()
}

impl Experiment {
    pub fn new(name: impl Into<String>) -> Self {
        Experiment {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn deep_copy(&self) -> Experiment {
        self.clone()
    }

    /// Overwrites `out` with an independent copy of `self`.
    pub fn deep_copy_into(&self, out: &mut Experiment) {
        out.clone_from(self);
    }

    pub fn experiment_id(&self) -> &ExperimentId {
        &self.experiment_id
    }

    pub fn set_experiment_id(&mut self, id: impl Into<ExperimentId>) {
        self.experiment_id = id.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The namespace recorded in the reserved tag, `""` if there is none.
    pub fn namespace(&self) -> &str {
        self.tags.get(NAMESPACE_TAG)
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.tags.set(NAMESPACE_TAG, namespace);
    }

    pub fn artifact_location(&self) -> &str {
        &self.artifact_location
    }

    pub fn set_artifact_location(&mut self, location: impl Into<String>) {
        self.artifact_location = location.into();
    }

    /// Reads `creation_time` as seconds. Values out of range for `DateTime`
    /// yield the unix epoch instead of an error.
    pub fn creation_timestamp(&self) -> DateTime<Utc> {
        from_unix(self.creation_time)
    }

    pub fn set_creation_timestamp(&mut self, time: DateTime<Utc>) {
        self.creation_time = time.timestamp();
    }

    /// Reads `last_updated_time` as seconds, the unix epoch if out of range.
    pub fn last_updated_timestamp(&self) -> DateTime<Utc> {
        from_unix(self.last_updated_time)
    }

    pub fn set_last_updated_timestamp(&mut self, time: DateTime<Utc>) {
        self.last_updated_time = time.timestamp();
    }

    pub fn lifecycle_stage(&self) -> Option<LifecycleStage> {
        self.lifecycle_stage
    }

    pub fn set_lifecycle_stage(&mut self, stage: LifecycleStage) {
        self.lifecycle_stage = Some(stage);
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut Tags {
        &mut self.tags
    }

    pub fn set_tags(&mut self, tags: Tags) {
        self.tags = tags;
    }

    /// Removes the `"<namespace>/"` prefix the server stores in front of the name.
    ///
    /// The prefix is taken from the experiment's own namespace tag.
    pub(crate) fn strip_namespace(&mut self) {
        let namespace = self.namespace();
        if namespace.is_empty() {
            return;
        }
        let prefix = format!("{}/", namespace);
        if let Some(name) = self.name.strip_prefix(&prefix) {
            self.name = name.to_owned();
        }
    }
}
