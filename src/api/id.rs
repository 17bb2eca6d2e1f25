use serde::{Serialize, Deserialize};
use std::fmt;

/// Server assigned identifier of an experiment.
///
/// Empty until the experiment has been created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentId(String);

impl ExperimentId {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for ExperimentId {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ExperimentId {
    fn from(id: String) -> Self {
        ExperimentId(id)
    }
}

impl From<&str> for ExperimentId {
    fn from(id: &str) -> Self {
        ExperimentId(id.to_owned())
    }
}
