//! Per operation settings.
//!
//! Every struct has a `Default` matching the behaviour of calling an
//! operation without any options. Override fields with struct update syntax:
//!
//! ```rust
//! use mlflow_experiments::{CreateOptions, DeleteOptions};
//!
//! let create = CreateOptions::in_namespace("team-a");
//! let delete = DeleteOptions { ignore_missing: true, ..Default::default() };
//! assert_eq!(create.namespace(), "team-a");
//! assert!(delete.ignore_missing);
//! ```

use serde::Serialize;

use crate::api::DEFAULT_NAMESPACE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewType {
    #[serde(rename = "ACTIVE_ONLY")]
    Active,
    #[serde(rename = "DELETED_ONLY")]
    Deleted,
    #[serde(rename = "ALL")]
    All,
}

impl Default for ViewType {
    fn default() -> Self {
        ViewType::Active
    }
}

fn resolve(namespace: &Option<String>) -> &str {
    match namespace.as_deref() {
        Some(namespace) if !namespace.is_empty() => namespace,
        _ => DEFAULT_NAMESPACE,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Namespace to create the experiment in. Default: `"default"`.
    pub namespace: Option<String>,
    /// Treat a failed create as success if an experiment with the same
    /// name already exists in the namespace. Default: `false`.
    pub ignore_already_exists: bool,
}

impl CreateOptions {
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        CreateOptions {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    pub fn namespace(&self) -> &str {
        resolve(&self.namespace)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Namespace used to qualify the name when looking an experiment up by
    /// name. Lookups by id ignore it. Default: `"default"`.
    pub namespace: Option<String>,
}

impl GetOptions {
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        GetOptions {
            namespace: Some(namespace.into()),
        }
    }

    pub fn namespace(&self) -> &str {
        resolve(&self.namespace)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Succeed if the server reports the experiment as missing (404),
    /// making deletes idempotent. Default: `false`.
    pub ignore_missing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Namespace to list. Default: `"default"`.
    pub namespace: Option<String>,
    /// Default: [`ViewType::Active`].
    pub view_type: ViewType,
    /// Upper bound of returned experiments. Default: 1000.
    pub max_results: u32,
}

impl Default for ListOptions {
    fn default() -> Self {
        ListOptions {
            namespace: None,
            view_type: ViewType::default(),
            max_results: 1000,
        }
    }
}

impl ListOptions {
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        ListOptions {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    pub fn namespace(&self) -> &str {
        resolve(&self.namespace)
    }
}
