
pub mod client;
pub mod error;
pub mod experiment;
pub mod id;
pub mod options;
pub mod tag;

/// Reserved tag key recording the namespace an experiment was created in.
pub const NAMESPACE_TAG: &str = "metadata.namespace";

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Rejects namespaces that cannot be embedded in a quoted search filter.
pub(crate) fn check_namespace(namespace: &str) -> Result<(), error::Error> {
    if namespace.contains('\'') {
        return Err(error::Error::InvalidNamespace(namespace.to_string()));
    }
    Ok(())
}

/// Builds the name stored on the server for `name` inside `namespace`.
pub(crate) fn qualified_name(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

// deserialize i64 from either a number or a str
mod int_or_str {
    use std::str::FromStr;

    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrStr {
        Int(i64),
        Str(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>
    {
        match Option::<IntOrStr>::deserialize(deserializer)? {
            Some(IntOrStr::Int(int)) => Ok(int),
            Some(IntOrStr::Str(s)) if s.is_empty() => Ok(0),
            Some(IntOrStr::Str(s)) => i64::from_str(&s).map_err(de::Error::custom),
            None => Ok(0),
        }
    }
}
