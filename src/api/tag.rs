use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A key-value pair attached to an experiment.
///
/// Tags can be used for server side filtering when searching experiments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Orders tags by key only, ignoring the value.
    pub fn cmp_key(&self, other: &Tag) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// An ordered list of [`Tag`]s.
///
/// [`Tags::set`] never introduces a duplicate key, [`Tags::push`] appends
/// unconditionally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub fn new() -> Self {
        Tags(Vec::new())
    }

    /// Value of the first tag with `key`, or `""` if there is none.
    pub fn get(&self, key: &str) -> &str {
        self.0
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
            .unwrap_or("")
    }

    /// Replaces the value of the first tag with `key`, or appends a new tag.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|tag| tag.key == key) {
            Some(tag) => tag.value = value,
            None => self.0.push(Tag { key, value }),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|tag| tag.key == key)
    }

    pub fn push(&mut self, tag: Tag) {
        self.0.push(tag);
    }

    /// Stable sort by key.
    pub fn sort_by_key(&mut self) {
        self.0.sort_by(Tag::cmp_key);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.0
    }
}

impl From<Vec<Tag>> for Tags {
    fn from(tags: Vec<Tag>) -> Self {
        Tags(tags)
    }
}

impl std::iter::FromIterator<Tag> for Tags {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Tags(iter.into_iter().collect())
    }
}

impl IntoIterator for Tags {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
