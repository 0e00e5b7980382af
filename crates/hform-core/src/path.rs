//! Instance paths.
//!
//! A path is an ordered list of object keys and array indices, relative to the
//! value passed to the top-level validation call. Composition keywords and
//! array keywords insert their own segments (`"allOf", 0` or `"items", 4`) so
//! that the form layer can rebuild a nested error object by plain descent.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One step of an [`ErrorPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Location of a value inside the validated root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ErrorPath(Vec<PathSegment>);

impl ErrorPath {
    /// The empty path, pointing at the root value.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// A copy of this path extended by one segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// A copy of this path extended by a keyword segment and an index,
    /// e.g. `["allOf", 2]` or `["items", 4]`.
    #[must_use]
    pub fn keyword_index(&self, keyword: &str, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(keyword.to_string()));
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<PathSegment> {
        self.0
    }
}

impl From<Vec<PathSegment>> for ErrorPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<PathSegment> for ErrorPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ErrorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn root_is_empty() {
        let path = ErrorPath::root();
        assert!(path.is_root());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn child_does_not_touch_parent() {
        let parent = ErrorPath::root().child("address");
        let child = parent.child("zip");
        assert_eq!(parent.len(), 1);
        assert_eq!(child.to_string(), "address/zip");
    }

    #[test]
    fn keyword_index_appends_two_segments() {
        let path = ErrorPath::root().child("tags").keyword_index("items", 4);
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("tags".into()),
                PathSegment::Key("items".into()),
                PathSegment::Index(4),
            ]
        );
    }

    #[test]
    fn serializes_as_plain_array() {
        let path = ErrorPath::root().keyword_index("allOf", 1).child("name");
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json, serde_json::json!(["allOf", 1, "name"]));

        let back: ErrorPath = serde_json::from_value(json).unwrap();
        assert_eq!(back, path);
    }
}
