//! Hierarchical query keys.

use std::fmt;

/// One segment of a [`QueryKey`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeySegment {
  Str(String),
  /// An optional qualifier that was not supplied. Distinct from every
  /// string, including the empty one.
  Absent,
}

impl From<&str> for KeySegment {
  fn from(s: &str) -> Self {
    Self::Str(s.to_string())
  }
}

impl From<String> for KeySegment {
  fn from(s: String) -> Self {
    Self::Str(s)
  }
}

impl<T: Into<KeySegment>> From<Option<T>> for KeySegment {
  fn from(value: Option<T>) -> Self {
    value.map(Into::into).unwrap_or(Self::Absent)
  }
}

/// Ordered `[domain, subdomain, ...qualifiers]` identifying a cached read.
///
/// Equal segment sequences address the same cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
  pub fn root(domain: &str) -> Self {
    Self(vec![KeySegment::from(domain)])
  }

  /// Append a segment.
  pub fn with(mut self, segment: impl Into<KeySegment>) -> Self {
    self.0.push(segment.into());
    self
  }

  pub fn segments(&self) -> &[KeySegment] {
    &self.0
  }

  /// True when `prefix` is this key or one of its ancestors.
  pub fn starts_with(&self, prefix: &QueryKey) -> bool {
    self.0.starts_with(&prefix.0)
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[")?;
    for (i, segment) in self.0.iter().enumerate() {
      if i > 0 {
        write!(f, ",")?;
      }
      match segment {
        KeySegment::Str(s) => write!(f, "{:?}", s)?,
        KeySegment::Absent => write!(f, "null")?,
      }
    }
    write!(f, "]")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn list(location: Option<&str>) -> QueryKey {
    QueryKey::root("members").with("list").with(location)
  }

  #[test]
  fn test_identical_segments_are_equal() {
    assert_eq!(list(Some("loc-1")), list(Some("loc-1")));
    assert_eq!(list(None), list(None));
  }

  #[test]
  fn test_absent_differs_from_empty_and_values() {
    assert_ne!(list(None), list(Some("")));
    assert_ne!(list(None), list(Some("loc-1")));
    assert_ne!(list(Some("loc-1")), list(Some("loc-2")));
  }

  #[test]
  fn test_absent_qualifier_still_occupies_a_slot() {
    let bare = QueryKey::root("members").with("list");
    assert_ne!(list(None), bare);
    assert_eq!(list(None).segments().len(), 3);
  }

  #[test]
  fn test_starts_with() {
    let root = QueryKey::root("members");
    assert!(list(None).starts_with(&root));
    assert!(list(Some("loc-1")).starts_with(&root));
    assert!(root.starts_with(&root));
    assert!(!list(None).starts_with(&QueryKey::root("membership-plans")));
    assert!(!root.starts_with(&list(None)));
  }

  #[test]
  fn test_display() {
    assert_eq!(list(None).to_string(), r#"["members","list",null]"#);
    assert_eq!(list(Some("a")).to_string(), r#"["members","list","a"]"#);
  }
}
