//! Hierarchical resource names.
//!
//! A resource is anything a transaction can lock: the database, a table,
//! a page. Names are paths from the root, e.g. `database/orders/page7`.
//! The lock manager treats them as opaque keys; the path structure is for
//! callers that walk the granularity hierarchy.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::constants::RESOURCE_SEPARATOR;
use crate::error::LockError;

/// Name of a lockable resource.
///
/// Cloning is cheap: the segments are shared.
///
/// # Example
///
/// ```rust
/// use strand_common::types::ResourceName;
///
/// let db = ResourceName::new("database");
/// let page = db.child("orders").child("page7");
/// assert_eq!(page.to_string(), "database/orders/page7");
/// assert_eq!(page.parent().unwrap().to_string(), "database/orders");
/// assert!(page.is_descendant_of(&db));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceName {
    segments: Arc<[String]>,
}

impl ResourceName {
    /// Creates a root-level resource name.
    ///
    /// `root` is a single segment and must not contain the separator; use
    /// [`str::parse`] for a full path.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        debug_assert_segment(&root);
        Self {
            segments: Arc::from(vec![root]),
        }
    }

    /// Creates a name from its path segments.
    ///
    /// Returns `None` when `segments` is empty.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        segments.iter().for_each(|segment| debug_assert_segment(segment));
        if segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: Arc::from(segments),
        })
    }

    /// Returns the name of the child resource `segment` under this one.
    ///
    /// `segment` must not contain the separator.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        debug_assert_segment(&segment);
        let mut segments = self.segments.to_vec();
        segments.push(segment);
        Self {
            segments: Arc::from(segments),
        }
    }

    /// Returns the parent resource name, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        let parent = &self.segments[..self.segments.len() - 1];
        Some(Self {
            segments: Arc::from(parent.to_vec()),
        })
    }

    /// Returns the path segments, root first.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the number of segments; a root has depth 1.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Checks whether `self` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &ResourceName) -> bool {
        self.segments.len() > ancestor.segments.len()
            && self.segments.starts_with(&ancestor.segments)
    }
}

fn debug_assert_segment(segment: &str) {
    debug_assert!(
        !segment.contains(RESOURCE_SEPARATOR),
        "resource name segment {:?} contains {:?}",
        segment,
        RESOURCE_SEPARATOR
    );
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", RESOURCE_SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceName({})", self)
    }
}

impl FromStr for ResourceName {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split(RESOURCE_SEPARATOR).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(LockError::InvalidResourceName {
                name: s.to_string(),
            });
        }
        Self::from_segments(segments).ok_or_else(|| LockError::InvalidResourceName {
            name: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy() {
        let db = ResourceName::new("database");
        assert_eq!(db.depth(), 1);
        assert!(db.parent().is_none());

        let table = db.child("orders");
        let page = table.child("page7");
        assert_eq!(page.depth(), 3);
        assert_eq!(page.parent(), Some(table.clone()));
        assert_eq!(table.parent(), Some(db.clone()));

        assert!(page.is_descendant_of(&db));
        assert!(page.is_descendant_of(&table));
        assert!(!db.is_descendant_of(&page));
        assert!(!table.is_descendant_of(&table));
        assert!(!db.child("orders2").is_descendant_of(&table));
    }

    #[test]
    fn test_equality_by_path() {
        let a = ResourceName::new("database").child("t1");
        let b = ResourceName::from_segments(["database", "t1"]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, ResourceName::new("t1"));
        assert!(ResourceName::from_segments(Vec::<String>::new()).is_none());
    }

    #[test]
    fn test_parse_and_display() {
        let name: ResourceName = "database/orders/page7".parse().unwrap();
        assert_eq!(name.segments(), ["database", "orders", "page7"]);
        assert_eq!(name.to_string(), "database/orders/page7");
        assert_eq!(format!("{:?}", name), "ResourceName(database/orders/page7)");

        assert!("".parse::<ResourceName>().is_err());
        assert!("database//page".parse::<ResourceName>().is_err());
        assert!("/database".parse::<ResourceName>().is_err());
    }

    #[test]
    fn test_parsed_path_matches_built_path() {
        let built = ResourceName::new("database").child("orders");
        let parsed: ResourceName = "database/orders".parse().unwrap();
        assert_eq!(parsed, built);
        assert_eq!(parsed.segments(), built.segments());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "contains")]
    fn test_segment_with_separator_rejected() {
        let _ = ResourceName::new("database").child("orders/page7");
    }
}
