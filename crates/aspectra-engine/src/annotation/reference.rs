//! Annotation identity

use std::fmt;
use std::sync::Arc;

/// Identity of an annotation: its group and name
///
/// Immutable and cheap to clone; used as map key everywhere annotations are
/// looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationRef {
    group: Arc<str>,
    name: Arc<str>,
}

impl AnnotationRef {
    /// Create a reference
    pub fn new(group: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            group: Arc::from(group.as_ref()),
            name: Arc::from(name.as_ref()),
        }
    }

    /// Annotation group
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Annotation name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for AnnotationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}:{}", self.group, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_by_value() {
        let a = AnnotationRef::new("http", "Get");
        let b = AnnotationRef::new("http", "Get");
        let c = AnnotationRef::new("nest", "Get");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "@http:Get");
    }
}
