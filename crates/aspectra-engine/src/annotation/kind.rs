//! Annotation placement kinds

use std::fmt;

/// Kind of code element an annotation is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotationKind {
    /// A class
    Class,
    /// A method
    Method,
    /// A property
    Property,
    /// A method parameter
    Parameter,
}

impl AnnotationKind {
    /// All kinds, in declaration order
    pub const ALL: [AnnotationKind; 4] = [
        AnnotationKind::Class,
        AnnotationKind::Method,
        AnnotationKind::Property,
        AnnotationKind::Parameter,
    ];
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnnotationKind::Class => "class",
            AnnotationKind::Method => "method",
            AnnotationKind::Property => "property",
            AnnotationKind::Parameter => "parameter",
        };
        f.write_str(name)
    }
}
