//! Pointcut expression matching

use std::fmt;

use crate::annotation::{
    Annotation, AnnotationContext, AnnotationKind, AnnotationRef, AnnotationRegistry,
    AnnotationTarget,
};
use crate::class::{Class, MemberKey};

/// Kind of location a pointcut selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointcutTargetKind {
    /// Class (woven through its constructor)
    Class,
    /// Method
    Method,
    /// Property read
    PropertyGet,
    /// Property write
    PropertySet,
    /// Method parameter (woven through its method)
    Parameter,
}

impl PointcutTargetKind {
    /// Annotation kind of the targets this kind selects
    pub fn annotation_kind(self) -> AnnotationKind {
        match self {
            PointcutTargetKind::Class => AnnotationKind::Class,
            PointcutTargetKind::Method => AnnotationKind::Method,
            PointcutTargetKind::PropertyGet | PointcutTargetKind::PropertySet => {
                AnnotationKind::Property
            }
            PointcutTargetKind::Parameter => AnnotationKind::Parameter,
        }
    }

    /// Member slot intercepted for `target`
    pub fn member_key(self, target: &AnnotationTarget) -> Option<MemberKey> {
        if target.kind() != self.annotation_kind() {
            return None;
        }
        let member = target.member_name().map(str::to_string);
        match self {
            PointcutTargetKind::Class => Some(MemberKey::Constructor),
            PointcutTargetKind::Method | PointcutTargetKind::Parameter => member.map(MemberKey::Method),
            PointcutTargetKind::PropertyGet => member.map(MemberKey::Getter),
            PointcutTargetKind::PropertySet => member.map(MemberKey::Setter),
        }
    }
}

impl fmt::Display for PointcutTargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointcutTargetKind::Class => "classes",
            PointcutTargetKind::Method => "methods",
            PointcutTargetKind::PropertyGet => "properties",
            PointcutTargetKind::PropertySet => "properties.setters",
            PointcutTargetKind::Parameter => "parameters",
        };
        f.write_str(name)
    }
}

/// Selects targets by kind and annotations
#[derive(Debug, Clone, PartialEq)]
pub struct PointcutExpression {
    kind: PointcutTargetKind,
    annotations: Vec<AnnotationRef>,
    search_parents: bool,
}

impl PointcutExpression {
    /// Match every annotated target of `kind`
    pub fn new(kind: PointcutTargetKind) -> Self {
        Self {
            kind,
            annotations: Vec::new(),
            search_parents: false,
        }
    }

    /// Restrict to targets carrying any of `annotations`
    pub fn with_annotations(mut self, annotations: &[&Annotation]) -> Self {
        for annotation in annotations {
            if !self.annotations.contains(annotation.reference()) {
                self.annotations.push(annotation.reference().clone());
            }
        }
        self
    }

    /// Also look for annotations on the same member of ancestor classes
    pub fn search_parents(mut self, search: bool) -> Self {
        self.search_parents = search;
        self
    }

    /// Select property writes instead of reads
    pub fn setters(mut self) -> Self {
        if self.kind == PointcutTargetKind::PropertyGet {
            self.kind = PointcutTargetKind::PropertySet;
        }
        self
    }

    /// Selected kind
    pub fn kind(&self) -> PointcutTargetKind {
        self.kind
    }

    /// Annotation filter (empty means any annotation)
    pub fn annotations(&self) -> &[AnnotationRef] {
        &self.annotations
    }

    /// Check if ancestors are searched
    pub fn searches_parents(&self) -> bool {
        self.search_parents
    }

    /// Annotation contexts that make `target` (declared by `class`) match
    ///
    /// Empty when the target does not match.
    pub fn matches(
        &self,
        registry: &AnnotationRegistry,
        class: &Class,
        target: &AnnotationTarget,
    ) -> Vec<AnnotationContext> {
        if target.kind() != self.kind.annotation_kind() {
            return Vec::new();
        }
        registry
            .select(&self.annotations)
            .search_parents(self.search_parents)
            .on(class, target)
    }
}

impl fmt::Display for PointcutExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.annotations.is_empty() {
            let names: Vec<String> = self.annotations.iter().map(|a| a.to_string()).collect();
            write!(f, "[{}]", names.join(", "))?;
        }
        if self.search_parents {
            write!(f, "+parents")?;
        }
        Ok(())
    }
}
