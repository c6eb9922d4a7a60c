//! Object references and the per-kind selection fetched from the cluster

use std::fmt;

use chartify_core::ResourceKind;

use crate::error::{KubeError, Result};

/// Namespace used when a reference names none
pub const DEFAULT_NAMESPACE: &str = "default";

/// A `name@namespace` reference to one object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub name: String,
    pub namespace: String,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Parse `name` or `name@namespace`
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        let (name, namespace) = match reference.split_once('@') {
            Some((name, namespace)) => (name, namespace),
            None => (reference, DEFAULT_NAMESPACE),
        };

        if name.is_empty() || namespace.is_empty() || namespace.contains('@') {
            return Err(KubeError::InvalidReference(reference.to_string()));
        }
        Ok(Self::new(name, namespace))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.namespace)
    }
}

/// Objects to fetch, in the order they were added
#[derive(Debug, Clone, Default)]
pub struct ObjectSelection {
    objects: Vec<(ResourceKind, ObjectRef)>,
}

impl ObjectSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: ResourceKind, reference: ObjectRef) {
        self.objects.push((kind, reference));
    }

    /// Add every reference of a comma separated list such as `web@shop,db`
    pub fn add_list(&mut self, kind: ResourceKind, list: &str) -> Result<()> {
        for reference in list.split(',').filter(|r| !r.trim().is_empty()) {
            self.add(kind, ObjectRef::parse(reference)?);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ResourceKind, ObjectRef)> {
        self.objects.iter()
    }
}
