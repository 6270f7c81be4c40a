//! Access paths into nested storage values.

use crate::value::Value;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of an access path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSegment {
    /// Struct field descent.
    Field(String),
    /// Mapping key descent.
    Key(Value),
    /// Array index descent (fixed or dynamic).
    Index(U256),
}

impl PathSegment {
    pub fn kind_name(&self) -> &'static str {
        match self {
            PathSegment::Field(_) => "field",
            PathSegment::Key(_) => "key",
            PathSegment::Index(_) => "index",
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, ".{}", name),
            PathSegment::Key(key) => write!(f, "{{{}}}", key),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// An ordered sequence of path segments below a top-level variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessPath(Vec<PathSegment>);

impl AccessPath {
    /// The empty path: addresses the variable itself.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.0.push(PathSegment::Field(name.into()));
        self
    }

    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    pub fn index(mut self, index: u64) -> Self {
        self.0.push(PathSegment::Index(U256::from(index)));
        self
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<PathSegment>> for AccessPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
