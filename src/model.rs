//! Structural model of an analyzed project.
//!
//! Everything here is plain data: it is produced by one scan, serialized
//! into the analysis cache, and served read-only by the query engine.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classify::Role;

/// A declared field, with its annotations and the type text as written
/// (generic arguments erased).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared_type: String,
    pub annotations: Vec<String>,
}

/// A declared method or constructor. Constructors use the name `<init>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Fully-qualified name of the declaring type.
    pub owner: String,
    pub name: String,
    /// Parameter type texts with generic arguments erased.
    pub parameter_types: Vec<String>,
    pub return_type: String,
    pub modifiers: Vec<String>,
    pub annotations: Vec<String>,
    /// 1-based line span of the declaration in its source file.
    pub start_line: usize,
    pub end_line: usize,
}

impl MethodDescriptor {
    /// Canonical identity used for graph nodes, search results and lookups:
    /// `com.example.UserService.findById(Long)`.
    pub fn key(&self) -> String {
        method_key(&self.owner, &self.name, &self.parameter_types)
    }
}

pub fn method_key(owner: &str, name: &str, parameter_types: &[String]) -> String {
    format!("{owner}.{name}({})", parameter_types.join(","))
}

/// Splits a method key back into `(owner, name, parameter types)`.
///
/// Fails on syntactically malformed keys; an unknown but well-formed key is
/// not an error here.
pub fn parse_method_key(key: &str) -> Result<(String, String, Vec<String>)> {
    let open = key
        .find('(')
        .ok_or_else(|| anyhow::anyhow!("invalid method key (missing '('): {key}"))?;
    if !key.ends_with(')') {
        anyhow::bail!("invalid method key (missing closing ')'): {key}");
    }

    let qualified = &key[..open];
    let dot = qualified
        .rfind('.')
        .ok_or_else(|| anyhow::anyhow!("invalid method key (no owning type): {key}"))?;
    let owner = &qualified[..dot];
    let name = &qualified[dot + 1..];
    if owner.is_empty() || name.is_empty() {
        anyhow::bail!("invalid method key (empty owner or name): {key}");
    }

    let params = &key[open + 1..key.len() - 1];
    let parameter_types = if params.is_empty() {
        Vec::new()
    } else {
        params.split(',').map(|p| p.trim().to_string()).collect()
    };

    Ok((owner.to_string(), name.to_string(), parameter_types))
}

/// One declared type: class, interface, enum, record or annotation type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Fully-qualified name; nested types use `Outer$Inner`.
    pub fqn: String,
    pub name: String,
    pub package: String,
    pub path: String,
    /// Declared annotations in source order, duplicates preserved.
    pub annotations: Vec<String>,
    pub role: Role,
    /// Extended and implemented type names as written, unresolved.
    pub supertypes: Vec<String>,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

impl Component {
    pub fn method_by_key(&self, key: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.key() == key)
    }
}

/// Project-wide map from fully-qualified name to component. Built once per
/// scan and replaced wholesale on rescan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralIndex {
    pub components: BTreeMap<String, Component>,
}

impl StructuralIndex {
    pub fn insert(&mut self, component: Component) {
        self.components.insert(component.fqn.clone(), component);
    }

    pub fn component(&self, fqn: &str) -> Option<&Component> {
        self.components.get(fqn)
    }

    /// Looks a method up by its canonical key.
    pub fn method(&self, key: &str) -> Option<&MethodDescriptor> {
        let (owner, _, _) = parse_method_key(key).ok()?;
        self.components.get(&owner)?.method_by_key(key)
    }

    /// All components in FQN order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.components.values().flat_map(|c| c.methods.iter())
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods().count()
    }

    /// Components whose simple name matches, in stable FQN order.
    pub fn by_simple_name(&self, simple: &str) -> Vec<&Component> {
        self.components
            .values()
            .filter(|c| c.name == simple)
            .collect()
    }
}

/// A per-file parse failure. Collected during the scan, never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    pub path: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub message: String,
}
