//! Read-only queries over a completed analysis.
//!
//! The engine borrows the structural index and the call graph; every query
//! is answered from memory except `search_code`, which reads the source
//! files of indexed components on demand.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;

use crate::classify::Role;
use crate::graph::{CallGraph, TraversalEntry};
use crate::model::{Component, MethodDescriptor, StructuralIndex, parse_method_key};

/// One line hit from a full-text source search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeMatch {
    pub fqn: String,
    pub path: String,
    pub line_number: usize,
    pub preview: String,
}

/// Call-flow report for a single method. External call targets have no
/// local declaration, so everything but the traversals is absent for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodAnalysis {
    pub method: Option<MethodDescriptor>,
    pub role: Role,
    pub external: bool,
    pub path: Option<String>,
    /// Source lines of the declaration, when the file is still readable.
    pub snippet: Option<String>,
    pub outgoing: Vec<TraversalEntry>,
    pub incoming: Vec<TraversalEntry>,
}

pub struct QueryEngine<'a> {
    index: &'a StructuralIndex,
    graph: &'a CallGraph,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a StructuralIndex, graph: &'a CallGraph) -> Self {
        Self { index, graph }
    }

    /// Components in FQN order, optionally restricted to one role.
    pub fn list_components(&self, role: Option<Role>) -> Vec<&'a Component> {
        self.index
            .components()
            .filter(|c| role.is_none_or(|r| c.role == r))
            .collect()
    }

    /// Case-insensitive FQN substring lookup. Zero, one or many matches;
    /// disambiguation is the caller's concern.
    pub fn find_component(&self, name: &str) -> Vec<&'a Component> {
        let needle = name.to_lowercase();
        self.index
            .components()
            .filter(|c| c.fqn.to_lowercase().contains(&needle))
            .collect()
    }

    /// Methods whose name contains `pattern`, case-insensitive, in key order.
    pub fn search_methods(&self, pattern: &str) -> Vec<&'a MethodDescriptor> {
        let needle = pattern.to_lowercase();
        let mut hits: Vec<&MethodDescriptor> = self
            .index
            .methods()
            .filter(|m| m.name.to_lowercase().contains(&needle))
            .collect();
        hits.sort_by(|a, b| a.key().cmp(&b.key()));
        hits
    }

    /// Exact substring search over the source text of every indexed
    /// component. Files that disappeared since the analysis are skipped.
    pub fn search_code(&self, pattern: &str) -> Result<Vec<CodeMatch>> {
        if pattern.is_empty() {
            bail!("search pattern must not be empty");
        }

        let mut matches = Vec::new();
        let mut seen_paths: HashSet<&str> = HashSet::new();

        for component in self.index.components() {
            // Nested types share their outer type's file.
            if !seen_paths.insert(component.path.as_str()) {
                continue;
            }
            let Ok(text) = fs::read_to_string(&component.path) else {
                continue;
            };
            for (offset, line) in text.lines().enumerate() {
                if line.contains(pattern) {
                    matches.push(CodeMatch {
                        fqn: component.fqn.clone(),
                        path: component.path.clone(),
                        line_number: offset + 1,
                        preview: line.trim().to_string(),
                    });
                }
            }
        }
        Ok(matches)
    }

    /// Call-flow analysis for one method key. A syntactically malformed key
    /// is an error; a well-formed key that matches neither a declared method
    /// nor an external graph node is `None`.
    pub fn analyze_method(
        &self,
        key: &str,
        outgoing_depth: usize,
        incoming_depth: usize,
    ) -> Result<Option<MethodAnalysis>> {
        let (owner, _, _) =
            parse_method_key(key).with_context(|| format!("invalid method key `{key}`"))?;

        if let Some(method) = self.index.method(key) {
            let component = self.index.component(&owner);
            return Ok(Some(MethodAnalysis {
                method: Some(method.clone()),
                role: component.map(|c| c.role).unwrap_or(Role::None),
                external: false,
                path: component.map(|c| c.path.clone()),
                snippet: component.and_then(|c| snippet_of(&c.path, method)),
                outgoing: self.graph.outgoing(key, outgoing_depth),
                incoming: self.graph.incoming(key, incoming_depth),
            }));
        }

        // Synthesized library-call nodes have no declaration to describe,
        // but walking their callers is still meaningful.
        if self.graph.is_external(key) {
            return Ok(Some(MethodAnalysis {
                method: None,
                role: Role::None,
                external: true,
                path: None,
                snippet: None,
                outgoing: self.graph.outgoing(key, outgoing_depth),
                incoming: self.graph.incoming(key, incoming_depth),
            }));
        }

        Ok(None)
    }
}

fn snippet_of(path: &str, method: &MethodDescriptor) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let lines: Vec<&str> = text
        .lines()
        .skip(method.start_line.saturating_sub(1))
        .take(method.end_line + 1 - method.start_line)
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
