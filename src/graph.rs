//! Method call graph construction and traversal.
//!
//! A second pass over the parsed method bodies. Every call expression is
//! resolved best-effort: to a locally declared method (name + arity match
//! through the locally-known supertype chain), to a synthetic external key
//! derived from the receiver's textual type, or dropped when the receiver
//! cannot be recovered syntactically. The resulting directed graph may be
//! cyclic; traversal carries a per-call visited array keyed by the stable
//! integer id each node gets at build time.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tree_sitter::Node;

use crate::model::{StructuralIndex, method_key};
use crate::parse::ParsedFile;
use crate::structure::{
    erase_generics, is_type_declaration, node_text, package_of, parameter_types, simple_name,
    type_body,
};

/// Outcome of resolving one call expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Bound to a method declared in the project.
    Resolved(String),
    /// Synthesized key for a call into library code, e.g. `Logger.info(?)`.
    External(String),
    /// Receiver not syntactically recoverable; the call is dropped.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalEntry {
    pub depth: usize,
    pub method_key: String,
    pub external: bool,
    /// Set when this node was already reported in the same traversal; it is
    /// shown once more as a boundary and never expanded again.
    pub cycle: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallGraph {
    keys: Vec<String>,
    external: Vec<bool>,
    ids: BTreeMap<String, u32>,
    out_edges: Vec<Vec<u32>>,
    in_edges: Vec<Vec<u32>>,
    edge_count: usize,
    /// Call sites dropped because no target key could be derived.
    pub unresolved_calls: u64,
}

impl CallGraph {
    fn intern(&mut self, key: &str, external: bool) -> u32 {
        if let Some(&id) = self.ids.get(key) {
            return id;
        }
        let id = self.keys.len() as u32;
        self.keys.push(key.to_string());
        self.external.push(external);
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        self.ids.insert(key.to_string(), id);
        id
    }

    fn add_edge(&mut self, from: u32, to: u32) {
        // Duplicate call sites collapse into one traversal edge.
        if self.out_edges[from as usize].contains(&to) {
            return;
        }
        self.out_edges[from as usize].push(to);
        self.in_edges[to as usize].push(from);
        self.edge_count += 1;
    }

    /// Sorts adjacency lists by target key so traversal output is stable
    /// across runs and across cache round-trips.
    fn finalize(&mut self) {
        let keys = self.keys.clone();
        for list in self.out_edges.iter_mut().chain(self.in_edges.iter_mut()) {
            list.sort_by(|a, b| keys[*a as usize].cmp(&keys[*b as usize]));
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ids.contains_key(key)
    }

    pub fn is_external(&self, key: &str) -> bool {
        self.ids
            .get(key)
            .is_some_and(|&id| self.external[id as usize])
    }

    pub fn node_count(&self) -> usize {
        self.keys.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Callees reachable from `key` within `max_depth` hops.
    pub fn outgoing(&self, key: &str, max_depth: usize) -> Vec<TraversalEntry> {
        self.traverse(key, max_depth, &self.out_edges)
    }

    /// Callers that reach `key` within `max_depth` hops.
    pub fn incoming(&self, key: &str, max_depth: usize) -> Vec<TraversalEntry> {
        self.traverse(key, max_depth, &self.in_edges)
    }

    fn traverse(&self, key: &str, max_depth: usize, adjacency: &[Vec<u32>]) -> Vec<TraversalEntry> {
        let Some(&start) = self.ids.get(key) else {
            return Vec::new();
        };
        if max_depth == 0 {
            return Vec::new();
        }

        let mut visited = vec![false; self.keys.len()];
        let mut cycle_reported = vec![false; self.keys.len()];
        let mut entries = Vec::new();
        visited[start as usize] = true;
        self.walk(
            start,
            1,
            max_depth,
            adjacency,
            &mut visited,
            &mut cycle_reported,
            &mut entries,
        );
        entries
    }

    fn walk(
        &self,
        node: u32,
        depth: usize,
        max_depth: usize,
        adjacency: &[Vec<u32>],
        visited: &mut [bool],
        cycle_reported: &mut [bool],
        entries: &mut Vec<TraversalEntry>,
    ) {
        if depth > max_depth {
            return;
        }
        for &next in &adjacency[node as usize] {
            let i = next as usize;
            if !visited[i] {
                visited[i] = true;
                entries.push(self.entry(next, depth, false));
                self.walk(
                    next,
                    depth + 1,
                    max_depth,
                    adjacency,
                    visited,
                    cycle_reported,
                    entries,
                );
            } else if !cycle_reported[i] {
                cycle_reported[i] = true;
                entries.push(self.entry(next, depth, true));
            }
        }
    }

    fn entry(&self, id: u32, depth: usize, cycle: bool) -> TraversalEntry {
        TraversalEntry {
            depth,
            method_key: self.keys[id as usize].clone(),
            external: self.external[id as usize],
            cycle,
        }
    }
}

pub fn build_call_graph(index: &StructuralIndex, files: &[ParsedFile]) -> CallGraph {
    let mut graph = CallGraph::default();

    // Every locally declared method becomes a node up front, so isolated
    // methods are still addressable by traversal queries.
    let local_keys: Vec<String> = index.methods().map(|m| m.key()).collect();
    for key in &local_keys {
        graph.intern(key, false);
    }

    for file in files {
        let root = file.root();
        let package = package_of(&root, file.bytes());
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if is_type_declaration(child.kind()) {
                visit_type(&child, &package, None, file, index, &mut graph);
            }
        }
    }

    graph.finalize();
    graph
}

fn visit_type(
    node: &Node,
    package: &str,
    enclosing: Option<&str>,
    file: &ParsedFile,
    index: &StructuralIndex,
    graph: &mut CallGraph,
) {
    let bytes = file.bytes();
    let Some(name) = node
        .child_by_field_name("name")
        .map(|n| node_text(&n, bytes).to_string())
    else {
        return;
    };
    let fqn = match enclosing {
        Some(outer) => format!("{outer}${name}"),
        None if package.is_empty() => name,
        None => format!("{package}.{name}"),
    };

    let Some(body) = type_body(node) else {
        return;
    };
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        visit_type_member(&member, &fqn, package, file, index, graph);
    }
}

fn visit_type_member(
    member: &Node,
    fqn: &str,
    package: &str,
    file: &ParsedFile,
    index: &StructuralIndex,
    graph: &mut CallGraph,
) {
    match member.kind() {
        "method_declaration" | "constructor_declaration" => {
            visit_method(member, fqn, file, index, graph);
        }
        "enum_body_declarations" => {
            let mut cursor = member.walk();
            for inner in member.children(&mut cursor) {
                visit_type_member(&inner, fqn, package, file, index, graph);
            }
        }
        kind if is_type_declaration(kind) => {
            visit_type(member, package, Some(fqn), file, index, graph);
        }
        _ => {}
    }
}

fn visit_method(
    node: &Node,
    owner: &str,
    file: &ParsedFile,
    index: &StructuralIndex,
    graph: &mut CallGraph,
) {
    let bytes = file.bytes();
    let name = if node.kind() == "constructor_declaration" {
        "<init>".to_string()
    } else {
        match node.child_by_field_name("name") {
            Some(n) => node_text(&n, bytes).to_string(),
            None => return,
        }
    };
    let Some(body) = node.child_by_field_name("body") else {
        return;
    };

    let caller_key = method_key(owner, &name, &parameter_types(node, bytes));
    let caller = graph.intern(&caller_key, false);

    let scope = method_scope(node, &body, bytes);
    let mut invocations = Vec::new();
    collect_invocations(&body, &mut invocations);

    for inv in invocations {
        match resolve_invocation(&inv, owner, &scope, index, bytes) {
            Resolution::Resolved(key) => {
                let target = graph.intern(&key, false);
                graph.add_edge(caller, target);
            }
            Resolution::External(key) => {
                let target = graph.intern(&key, true);
                graph.add_edge(caller, target);
            }
            Resolution::Unresolved => graph.unresolved_calls += 1,
        }
    }
}

/// Static type of every name visible in a method body: parameters first,
/// then local variable declarations (shadowing is ignored).
fn method_scope(node: &Node, body: &Node, bytes: &[u8]) -> HashMap<String, String> {
    let mut scope = HashMap::new();

    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if let (Some(ty), Some(name)) = (
                param.child_by_field_name("type"),
                param.child_by_field_name("name"),
            ) {
                scope
                    .entry(node_text(&name, bytes).to_string())
                    .or_insert_with(|| erase_generics(node_text(&ty, bytes)));
            }
        }
    }

    collect_locals(body, bytes, &mut scope);
    scope
}

fn collect_locals(node: &Node, bytes: &[u8], scope: &mut HashMap<String, String>) {
    match node.kind() {
        "local_variable_declaration" => {
            if let Some(ty) = node.child_by_field_name("type") {
                let declared = erase_generics(node_text(&ty, bytes));
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "variable_declarator"
                        && let Some(name) = child.child_by_field_name("name")
                    {
                        scope
                            .entry(node_text(&name, bytes).to_string())
                            .or_insert_with(|| declared.clone());
                    }
                }
            }
        }
        // The loop variable of a for-each carries its declared element type.
        "enhanced_for_statement" => {
            if let (Some(ty), Some(name)) = (
                node.child_by_field_name("type"),
                node.child_by_field_name("name"),
            ) {
                scope
                    .entry(node_text(&name, bytes).to_string())
                    .or_insert_with(|| erase_generics(node_text(&ty, bytes)));
            }
        }
        "catch_formal_parameter" => {
            if let (Some(ty), Some(name)) = (catch_type_of(node, bytes), node.child_by_field_name("name"))
            {
                scope
                    .entry(node_text(&name, bytes).to_string())
                    .or_insert(ty);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_locals(&child, bytes, scope);
    }
}

/// Multi-catch clauses union several types; the first alternative stands in
/// for the variable's static type.
fn catch_type_of(node: &Node, bytes: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    let catch_type = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "catch_type")?;
    let text = node_text(&catch_type, bytes);
    let first = text.split('|').next().unwrap_or(text).trim();
    Some(erase_generics(first))
}

fn collect_invocations<'t>(node: &Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.kind() == "method_invocation" {
        out.push(*node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_invocations(&child, out);
    }
}

fn resolve_invocation(
    inv: &Node,
    owner: &str,
    scope: &HashMap<String, String>,
    index: &StructuralIndex,
    bytes: &[u8],
) -> Resolution {
    let Some(name) = inv
        .child_by_field_name("name")
        .map(|n| node_text(&n, bytes).to_string())
    else {
        return Resolution::Unresolved;
    };
    let argc = inv
        .child_by_field_name("arguments")
        .map(|a| a.named_child_count())
        .unwrap_or(0);

    let receiver = inv.child_by_field_name("object");
    let receiver_type = match receiver {
        // Unqualified call: the enclosing type and its supertype chain.
        None => {
            return match find_in_hierarchy(index, owner, &name, argc) {
                Some(key) => Resolution::Resolved(key),
                None => Resolution::Unresolved,
            };
        }
        Some(obj) => match obj.kind() {
            "this" => {
                return match find_in_hierarchy(index, owner, &name, argc) {
                    Some(key) => Resolution::Resolved(key),
                    None => Resolution::Unresolved,
                };
            }
            "super" => index
                .component(owner)
                .and_then(|c| c.supertypes.first().cloned()),
            "identifier" => {
                let ident = node_text(&obj, bytes).to_string();
                match lookup_receiver_type(&ident, owner, scope, index) {
                    Some(ty) => Some(ty),
                    // An unknown capitalized name reads as a type reference
                    // for a static call; anything else is an unrecoverable
                    // receiver, not a type.
                    None if looks_like_type_name(&ident) => Some(ident),
                    None => None,
                }
            }
            "field_access" => {
                let text = node_text(&obj, bytes);
                text.strip_prefix("this.")
                    .and_then(|field| lookup_receiver_type(field, owner, scope, index))
            }
            _ => None,
        },
    };

    let Some(receiver_type) = receiver_type else {
        return Resolution::Unresolved;
    };
    let base = erase_generics(&receiver_type);
    if base.is_empty() {
        return Resolution::Unresolved;
    }

    if let Some(local_fqn) = resolve_local_type(index, owner, &base) {
        if let Some(key) = find_in_hierarchy(index, &local_fqn, &name, argc) {
            return Resolution::Resolved(key);
        }
    }

    Resolution::External(external_key(&base, &name, argc))
}

fn looks_like_type_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

fn lookup_receiver_type(
    ident: &str,
    owner: &str,
    scope: &HashMap<String, String>,
    index: &StructuralIndex,
) -> Option<String> {
    if let Some(ty) = scope.get(ident) {
        return Some(ty.clone());
    }
    index
        .component(owner)?
        .fields
        .iter()
        .find(|f| f.name == ident)
        .map(|f| f.declared_type.clone())
}

/// Maps a type text to a locally declared component FQN: exact match, same
/// package, nested in the enclosing type, or a unique simple-name match.
fn resolve_local_type(index: &StructuralIndex, owner: &str, base: &str) -> Option<String> {
    if index.component(base).is_some() {
        return Some(base.to_string());
    }
    if let Some(context) = index.component(owner) {
        if !context.package.is_empty() {
            let candidate = format!("{}.{base}", context.package);
            if index.component(&candidate).is_some() {
                return Some(candidate);
            }
        }
        let nested = format!("{owner}${base}");
        if index.component(&nested).is_some() {
            return Some(nested);
        }
    }

    let simple = simple_name(base);
    let matches = index.by_simple_name(simple);
    match matches.as_slice() {
        [only] => Some(only.fqn.clone()),
        _ => None,
    }
}

/// Breadth-first name + arity search through the locally-known supertype
/// chain. No overload disambiguation beyond arity.
fn find_in_hierarchy(
    index: &StructuralIndex,
    start: &str,
    name: &str,
    argc: usize,
) -> Option<String> {
    let mut queue = vec![start.to_string()];
    let mut visited: HashSet<String> = HashSet::new();
    let mut head = 0;

    while head < queue.len() {
        let fqn = queue[head].clone();
        head += 1;
        if !visited.insert(fqn.clone()) {
            continue;
        }
        let Some(comp) = index.component(&fqn) else {
            continue;
        };
        if let Some(m) = comp
            .methods
            .iter()
            .find(|m| m.name == name && m.parameter_types.len() == argc)
        {
            return Some(m.key());
        }
        for supertype in &comp.supertypes {
            if let Some(resolved) = resolve_local_type(index, &fqn, supertype) {
                queue.push(resolved);
            }
        }
    }
    None
}

/// Synthetic node key for a call outside the parsed project. Parameter
/// types are unknowable, only arity is: `Logger.info(?)`.
fn external_key(receiver_type: &str, name: &str, argc: usize) -> String {
    format!("{receiver_type}.{name}({})", vec!["?"; argc].join(","))
}
