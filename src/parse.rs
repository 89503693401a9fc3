//! Java source parsing via tree-sitter.
//!
//! One file in, one syntax tree out. A file whose tree contains any syntax
//! error is rejected wholesale: it contributes a single [`ParseError`] and
//! nothing else, and the rest of the scan continues.

use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

use crate::model::ParseError;

/// A successfully parsed source file. Lives only for the duration of one
/// scan; derived data is what gets kept.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub text: String,
    pub tree: Tree,
}

impl ParsedFile {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

/// Reads a file as UTF-8, falling back to lossy decoding for the odd
/// legacy-encoded source file.
pub fn read_source(path: &Path) -> Result<String, ParseError> {
    let bytes = std::fs::read(path).map_err(|e| ParseError {
        path: path.to_string_lossy().to_string(),
        line: None,
        column: None,
        message: format!("read failed: {e}"),
    })?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).to_string(),
    })
}

pub fn parse_source(path: &Path, text: String) -> Result<ParsedFile, ParseError> {
    let error = |message: String, node: Option<&Node>| ParseError {
        path: path.to_string_lossy().to_string(),
        line: node.map(|n| n.start_position().row + 1),
        column: node.map(|n| n.start_position().column + 1),
        message,
    };

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| error(format!("failed to load Java grammar: {e}"), None))?;

    let tree = parser
        .parse(&text, None)
        .ok_or_else(|| error("parser produced no tree".to_string(), None))?;

    let root = tree.root_node();
    if root.has_error() {
        let first = first_error_node(root);
        let message = match first {
            Some(n) if n.is_missing() => format!("missing {}", n.kind()),
            _ => "syntax error".to_string(),
        };
        return Err(error(message, first.as_ref()));
    }

    Ok(ParsedFile {
        path: path.to_path_buf(),
        text,
        tree,
    })
}

fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(child) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_source_succeeds() {
        let src = r#"
package org.example;

public class Foo {
    public void run() {
    }
}
"#;
        let parsed = parse_source(Path::new("Foo.java"), src.to_string()).unwrap();
        assert_eq!(parsed.root().kind(), "program");
    }

    #[test]
    fn parse_reports_error_location() {
        let src = r#"
package org.example;

public class Broken {
    public void run( {
    }
}
"#;
        let err = parse_source(Path::new("Broken.java"), src.to_string()).unwrap_err();
        assert_eq!(err.path, "Broken.java");
        assert!(err.line.is_some());
        assert!(!err.message.is_empty());
    }

    #[test]
    fn empty_source_is_not_an_error() {
        // An empty compilation unit is syntactically valid Java.
        let parsed = parse_source(Path::new("Empty.java"), String::new()).unwrap();
        assert_eq!(parsed.root().named_child_count(), 0);
    }
}
