//! Structural model extraction from parsed Java sources.
//!
//! Walks every syntax tree and builds the project-wide [`StructuralIndex`]:
//! declared types (top-level and nested), their annotations, fields, methods
//! and supertype names. Supertypes stay as written in source; no cross-file
//! resolution happens here.

use tree_sitter::Node;

use crate::classify::classify;
use crate::model::{Component, FieldDescriptor, MethodDescriptor, StructuralIndex};
use crate::parse::ParsedFile;

pub fn build_index(files: &[ParsedFile]) -> StructuralIndex {
    let mut index = StructuralIndex::default();
    for file in files {
        let root = file.root();
        let package = package_of(&root, file.bytes());
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if is_type_declaration(child.kind()) {
                index_type(&child, &package, None, file, &mut index);
            }
        }
    }
    index
}

fn index_type(
    node: &Node,
    package: &str,
    enclosing: Option<&str>,
    file: &ParsedFile,
    index: &mut StructuralIndex,
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
        None if package.is_empty() => name.clone(),
        None => format!("{package}.{name}"),
    };

    let (annotations, _) = annotations_and_modifiers(node, bytes);
    let role = classify(&annotations);

    let mut component = Component {
        fqn: fqn.clone(),
        name: name.clone(),
        package: package.to_string(),
        path: file.path.to_string_lossy().to_string(),
        annotations,
        role,
        supertypes: supertype_names(node, bytes),
        fields: Vec::new(),
        methods: Vec::new(),
    };

    let mut nested: Vec<Node> = Vec::new();
    if let Some(body) = type_body(node) {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            collect_member(&member, bytes, &mut component, &mut nested);
        }
    }

    index.insert(component);

    for inner in nested {
        index_type(&inner, package, Some(&fqn), file, index);
    }
}

fn collect_member<'t>(
    member: &Node<'t>,
    bytes: &[u8],
    component: &mut Component,
    nested: &mut Vec<Node<'t>>,
) {
    match member.kind() {
        "field_declaration" | "constant_declaration" => {
            collect_fields(member, bytes, component);
        }
        "method_declaration" | "constructor_declaration" => {
            if let Some(m) = method_descriptor(member, bytes, &component.fqn) {
                component.methods.push(m);
            }
        }
        "enum_constant" => {
            if let Some(n) = member.child_by_field_name("name") {
                component.fields.push(FieldDescriptor {
                    name: node_text(&n, bytes).to_string(),
                    declared_type: component.name.clone(),
                    annotations: Vec::new(),
                });
            }
        }
        "enum_body_declarations" => {
            let mut cursor = member.walk();
            for inner in member.children(&mut cursor) {
                collect_member(&inner, bytes, component, nested);
            }
        }
        kind if is_type_declaration(kind) => nested.push(*member),
        _ => {}
    }
}

fn collect_fields(node: &Node, bytes: &[u8], component: &mut Component) {
    let Some(ty) = node.child_by_field_name("type") else {
        return;
    };
    let declared_type = erase_generics(node_text(&ty, bytes));
    let (annotations, _) = annotations_and_modifiers(node, bytes);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "variable_declarator"
            && let Some(name) = child.child_by_field_name("name")
        {
            component.fields.push(FieldDescriptor {
                name: node_text(&name, bytes).to_string(),
                declared_type: declared_type.clone(),
                annotations: annotations.clone(),
            });
        }
    }
}

fn method_descriptor(node: &Node, bytes: &[u8], owner: &str) -> Option<MethodDescriptor> {
    let constructor = node.kind() == "constructor_declaration";
    let name = if constructor {
        "<init>".to_string()
    } else {
        node_text(&node.child_by_field_name("name")?, bytes).to_string()
    };

    let (annotations, modifiers) = annotations_and_modifiers(node, bytes);
    let return_type = if constructor {
        simple_name(owner).to_string()
    } else {
        node.child_by_field_name("type")
            .map(|t| erase_generics(node_text(&t, bytes)))
            .unwrap_or_else(|| "void".to_string())
    };

    Some(MethodDescriptor {
        owner: owner.to_string(),
        name,
        parameter_types: parameter_types(node, bytes),
        return_type,
        modifiers,
        annotations,
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
    })
}

pub(crate) fn parameter_types(node: &Node, bytes: &[u8]) -> Vec<String> {
    let mut types = Vec::new();
    let Some(params) = node.child_by_field_name("parameters") else {
        return types;
    };

    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        let spread = param.kind() == "spread_parameter";
        if param.kind() != "formal_parameter" && !spread {
            continue;
        }
        let Some(ty) = param.child_by_field_name("type") else {
            continue;
        };
        let mut text = erase_generics(node_text(&ty, bytes));
        if spread {
            text.push_str("...");
        }
        types.push(text);
    }
    types
}

pub(crate) fn annotations_and_modifiers(node: &Node, bytes: &[u8]) -> (Vec<String>, Vec<String>) {
    let mut annotations = Vec::new();
    let mut modifiers = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "modifiers" {
            continue;
        }
        let mut inner = child.walk();
        for item in child.children(&mut inner) {
            match item.kind() {
                "marker_annotation" | "annotation" => {
                    if let Some(name) = item.child_by_field_name("name") {
                        annotations.push(format!("@{}", node_text(&name, bytes)));
                    }
                }
                _ => modifiers.push(node_text(&item, bytes).to_string()),
            }
        }
    }

    (annotations, modifiers)
}

fn supertype_names(node: &Node, bytes: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "superclass" => {
                let mut inner = child.walk();
                for ty in child.named_children(&mut inner) {
                    names.push(erase_generics(node_text(&ty, bytes)));
                }
            }
            "super_interfaces" | "extends_interfaces" => {
                let mut inner = child.walk();
                for list in child.named_children(&mut inner) {
                    if list.kind() == "type_list" {
                        let mut types = list.walk();
                        for ty in list.named_children(&mut types) {
                            names.push(erase_generics(node_text(&ty, bytes)));
                        }
                    }
                }
            }
            _ => {}
        }
    }
    names
}

pub(crate) fn package_of(root: &Node, bytes: &[u8]) -> String {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() == "package_declaration" {
            let mut inner = child.walk();
            for part in child.children(&mut inner) {
                if part.kind() == "scoped_identifier" || part.kind() == "identifier" {
                    return node_text(&part, bytes).to_string();
                }
            }
        }
    }
    String::new()
}

pub(crate) fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration"
    )
}

pub(crate) fn type_body<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|child| {
        matches!(
            child.kind(),
            "class_body"
                | "interface_body"
                | "enum_body"
                | "annotation_type_body"
                | "record_declaration_body"
        )
    })
}

pub(crate) fn node_text<'a>(node: &Node, bytes: &'a [u8]) -> &'a str {
    node.utf8_text(bytes).unwrap_or("")
}

/// Strips generic arguments from a type text: `Map<String, User>` → `Map`,
/// `String[]` stays as is.
pub(crate) fn erase_generics(ty: &str) -> String {
    let base = ty.split('<').next().unwrap_or(ty).trim().to_string();
    if ty.ends_with("[]") && !base.ends_with("[]") {
        format!("{base}[]")
    } else {
        base
    }
}

pub(crate) fn simple_name(fqn: &str) -> &str {
    let after_nesting = fqn.rsplit('$').next().unwrap_or(fqn);
    after_nesting.rsplit('.').next().unwrap_or(after_nesting)
}
