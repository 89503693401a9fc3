//! Spring stereotype classification.
//!
//! A type's role is a pure function of its declared annotations, evaluated
//! against a fixed rule table. Earlier table rows win regardless of the
//! order annotations appear on the type.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Controller,
    Service,
    Repository,
    Configuration,
    Entity,
    Component,
    None,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Controller => "controller",
            Role::Service => "service",
            Role::Repository => "repository",
            Role::Configuration => "configuration",
            Role::Entity => "entity",
            Role::Component => "component",
            Role::None => "none",
        }
    }
}

/// Priority-ordered rule table. The repository marker outranks the generic
/// `@Component` marker when both are present.
const ROLE_RULES: &[(&str, Role)] = &[
    ("RestController", Role::Controller),
    ("Controller", Role::Controller),
    ("RestControllerAdvice", Role::Controller),
    ("ControllerAdvice", Role::Controller),
    ("Repository", Role::Repository),
    ("Service", Role::Service),
    ("Configuration", Role::Configuration),
    ("Entity", Role::Entity),
    ("Component", Role::Component),
];

/// Returns the first rule matching any of the declared annotations, or
/// [`Role::None`]. Annotations may be simple (`@Service`) or qualified
/// (`@org.springframework.stereotype.Service`).
pub fn classify(annotations: &[String]) -> Role {
    for (marker, role) in ROLE_RULES {
        if annotations.iter().any(|a| annotation_simple_name(a) == *marker) {
            return *role;
        }
    }
    Role::None
}

fn annotation_simple_name(annotation: &str) -> &str {
    let name = annotation.trim_start_matches('@');
    let name = name.split('(').next().unwrap_or(name);
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annos(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn classify_matches_simple_stereotypes() {
        assert_eq!(classify(&annos(&["@RestController"])), Role::Controller);
        assert_eq!(classify(&annos(&["@Service"])), Role::Service);
        assert_eq!(classify(&annos(&["@Entity"])), Role::Entity);
        assert_eq!(classify(&annos(&[])), Role::None);
        assert_eq!(classify(&annos(&["@Override", "@Deprecated"])), Role::None);
    }

    #[test]
    fn repository_outranks_generic_component() {
        let order_a = annos(&["@Component", "@Repository"]);
        let order_b = annos(&["@Repository", "@Component"]);
        assert_eq!(classify(&order_a), Role::Repository);
        assert_eq!(classify(&order_b), Role::Repository);
    }

    #[test]
    fn classify_is_idempotent() {
        let input = annos(&["@Component", "@Service"]);
        let first = classify(&input);
        for _ in 0..3 {
            assert_eq!(classify(&input), first);
        }
    }

    #[test]
    fn qualified_annotations_match_by_simple_name() {
        let input = annos(&["@org.springframework.stereotype.Service"]);
        assert_eq!(classify(&input), Role::Service);
    }

    #[test]
    fn annotation_arguments_are_ignored() {
        let input = annos(&["@RequestMapping(\"/users\")", "@Controller"]);
        assert_eq!(classify(&input), Role::Controller);
    }
}
