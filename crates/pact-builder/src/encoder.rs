//! Top-level encoder.
//!
//! Seeds the processor with the root path of an interaction element and
//! reshapes the compiled declaration maps into the contract document form.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::EncodingError;
use crate::generators::GeneratorDeclaration;
use crate::node::Node;
use crate::path::Path;
use crate::processor::{Compiled, Processor};
use crate::rules::{PathMap, RuleSet};

/// The part of a request or response a node tree describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionElement {
    Body,
    Query,
    Header,
    Path,
}

impl InteractionElement {
    /// `$` for bodies; path, query and header locations are not JSONPath
    /// addressed.
    pub fn seed(self) -> Path {
        match self {
            InteractionElement::Body => Path::body_root(),
            _ => Path::empty(),
        }
    }

    pub fn is_body(self) -> bool {
        self == InteractionElement::Body
    }

    /// Key used under `matchingRules` and `generators`.
    pub fn name(self) -> &'static str {
        match self {
            InteractionElement::Body => "body",
            InteractionElement::Query => "query",
            InteractionElement::Header => "header",
            InteractionElement::Path => "path",
        }
    }
}

/// Declarations for one element: keyed by path, or a single bare entry when
/// the element has one addressable location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Declarations<T> {
    Bare(T),
    ByPath(PathMap<T>),
}

impl<T> Declarations<T> {
    fn shape(mut map: PathMap<T>, element: InteractionElement) -> Option<Self> {
        if map.is_empty() {
            return None;
        }
        if !element.is_body() && map.len() == 1 {
            if let Some(bare) = map.remove(&Path::empty()) {
                return Some(Declarations::Bare(bare));
            }
        }
        Some(Declarations::ByPath(map))
    }

    pub fn len(&self) -> usize {
        match self {
            Declarations::Bare(_) => 1,
            Declarations::ByPath(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One element ready to be placed in an interaction document.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedElement {
    pub element: InteractionElement,
    pub value: Value,
    pub rules: Option<Declarations<RuleSet>>,
    pub generators: Option<Declarations<GeneratorDeclaration>>,
}

/// Compile `node` as `element` and reshape its declarations.
pub fn encode(
    node: &Node,
    element: InteractionElement,
    max_depth: usize,
) -> Result<EncodedElement, EncodingError> {
    let Compiled {
        value,
        rules,
        generators,
    } = Processor::new(element)
        .with_max_depth(max_depth)
        .process(node, &element.seed(), false)?;

    debug!(
        element = element.name(),
        rule_paths = rules.len(),
        generator_paths = generators.len(),
        "compiled interaction element"
    );

    Ok(EncodedElement {
        element,
        value,
        rules: Declarations::shape(rules, element),
        generators: Declarations::shape(generators, element),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers;
    use crate::processor::DEFAULT_MAX_DEPTH;
    use crate::rules::RuleLogic;
    use serde_json::json;

    fn encoded(node: &Node, element: InteractionElement) -> EncodedElement {
        encode(node, element, DEFAULT_MAX_DEPTH).unwrap()
    }

    #[test]
    fn test_seeds() {
        assert_eq!(InteractionElement::Body.seed().as_str(), "$");
        assert_eq!(InteractionElement::Header.seed().as_str(), "");
        assert_eq!(InteractionElement::Path.seed().as_str(), "");
    }

    #[test]
    fn test_body_rules_are_keyed_by_path() {
        let result = encoded(
            &Node::mapping([("data", matchers::equal_to("x"))]),
            InteractionElement::Body,
        );
        assert_eq!(
            serde_json::to_value(result.rules).unwrap(),
            json!({"$.data": {"matchers": [{"match": "equality"}]}})
        );
        assert!(result.generators.is_none());
    }

    #[test]
    fn test_path_collapses_to_bare_declaration() {
        let result = encoded(
            &matchers::regex(r"^/users/\d+$", "/users/1"),
            InteractionElement::Path,
        );
        assert_eq!(result.value, json!("/users/1"));
        assert_eq!(
            serde_json::to_value(result.rules).unwrap(),
            json!({"matchers": [{"match": "regex", "regex": "^/users/\\d+$"}]})
        );
    }

    #[test]
    fn test_headers_are_keyed_by_name() {
        let headers = Node::mapping([
            ("Content-Type", matchers::regex("^application/json.*$", "application/json")),
            ("X-Trace", Node::from("abc")),
        ]);
        let result = encoded(&headers, InteractionElement::Header);
        assert_eq!(
            serde_json::to_value(result.rules).unwrap(),
            json!({"Content-Type": {"matchers": [{"match": "regex", "regex": "^application/json.*$"}]}})
        );
    }

    #[test]
    fn test_include_combine_reaches_document() {
        let result = encoded(
            &Node::mapping([("text", matchers::includes(["a", "b"], RuleLogic::Or))]),
            InteractionElement::Body,
        );
        assert_eq!(
            serde_json::to_value(result.rules).unwrap(),
            json!({"$.text": {
                "matchers": [{"match": "include", "value": "a"}, {"match": "include", "value": "b"}],
                "combine": "OR"
            }})
        );
    }

    #[test]
    fn test_plain_values_have_no_declarations() {
        let result = encoded(&Node::from("plain"), InteractionElement::Body);
        assert!(result.rules.is_none());
        assert!(result.generators.is_none());
        assert_eq!(result.value, json!("plain"));
    }
}
