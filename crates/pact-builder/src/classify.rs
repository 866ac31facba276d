//! Value classification.
//!
//! Wrapper variants are recognised before raw collections so that a matcher
//! around a sequence is dispatched as a matcher.

use std::collections::BTreeMap;

use crate::node::{
    ArrayContains, Generator, Invalid, Matcher, MatcherGenerator, Node, Repetition, Scalar,
};

/// Borrowed view of a node, tagged with its kind.
#[derive(Debug, Clone, Copy)]
pub enum Classified<'a> {
    Matcher(&'a Matcher),
    Repetition(&'a Repetition),
    ArrayContains(&'a ArrayContains),
    Generator(&'a Generator),
    MatcherGenerator(&'a MatcherGenerator),
    Scalar(&'a Scalar),
    Sequence(&'a [Node]),
    Mapping(&'a BTreeMap<String, Node>),
    Invalid(&'a Invalid),
}

impl Classified<'_> {
    /// Whether this node contributes matching rules of its own.
    pub fn is_matcher(&self) -> bool {
        matches!(
            self,
            Classified::Matcher(_)
                | Classified::Repetition(_)
                | Classified::ArrayContains(_)
                | Classified::MatcherGenerator(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classified::Matcher(_) => "matcher",
            Classified::Repetition(_) => "repetition matcher",
            Classified::ArrayContains(_) => "array-contains matcher",
            Classified::Generator(_) => "generator",
            Classified::MatcherGenerator(_) => "matcher with generator",
            Classified::Scalar(_) => "scalar",
            Classified::Sequence(_) => "sequence",
            Classified::Mapping(_) => "mapping",
            Classified::Invalid(_) => "invalid",
        }
    }
}

/// Determine which kind of node this is.
pub fn classify(node: &Node) -> Classified<'_> {
    match node {
        Node::Matcher(m) => Classified::Matcher(m),
        Node::Repetition(r) => Classified::Repetition(r),
        Node::ArrayContains(a) => Classified::ArrayContains(a),
        Node::Generator(g) => Classified::Generator(g),
        Node::MatcherGenerator(c) => Classified::MatcherGenerator(c),
        Node::Scalar(s) => Classified::Scalar(s),
        Node::Sequence(items) => Classified::Sequence(items),
        Node::Mapping(members) => Classified::Mapping(members),
        Node::Invalid(invalid) => Classified::Invalid(invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers;

    #[test]
    fn test_matcher_around_sequence_is_a_matcher() {
        let node = matchers::like(Node::sequence([1, 2, 3]));
        assert!(matches!(classify(&node), Classified::Matcher(_)));
    }

    #[test]
    fn test_each_like_is_a_repetition() {
        let node = matchers::each_like(Node::mapping([("id", 1)]));
        let classified = classify(&node);
        assert!(matches!(classified, Classified::Repetition(_)));
        assert!(classified.is_matcher());
    }

    #[test]
    fn test_raw_collections() {
        assert_eq!(classify(&Node::sequence([1])).label(), "sequence");
        assert_eq!(classify(&Node::mapping([("a", 1)])).label(), "mapping");
        assert_eq!(classify(&Node::from(1)).label(), "scalar");
    }

    #[test]
    fn test_invalid_is_never_coerced() {
        let node = Node::from(chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert!(matches!(classify(&node), Classified::Invalid(_)));
    }
}
