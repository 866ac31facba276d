//! The recursive processor.
//!
//! Walks a [`Node`] tree and produces its [`Compiled`] form: the JSON value
//! with every wrapper stripped to its example, plus the path-indexed rules
//! and generators the wrappers contributed. Each call returns fresh maps;
//! siblings are combined through [`crate::merge`].

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::classify::{classify, Classified};
use crate::contribution;
use crate::encoder::InteractionElement;
use crate::error::{EncodingError, FailureReason};
use crate::generators::GeneratorDeclaration;
use crate::merge::{merge, overlay};
use crate::node::{
    ArrayContains, Generator, Invalid, Matcher, MatcherGenerator, Node, Repetition, Scalar,
};
use crate::path::{self, CollectionShape, Path, Segment};
use crate::rules::{ArrayContainsVariant, MatchingRule, PathMap, RuleSet};

/// Default nesting limit before compilation gives up.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// A compiled sub-tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub value: Value,
    pub rules: PathMap<RuleSet>,
    pub generators: PathMap<GeneratorDeclaration>,
}

impl Compiled {
    fn leaf(value: Value) -> Self {
        Self {
            value,
            rules: PathMap::new(),
            generators: PathMap::new(),
        }
    }
}

/// Compiles nodes for one interaction element.
#[derive(Debug, Clone, Copy)]
pub struct Processor {
    element: InteractionElement,
    max_depth: usize,
}

impl Processor {
    pub fn new(element: InteractionElement) -> Self {
        Self {
            element,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn element(&self) -> InteractionElement {
        self.element
    }

    /// Compile `node` found at `path`.
    ///
    /// `inside_repetition` is set when `node` is the collection of a
    /// repetition matcher, so its elements share one path.
    pub fn process(
        &self,
        node: &Node,
        path: &Path,
        inside_repetition: bool,
    ) -> Result<Compiled, EncodingError> {
        self.visit(node, path, inside_repetition, 0)
    }

    fn visit(
        &self,
        node: &Node,
        path: &Path,
        inside_repetition: bool,
        depth: usize,
    ) -> Result<Compiled, EncodingError> {
        if depth > self.max_depth {
            return Err(EncodingError::new(
                FailureReason::DepthExceeded {
                    limit: self.max_depth,
                },
                node.describe(),
                path,
            ));
        }

        let classified = classify(node);
        trace!(path = %path, kind = classified.label(), "processing node");

        match classified {
            Classified::Scalar(scalar) => Ok(Compiled::leaf(scalar_value(scalar, path)?)),
            Classified::Sequence(items) => self.sequence(items, path, inside_repetition, depth),
            Classified::Mapping(members) => self.mapping(members, path, depth),
            Classified::Matcher(matcher) => self.matcher(matcher, path, depth),
            Classified::Repetition(repetition) => self.repetition(repetition, path, depth),
            Classified::ArrayContains(contains) => self.array_contains(contains, path, depth),
            Classified::Generator(generator) => self.generator(generator, path, depth),
            Classified::MatcherGenerator(composite) => self.composite(composite, path, depth),
            Classified::Invalid(invalid) => Err(invalid_error(invalid, path)),
        }
    }

    fn sequence(
        &self,
        items: &[Node],
        path: &Path,
        inside_repetition: bool,
        depth: usize,
    ) -> Result<Compiled, EncodingError> {
        // Outside bodies a value list is addressed as a whole.
        let shared = inside_repetition || !self.element.is_body();

        let mut values = Vec::with_capacity(items.len());
        let mut rules = PathMap::new();
        let mut generators = PathMap::new();

        for (index, item) in items.iter().enumerate() {
            let child_path = path::extend(path, Segment::Index(index), shared);
            let child = self.visit(item, &child_path, false, depth + 1)?;
            values.push(child.value);
            if shared {
                rules = overlay(rules, child.rules);
                generators = overlay(generators, child.generators);
            } else {
                rules = merge(rules, child.rules).map_err(|at| collision(item, &at))?;
                generators =
                    merge(generators, child.generators).map_err(|at| collision(item, &at))?;
            }
        }

        Ok(Compiled {
            value: Value::Array(values),
            rules,
            generators,
        })
    }

    fn mapping(
        &self,
        members: &BTreeMap<String, Node>,
        path: &Path,
        depth: usize,
    ) -> Result<Compiled, EncodingError> {
        let mut object = Map::new();
        let mut rules = PathMap::new();
        let mut generators = PathMap::new();

        for (key, member) in members {
            let child_path = path::extend(path, Segment::Key(key), false);
            let child = self.visit(member, &child_path, false, depth + 1)?;
            object.insert(key.clone(), child.value);
            rules = merge(rules, child.rules).map_err(|at| collision(member, &at))?;
            generators = merge(generators, child.generators).map_err(|at| collision(member, &at))?;
        }

        Ok(Compiled {
            value: Value::Object(object),
            rules,
            generators,
        })
    }

    fn matcher(
        &self,
        matcher: &Matcher,
        path: &Path,
        depth: usize,
    ) -> Result<Compiled, EncodingError> {
        reject_nested(&matcher.value, path)?;
        for rule in &matcher.rules {
            contribution::check_rule(rule, &matcher.value, path)?;
        }

        let mut compiled = self.visit(&matcher.value, path, false, depth + 1)?;
        compiled
            .rules
            .insert(path.clone(), contribution::matcher_rules(matcher));
        Ok(compiled)
    }

    fn repetition(
        &self,
        repetition: &Repetition,
        path: &Path,
        depth: usize,
    ) -> Result<Compiled, EncodingError> {
        let shape = match &repetition.collection {
            Node::Sequence(_) => CollectionShape::Sequence,
            Node::Mapping(_) => CollectionShape::Mapping,
            other => {
                return Err(EncodingError::new(
                    FailureReason::InvalidParameter {
                        message: "a repetition must wrap a sequence or a mapping".to_string(),
                    },
                    other.describe(),
                    path,
                ))
            }
        };

        let wildcard = path::wildcard(path, shape);
        let mut compiled = self.visit(&repetition.collection, &wildcard, true, depth + 1)?;
        if shape == CollectionShape::Mapping {
            compiled.value = Value::Array(vec![compiled.value]);
        }
        compiled
            .rules
            .insert(path.clone(), contribution::repetition_rules(repetition));
        Ok(compiled)
    }

    /// Each variant is compiled on its own, rooted at `$`.
    fn array_contains(
        &self,
        contains: &ArrayContains,
        path: &Path,
        depth: usize,
    ) -> Result<Compiled, EncodingError> {
        let variant_processor = Processor {
            element: InteractionElement::Body,
            max_depth: self.max_depth,
        };

        let mut values = Vec::with_capacity(contains.variants.len());
        let mut variants = Vec::with_capacity(contains.variants.len());

        for (index, variant) in contains.variants.iter().enumerate() {
            let compiled = variant_processor
                .visit(variant, &Path::body_root(), false, depth + 1)
                .map_err(|err| rebase(err, &path::extend(path, Segment::Index(index), false)))?;
            values.push(compiled.value);
            variants.push(ArrayContainsVariant {
                index,
                rules: compiled.rules,
                generators: compiled.generators,
            });
        }

        let mut rules = PathMap::new();
        rules.insert(
            path.clone(),
            RuleSet::new(vec![MatchingRule::ArrayContains { variants }]),
        );
        Ok(Compiled {
            value: Value::Array(values),
            rules,
            generators: PathMap::new(),
        })
    }

    fn generator(
        &self,
        generator: &Generator,
        path: &Path,
        depth: usize,
    ) -> Result<Compiled, EncodingError> {
        contribution::check_generator(&generator.declaration, &generator.value, path)?;
        let compiled = self.visit(&generator.value, path, false, depth + 1)?;
        with_generator(compiled, path, &generator.declaration, &generator.value)
    }

    fn composite(
        &self,
        composite: &MatcherGenerator,
        path: &Path,
        depth: usize,
    ) -> Result<Compiled, EncodingError> {
        reject_nested(&composite.value, path)?;
        contribution::check_rule(&composite.rule, &composite.value, path)?;
        contribution::check_generator(&composite.generator, &composite.value, path)?;

        let mut compiled = self.visit(&composite.value, path, false, depth + 1)?;
        // A request path segment is always a string; its type rule says nothing.
        if self.element != InteractionElement::Path {
            compiled
                .rules
                .insert(path.clone(), RuleSet::new(vec![composite.rule.clone()]));
        }
        with_generator(compiled, path, &composite.generator, &composite.value)
    }
}

fn with_generator(
    mut compiled: Compiled,
    path: &Path,
    declaration: &GeneratorDeclaration,
    value: &Node,
) -> Result<Compiled, EncodingError> {
    let own = PathMap::from([(path.clone(), declaration.clone())]);
    compiled.generators = merge(compiled.generators, own).map_err(|at| collision(value, &at))?;
    Ok(compiled)
}

/// Matchers do not compose by wrapping each other.
fn reject_nested(value: &Node, path: &Path) -> Result<(), EncodingError> {
    if classify(value).is_matcher() {
        return Err(EncodingError::new(
            FailureReason::NestedMatcher,
            value.describe(),
            path,
        ));
    }
    Ok(())
}

fn scalar_value(scalar: &Scalar, path: &Path) -> Result<Value, EncodingError> {
    let value = match scalar {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Integer(i) => Value::Number(Number::from(*i)),
        Scalar::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| EncodingError::not_encodable(f.to_string(), path))?,
        Scalar::Decimal(d) => {
            let text = d.to_string();
            serde_json::from_str::<Number>(&text)
                .map(Value::Number)
                .map_err(|_| EncodingError::not_encodable(text, path))?
        }
        Scalar::String(s) => Value::String(s.clone()),
    };
    Ok(value)
}

fn invalid_error(invalid: &Invalid, path: &Path) -> EncodingError {
    let reason = match &invalid.problem {
        Some(message) => FailureReason::InvalidParameter {
            message: message.clone(),
        },
        None => FailureReason::NotEncodable,
    };
    EncodingError::new(reason, invalid.description.clone(), path)
}

fn collision(node: &Node, at: &Path) -> EncodingError {
    EncodingError::new(FailureReason::PathCollision, node.describe(), at)
}

/// Re-express a variant-relative failure path under the array's own path.
fn rebase(mut error: EncodingError, base: &Path) -> EncodingError {
    let relative = error.path.as_str().strip_prefix('$').unwrap_or_default();
    error.path = Path::from(format!("{base}{relative}"));
    error
}
