//! Interactions: a request and the response it should receive.
//!
//! Requests and responses are compiled when they are attached to an
//! interaction. A compilation failure is kept on the interaction and
//! reported later, so one malformed interaction does not stop its siblings
//! from being declared.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::encoder::{encode, Declarations, EncodedElement, InteractionElement};
use crate::error::EncodingError;
use crate::generators::GeneratorDeclaration;
use crate::node::Node;
use crate::processor::DEFAULT_MAX_DEPTH;
use crate::rules::RuleSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Trace,
    Connect,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "TRACE" => Ok(HttpMethod::Trace),
            "CONNECT" => Ok(HttpMethod::Connect),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(format!("unknown HTTP method '{other}'")),
        }
    }
}

/// A named provider state with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderState {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

impl ProviderState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Rules or generators of a request/response, keyed by element name.
pub type ElementDeclarations<T> = BTreeMap<InteractionElement, Declarations<T>>;

/// Collects encoded elements into the document fields they populate.
#[derive(Default)]
struct Assembled {
    values: BTreeMap<InteractionElement, Value>,
    rules: ElementDeclarations<RuleSet>,
    generators: ElementDeclarations<GeneratorDeclaration>,
}

impl Assembled {
    fn add(&mut self, encoded: EncodedElement) {
        let EncodedElement {
            element,
            value,
            rules,
            generators,
        } = encoded;
        self.values.insert(element, value);
        if let Some(rules) = rules {
            self.rules.insert(element, rules);
        }
        if let Some(generators) = generators {
            self.generators.insert(element, generators);
        }
    }

    fn take(&mut self, element: InteractionElement) -> Option<Value> {
        self.values.remove(&element)
    }

    fn rules(&mut self) -> Option<ElementDeclarations<RuleSet>> {
        non_empty(std::mem::take(&mut self.rules))
    }

    fn generators(&mut self) -> Option<ElementDeclarations<GeneratorDeclaration>> {
        non_empty(std::mem::take(&mut self.generators))
    }
}

fn non_empty<T>(map: ElementDeclarations<T>) -> Option<ElementDeclarations<T>> {
    (!map.is_empty()).then_some(map)
}

/// An HTTP request as authored.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: HttpMethod,
    pub path: Node,
    pub query: BTreeMap<String, Vec<Node>>,
    pub headers: BTreeMap<String, Node>,
    pub body: Option<Node>,
}

impl Request {
    /// `path` is a plain string or a node such as a provider state value.
    pub fn new(method: HttpMethod, path: impl Into<Node>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn query<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Node>,
    {
        self.query
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<Node>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Node>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Each element of the request with the node it is authored as, in
    /// compilation order. Query parameters form one mapping of value lists.
    pub fn elements(&self) -> Vec<(InteractionElement, Node)> {
        let mut elements = vec![(InteractionElement::Path, self.path.clone())];
        if !self.query.is_empty() {
            let query = Node::mapping(
                self.query
                    .iter()
                    .map(|(name, values)| (name.clone(), Node::Sequence(values.clone()))),
            );
            elements.push((InteractionElement::Query, query));
        }
        if !self.headers.is_empty() {
            elements.push((InteractionElement::Header, Node::Mapping(self.headers.clone())));
        }
        if let Some(body) = &self.body {
            elements.push((InteractionElement::Body, body.clone()));
        }
        elements
    }

    /// Compile every element of the request.
    pub fn compile(&self, max_depth: usize) -> Result<CompiledRequest, EncodingError> {
        let mut assembled = Assembled::default();
        for (element, node) in self.elements() {
            assembled.add(encode(&node, element, max_depth)?);
        }

        Ok(CompiledRequest {
            method: self.method,
            path: assembled
                .take(InteractionElement::Path)
                .unwrap_or(Value::Null),
            query: assembled.take(InteractionElement::Query),
            headers: assembled.take(InteractionElement::Header),
            body: assembled.take(InteractionElement::Body),
            matching_rules: assembled.rules(),
            generators: assembled.generators(),
        })
    }
}

/// A request in contract document form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRequest {
    pub method: HttpMethod,
    pub path: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_rules: Option<ElementDeclarations<RuleSet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generators: Option<ElementDeclarations<GeneratorDeclaration>>,
}

/// An HTTP response as authored.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, Node>,
    pub body: Option<Node>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<Node>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Node>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Each element of the response with the node it is authored as.
    pub fn elements(&self) -> Vec<(InteractionElement, Node)> {
        let mut elements = Vec::new();
        if !self.headers.is_empty() {
            elements.push((InteractionElement::Header, Node::Mapping(self.headers.clone())));
        }
        if let Some(body) = &self.body {
            elements.push((InteractionElement::Body, body.clone()));
        }
        elements
    }

    pub fn compile(&self, max_depth: usize) -> Result<CompiledResponse, EncodingError> {
        let mut assembled = Assembled::default();
        for (element, node) in self.elements() {
            assembled.add(encode(&node, element, max_depth)?);
        }

        Ok(CompiledResponse {
            status: self.status,
            headers: assembled.take(InteractionElement::Header),
            body: assembled.take(InteractionElement::Body),
            matching_rules: assembled.rules(),
            generators: assembled.generators(),
        })
    }
}

/// A response in contract document form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledResponse {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_rules: Option<ElementDeclarations<RuleSet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generators: Option<ElementDeclarations<GeneratorDeclaration>>,
}

/// One request/response exchange between consumer and provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_state: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    provider_states: Vec<ProviderState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request: Option<CompiledRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<CompiledResponse>,
    #[serde(skip)]
    encoding_errors: Vec<EncodingError>,
    #[serde(skip)]
    max_depth: usize,
}

impl Interaction {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            provider_state: None,
            provider_states: Vec::new(),
            request: None,
            response: None,
            encoding_errors: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Nesting limit for elements attached after this call.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn given(mut self, provider_state: impl Into<String>) -> Self {
        self.provider_state = Some(provider_state.into());
        self
    }

    pub fn given_states<I>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = ProviderState>,
    {
        self.provider_states = states.into_iter().collect();
        self
    }

    pub fn with_request(mut self, request: Request) -> Self {
        match request.compile(self.max_depth) {
            Ok(compiled) => self.request = Some(compiled),
            Err(err) => {
                warn!(
                    interaction = %self.description,
                    error = %err,
                    "can not prepare a request with non-encodable data"
                );
                self.encoding_errors.push(err);
            }
        }
        self
    }

    pub fn will_respond_with(mut self, response: Response) -> Self {
        match response.compile(self.max_depth) {
            Ok(compiled) => self.response = Some(compiled),
            Err(err) => {
                warn!(
                    interaction = %self.description,
                    error = %err,
                    "can not prepare a response with non-encodable data"
                );
                self.encoding_errors.push(err);
            }
        }
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn request(&self) -> Option<&CompiledRequest> {
        self.request.as_ref()
    }

    pub fn response(&self) -> Option<&CompiledResponse> {
        self.response.as_ref()
    }

    /// Failures recorded while attaching the request or response.
    pub fn encoding_errors(&self) -> &[EncodingError] {
        &self.encoding_errors
    }
}
