//! Compiles matcher and generator annotated interaction trees into Pact
//! contract documents.
//!
//! An interaction element (a request or response body, the request path, its
//! query parameters or headers) is authored as a [`Node`] tree. Matchers and
//! generators wrap example values. Compiling an element walks the tree once
//! and yields the plain example value together with the matching rules and
//! generators keyed by the location they apply to.
//!
//! # Example
//!
//! ```no_run
//! use pact_builder::{matchers, HttpMethod, Interaction, Node, Pact, Request, Response};
//!
//! let pact = Pact::new("ios-app", "user-service").with_interaction(
//!     Interaction::new("a request for a user")
//!         .given("user 1 exists")
//!         .with_request(Request::new(HttpMethod::Get, "/users/1"))
//!         .will_respond_with(Response::new(200).body(Node::mapping([
//!             ("id", matchers::integer(1)),
//!             ("name", matchers::like("Joe")),
//!             ("roles", matchers::each_like("admin")),
//!         ]))),
//! );
//!
//! match pact.document() {
//!     Ok(document) => println!("{}", serde_json::to_string_pretty(&document).unwrap()),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod adapter;
pub mod classify;
pub mod config;
pub mod contribution;
pub mod encoder;
pub mod error;
pub mod generators;
pub mod interaction;
pub mod matchers;
pub mod merge;
pub mod node;
pub mod pact;
pub mod path;
pub mod processor;
pub mod rules;
pub mod services;

pub use adapter::from_integration_json;
pub use config::PactConfig;
pub use encoder::{encode, Declarations, EncodedElement, InteractionElement};
pub use error::{EncodingError, FailureReason, InteractionFailure, PactError};
pub use generators::{GeneratorDeclaration, UuidFormat};
pub use interaction::{
    CompiledRequest, CompiledResponse, HttpMethod, Interaction, ProviderState, Request, Response,
};
pub use node::{Node, Scalar};
pub use pact::{Pact, PactDocument};
pub use path::Path;
pub use processor::{Compiled, Processor, DEFAULT_MAX_DEPTH};
pub use rules::{HttpStatus, MatchingRule, RuleLogic, RuleSet, StatusCodeRange};
pub use services::{
    ContractBroker, ContractWriter, ErrorReporter, JsonFileWriter, Mismatch, MockServer,
    TransferProtocol, VerificationFailure,
};
