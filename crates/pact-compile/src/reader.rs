//! Reads integration JSON contract descriptions into a [`Pact`].
//!
//! Structural problems and encoding failures are recorded as issues; an
//! interaction that fails does not stop its siblings from being read.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use pact_builder::{
    encode, from_integration_json, EncodingError, FailureReason, HttpMethod, Interaction,
    InteractionElement, Node, Pact, ProviderState, Request, Response,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{CompileIssue, CompileOptions, CompileReport};

const METHODS: &str = "GET, HEAD, POST, PUT, PATCH, DELETE, TRACE, CONNECT, OPTIONS";

/// Read a contract description. Returns `None` when the description is too
/// broken to name a consumer and provider.
pub fn read_contract(
    file: &Path,
    contract: &Value,
    report: &mut CompileReport,
    options: &CompileOptions,
) -> Option<Pact> {
    let Some(root) = contract.as_object() else {
        report.add_issue(
            CompileIssue::error("E003", "Contract must be a JSON object", file.to_path_buf())
                .with_suggestion("Wrap the contract in {\"consumer\", \"provider\", \"interactions\"}"),
        );
        return None;
    };

    let consumer = pacticipant(file, root, "consumer", report);
    let provider = pacticipant(file, root, "provider", report);

    let interactions: &[Value] = match root.get("interactions") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => {
            report.add_issue(
                CompileIssue::error("E004", "\"interactions\" must be an array", file.to_path_buf())
                    .with_location("interactions"),
            );
            &[]
        }
        None => {
            report.add_issue(
                CompileIssue::error(
                    "E004",
                    "Missing required field: interactions",
                    file.to_path_buf(),
                )
                .with_suggestion("Add \"interactions\": [...] to the contract"),
            );
            &[]
        }
    };

    let (consumer, provider) = (consumer?, provider?);
    let mut pact = Pact::new(consumer, provider);

    if interactions.is_empty() && root.get("interactions").is_some_and(Value::is_array) {
        report.add_issue(
            CompileIssue::warning("W001", "Contract declares no interactions", file.to_path_buf())
                .with_location("interactions"),
        );
    }

    let mut descriptions = HashSet::new();
    for (idx, item) in interactions.iter().enumerate() {
        let location = format!("interactions[{idx}]");
        if let Some(interaction) = read_interaction(file, item, &location, report, options) {
            if !descriptions.insert(interaction.description().to_string()) {
                report.add_issue(
                    CompileIssue::warning(
                        "W002",
                        format!("Duplicate interaction description: {}", interaction.description()),
                        file.to_path_buf(),
                    )
                    .with_location(format!("{location}.description"))
                    .with_suggestion("Give every interaction a unique description"),
                );
            }
            pact.push(interaction);
        }
    }

    debug!(
        file = %file.display(),
        interactions = pact.interactions().len(),
        "read contract description"
    );
    Some(pact)
}

/// `"name"` or `{"name": "..."}`.
fn pacticipant(
    file: &Path,
    root: &Map<String, Value>,
    field: &str,
    report: &mut CompileReport,
) -> Option<String> {
    let name = match root.get(field) {
        Some(Value::String(name)) => Some(name.as_str()),
        Some(Value::Object(named)) => named.get("name").and_then(Value::as_str),
        _ => None,
    };
    match name {
        Some(name) if !name.trim().is_empty() => Some(name.to_string()),
        _ => {
            report.add_issue(
                CompileIssue::error(
                    "E004",
                    format!("Missing or invalid {field} name"),
                    file.to_path_buf(),
                )
                .with_location(field)
                .with_suggestion(format!("Add \"{field}\": {{\"name\": \"...\"}}")),
            );
            None
        }
    }
}

fn read_interaction(
    file: &Path,
    item: &Value,
    location: &str,
    report: &mut CompileReport,
    options: &CompileOptions,
) -> Option<Interaction> {
    let Some(fields) = item.as_object() else {
        report.add_issue(
            CompileIssue::error("E005", "Interaction must be a JSON object", file.to_path_buf())
                .with_location(location),
        );
        return None;
    };

    let Some(description) = fields.get("description").and_then(Value::as_str) else {
        report.add_issue(
            CompileIssue::error(
                "E005",
                "Missing required field: description",
                file.to_path_buf(),
            )
            .with_location(location),
        );
        return None;
    };

    let request = read_request(file, fields.get("request"), location, report);
    let response = read_response(file, fields.get("response"), location, report);
    let states = read_provider_states(file, fields.get("providerStates"), location, report);
    let (Some(request), Some(response), Some(states)) = (request, response, states) else {
        return None;
    };

    let mut interaction = Interaction::new(description).with_max_depth(options.max_depth);
    if let Some(state) = fields.get("providerState").and_then(Value::as_str) {
        interaction = interaction.given(state);
    }
    if !states.is_empty() {
        interaction = interaction.given_states(states);
    }

    let before = interaction.encoding_errors().len();
    interaction = interaction.with_request(request.clone());
    if let Some(error) = interaction.encoding_errors().get(before) {
        let element = failing_element(&request.elements(), options.max_depth);
        report_encoding_error(file, &format!("{location}.request"), element, error, report);
    }

    let before = interaction.encoding_errors().len();
    interaction = interaction.will_respond_with(response.clone());
    if let Some(error) = interaction.encoding_errors().get(before) {
        let element = failing_element(&response.elements(), options.max_depth);
        report_encoding_error(file, &format!("{location}.response"), element, error, report);
    }

    if interaction.encoding_errors().is_empty() {
        report.interactions_compiled += 1;
    }
    Some(interaction)
}

fn read_provider_states(
    file: &Path,
    states: Option<&Value>,
    location: &str,
    report: &mut CompileReport,
) -> Option<Vec<ProviderState>> {
    let Some(states) = states else {
        return Some(Vec::new());
    };
    let invalid = |report: &mut CompileReport| {
        report.add_issue(
            CompileIssue::error(
                "E006",
                "\"providerStates\" must be a list of {\"name\", \"params\"} objects",
                file.to_path_buf(),
            )
            .with_location(format!("{location}.providerStates")),
        );
    };
    let Some(items) = states.as_array() else {
        invalid(report);
        return None;
    };

    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        let Some(name) = item.get("name").and_then(Value::as_str) else {
            invalid(report);
            return None;
        };
        let mut state = ProviderState::new(name);
        if let Some(params) = item.get("params").and_then(Value::as_object) {
            for (key, value) in params {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                state = state.with_param(key.clone(), value);
            }
        }
        parsed.push(state);
    }
    Some(parsed)
}

fn read_request(
    file: &Path,
    request: Option<&Value>,
    location: &str,
    report: &mut CompileReport,
) -> Option<Request> {
    let location = format!("{location}.request");
    let fields = required_object(file, request, &location, report)?;

    let method = match fields.get("method").and_then(Value::as_str) {
        Some(method) => match method.parse::<HttpMethod>() {
            Ok(method) => method,
            Err(message) => {
                report.add_issue(
                    CompileIssue::error("E007", message, file.to_path_buf())
                        .with_location(format!("{location}.method"))
                        .with_suggestion(format!("Use one of {METHODS}")),
                );
                return None;
            }
        },
        None => {
            report.add_issue(
                CompileIssue::error("E005", "Missing required field: method", file.to_path_buf())
                    .with_location(&location),
            );
            return None;
        }
    };

    let Some(path) = fields.get("path") else {
        report.add_issue(
            CompileIssue::error("E005", "Missing required field: path", file.to_path_buf())
                .with_location(&location),
        );
        return None;
    };

    let mut request = Request::new(method, from_integration_json(path));
    for (name, values) in read_query(file, fields.get("query"), &location, report)? {
        request = request.query(name, values);
    }
    for (name, value) in read_headers(file, fields.get("headers"), &location, report)? {
        request = request.header(name, value);
    }
    if let Some(body) = fields.get("body") {
        request = request.body(from_integration_json(body));
    }
    Some(request)
}

fn read_response(
    file: &Path,
    response: Option<&Value>,
    location: &str,
    report: &mut CompileReport,
) -> Option<Response> {
    let location = format!("{location}.response");
    let fields = required_object(file, response, &location, report)?;

    let status = match fields.get("status") {
        Some(status) => match status.as_u64().filter(|s| (100..=599).contains(s)) {
            Some(status) => status as u16,
            None => {
                report.add_issue(
                    CompileIssue::error(
                        "E008",
                        format!("Invalid status code: {status}"),
                        file.to_path_buf(),
                    )
                    .with_location(format!("{location}.status"))
                    .with_suggestion("Use an HTTP status code between 100 and 599"),
                );
                return None;
            }
        },
        None => {
            report.add_issue(
                CompileIssue::error("E005", "Missing required field: status", file.to_path_buf())
                    .with_location(&location),
            );
            return None;
        }
    };

    let mut response = Response::new(status);
    for (name, value) in read_headers(file, fields.get("headers"), &location, report)? {
        response = response.header(name, value);
    }
    if let Some(body) = fields.get("body") {
        response = response.body(from_integration_json(body));
    }
    Some(response)
}

fn required_object<'a>(
    file: &Path,
    value: Option<&'a Value>,
    location: &str,
    report: &mut CompileReport,
) -> Option<&'a Map<String, Value>> {
    match value {
        Some(Value::Object(fields)) => Some(fields),
        Some(_) => {
            report.add_issue(
                CompileIssue::error("E005", "Expected a JSON object", file.to_path_buf())
                    .with_location(location),
            );
            None
        }
        None => {
            report.add_issue(
                CompileIssue::error(
                    "E005",
                    format!("Missing required field: {}", last_segment(location)),
                    file.to_path_buf(),
                )
                .with_location(location),
            );
            None
        }
    }
}

fn last_segment(location: &str) -> &str {
    location.rsplit('.').next().unwrap_or(location)
}

/// Query parameters map a name to a single value or a list of values.
fn read_query(
    file: &Path,
    query: Option<&Value>,
    location: &str,
    report: &mut CompileReport,
) -> Option<BTreeMap<String, Vec<Node>>> {
    let Some(query) = query else {
        return Some(BTreeMap::new());
    };
    let Some(params) = query.as_object() else {
        report.add_issue(
            CompileIssue::error(
                "E009",
                "\"query\" must be an object of parameter names",
                file.to_path_buf(),
            )
            .with_location(format!("{location}.query"))
            .with_suggestion("Use {\"name\": \"value\"} or {\"name\": [\"a\", \"b\"]}"),
        );
        return None;
    };
    Some(
        params
            .iter()
            .map(|(name, value)| {
                let values = match value {
                    Value::Array(items) => items.iter().map(from_integration_json).collect(),
                    single => vec![from_integration_json(single)],
                };
                (name.clone(), values)
            })
            .collect(),
    )
}

fn read_headers(
    file: &Path,
    headers: Option<&Value>,
    location: &str,
    report: &mut CompileReport,
) -> Option<BTreeMap<String, Node>> {
    let Some(headers) = headers else {
        return Some(BTreeMap::new());
    };
    let Some(headers) = headers.as_object() else {
        report.add_issue(
            CompileIssue::error("E009", "\"headers\" must be an object", file.to_path_buf())
                .with_location(format!("{location}.headers")),
        );
        return None;
    };
    Some(
        headers
            .iter()
            .map(|(name, value)| (name.clone(), from_integration_json(value)))
            .collect(),
    )
}

/// The first element that fails to compile, in compilation order.
fn failing_element(
    elements: &[(InteractionElement, Node)],
    max_depth: usize,
) -> Option<InteractionElement> {
    elements
        .iter()
        .find(|(element, node)| encode(node, *element, max_depth).is_err())
        .map(|(element, _)| *element)
}

fn field_name(element: InteractionElement) -> &'static str {
    match element {
        InteractionElement::Body => "body",
        InteractionElement::Query => "query",
        InteractionElement::Header => "headers",
        InteractionElement::Path => "path",
    }
}

/// `interactions[0].request.body.users[*].*.id` for `$.users[*].*.id`.
fn error_location(part: &str, element: Option<InteractionElement>, error: &EncodingError) -> String {
    let Some(element) = element else {
        return part.to_string();
    };
    let path = error.path.as_str();
    let suffix = match element {
        InteractionElement::Body => path.strip_prefix('$').unwrap_or(path).to_string(),
        _ if path.is_empty() => String::new(),
        _ => format!(".{path}"),
    };
    format!("{part}.{}{suffix}", field_name(element))
}

fn report_encoding_error(
    file: &Path,
    part: &str,
    element: Option<InteractionElement>,
    error: &EncodingError,
    report: &mut CompileReport,
) {
    let (code, suggestion) = match &error.reason {
        FailureReason::NotEncodable => (
            "E010",
            "Use a supported value or a known pact:matcher:type / pact:generator:type",
        ),
        FailureReason::PatternMismatch { .. } => {
            ("E011", "Change the example so it matches its own regex")
        }
        FailureReason::InvalidPattern { .. } => (
            "E011",
            "Fix the regex; mock server URL regexes need exactly one capture group",
        ),
        FailureReason::NestedMatcher => (
            "E012",
            "Put the inner matcher's example directly in the outer matcher",
        ),
        FailureReason::PathCollision => ("E013", "Remove the duplicated key"),
        FailureReason::DepthExceeded { .. } => (
            "E014",
            "Flatten the structure or raise the nesting limit with --max-depth",
        ),
        FailureReason::InvalidParameter { .. } => {
            ("E015", "Check the matcher or generator parameters")
        }
    };
    report.add_issue(
        CompileIssue::error(
            code,
            format!("{}: '{}'", error.reason, error.value),
            file.to_path_buf(),
        )
        .with_location(error_location(part, element, error))
        .with_suggestion(suggestion),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use serde_json::json;

    fn read(contract: Value) -> (Option<Pact>, CompileReport) {
        let mut report = CompileReport::new();
        let pact = read_contract(
            Path::new("test.json"),
            &contract,
            &mut report,
            &CompileOptions::default(),
        );
        (pact, report)
    }

    fn codes(report: &CompileReport) -> Vec<&str> {
        report.issues.iter().map(|i| i.code.as_str()).collect()
    }

    fn contract(interactions: Value) -> Value {
        json!({
            "consumer": {"name": "app"},
            "provider": {"name": "api"},
            "interactions": interactions
        })
    }

    #[test]
    fn test_reads_valid_contract() {
        let (pact, report) = read(contract(json!([{
            "description": "a request for users",
            "providerState": "users exist",
            "request": {
                "method": "get",
                "path": "/users",
                "query": {"page": "1", "tag": ["a", "b"]},
                "headers": {"Accept": "application/json"}
            },
            "response": {
                "status": 200,
                "body": {"id": {"pact:matcher:type": "integer", "value": 1}}
            }
        }])));

        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert_eq!(report.interactions_compiled, 1);
        let pact = pact.unwrap();
        let document = pact.document().unwrap();
        let request = serde_json::to_value(&document.interactions[0]).unwrap();
        assert_eq!(request["request"]["method"], "GET");
        assert_eq!(request["request"]["query"]["tag"], json!(["a", "b"]));
        assert_eq!(request["providerState"], "users exist");
    }

    #[test]
    fn test_accepts_plain_string_pacticipants() {
        let (pact, report) = read(json!({"consumer": "app", "provider": "api", "interactions": []}));
        assert_eq!(pact.unwrap().consumer(), "app");
        assert_eq!(codes(&report), vec!["W001"]);
    }

    #[test]
    fn test_missing_top_level_fields() {
        let (pact, report) = read(json!({"consumer": {"name": "app"}}));
        assert!(pact.is_none());
        assert_eq!(codes(&report), vec!["E004", "E004"]);

        let (pact, report) = read(json!([1, 2]));
        assert!(pact.is_none());
        assert_eq!(codes(&report), vec!["E003"]);
    }

    #[test]
    fn test_bad_method_and_status() {
        let (_, report) = read(contract(json!([
            {"description": "a", "request": {"method": "FETCH", "path": "/"}, "response": {"status": 200}},
            {"description": "b", "request": {"method": "GET", "path": "/"}, "response": {"status": 42}}
        ])));
        assert_eq!(codes(&report), vec!["E007", "E008"]);
        assert_eq!(report.issues[0].location.as_deref(), Some("interactions[0].request.method"));
        assert_eq!(report.issues[1].location.as_deref(), Some("interactions[1].response.status"));
    }

    #[test]
    fn test_encoding_failure_location_includes_path() {
        let (pact, report) = read(contract(json!([{
            "description": "a",
            "request": {"method": "POST", "path": "/items", "body": {
                "items": {"pact:matcher:type": "eachLike", "value": [{"at": {"pact:matcher:type": "fuzzy", "value": 1}}]}
            }},
            "response": {"status": 201}
        }])));

        assert_eq!(codes(&report), vec!["E010"]);
        assert_eq!(
            report.issues[0].location.as_deref(),
            Some("interactions[0].request.body.items[*].at")
        );
        assert_eq!(report.interactions_compiled, 0);
        assert!(pact.unwrap().document().is_err());
    }

    #[test]
    fn test_header_failure_is_attributed_to_headers() {
        let (_, report) = read(contract(json!([{
            "description": "a",
            "request": {"method": "GET", "path": "/"},
            "response": {"status": 200, "headers": {
                "X-Id": {"pact:matcher:type": "regex", "regex": "^\\d+$", "value": "abc"}
            }}
        }])));
        assert_eq!(codes(&report), vec!["E011"]);
        assert_eq!(
            report.issues[0].location.as_deref(),
            Some("interactions[0].response.headers.X-Id")
        );
    }

    #[test]
    fn test_failures_do_not_stop_siblings() {
        let (pact, report) = read(contract(json!([
            {"description": "bad", "request": {"method": "GET", "path": {"pact:matcher:type": "nope", "value": "/"}}, "response": {"status": 200}},
            {"description": "good", "request": {"method": "GET", "path": "/"}, "response": {"status": 200}}
        ])));
        assert_eq!(report.errors, 1);
        assert_eq!(report.interactions_compiled, 1);
        assert_eq!(pact.unwrap().interactions().len(), 2);
        assert_eq!(report.issues[0].location.as_deref(), Some("interactions[0].request.path"));
    }

    #[test]
    fn test_duplicate_descriptions_warn() {
        let item = json!({"description": "same", "request": {"method": "GET", "path": "/"}, "response": {"status": 200}});
        let (_, report) = read(contract(json!([item.clone(), item])));
        assert_eq!(codes(&report), vec!["W002"]);
        assert_eq!(report.issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_provider_states_with_params() {
        let (pact, report) = read(contract(json!([{
            "description": "a",
            "providerStates": [{"name": "user exists", "params": {"id": 7, "name": "Joe"}}],
            "request": {"method": "GET", "path": "/"},
            "response": {"status": 200}
        }])));
        assert!(report.issues.is_empty());
        let document = pact.unwrap().document().unwrap();
        let value = serde_json::to_value(&document.interactions[0]).unwrap();
        assert_eq!(
            value["providerStates"],
            json!([{"name": "user exists", "params": {"id": "7", "name": "Joe"}}])
        );

        let (_, report) = read(contract(json!([{
            "description": "a",
            "providerStates": "user exists",
            "request": {"method": "GET", "path": "/"},
            "response": {"status": 200}
        }])));
        assert_eq!(codes(&report), vec!["E006"]);
    }
}
