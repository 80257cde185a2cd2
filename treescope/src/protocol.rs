//! JSON request boundary.
//!
//! JSON-RPC 2.0 style messages, one JSON object per line. Every engine
//! operation that a remote client may call is reachable through
//! [`dispatch`]; arguments and results are plain JSON, never live nodes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::buffers::{BufferKind, ConsoleQuery, NetworkQuery, RenderQuery, StateChangeQuery};
use crate::engine::Engine;
use crate::geometry::GeometryBackend;
use crate::host::HostTree;
use crate::network::MockSpec;
use crate::tracking::ProfileOptions;

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
/// No tree has been committed yet
pub const NO_TREE: i32 = -32000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
}

impl Response {
    #[must_use]
    pub fn ok(id: u64, result: Value) -> Self {
        Self { result: Some(result), error: None, id }
    }

    pub fn err(id: u64, code: i32, message: impl Into<String>) -> Self {
        Self { result: None, error: Some(ErrorObject { code, message: message.into() }), id }
    }
}

#[derive(Deserialize)]
struct QueryParams {
    selector: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SnapshotParams {
    depth: Option<usize>,
}

#[derive(Deserialize)]
struct UidParams {
    uid: String,
}

#[derive(Deserialize)]
struct MockIdParams {
    id: String,
}

#[derive(Deserialize)]
struct SetEnabledParams {
    id: String,
    enabled: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ClearParams {
    kind: Option<BufferKind>,
}

/// Parameters that may be omitted entirely.
fn optional_params<T: DeserializeOwned + Default>(request: &Request) -> Result<T, Response> {
    match &request.params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| Response::err(request.id, INVALID_PARAMS, format!("Invalid params: {e}"))),
    }
}

fn required_params<T: DeserializeOwned>(request: &Request) -> Result<T, Response> {
    let value = request
        .params
        .clone()
        .ok_or_else(|| Response::err(request.id, INVALID_PARAMS, "Missing params"))?;
    serde_json::from_value(value)
        .map_err(|e| Response::err(request.id, INVALID_PARAMS, format!("Invalid params: {e}")))
}

fn respond<T: Serialize>(id: u64, result: &T) -> Response {
    match serde_json::to_value(result) {
        Ok(value) => Response::ok(id, value),
        Err(e) => Response::err(id, INTERNAL_ERROR, format!("Failed to encode result: {e}")),
    }
}

fn with_tree<'t>(request: &Request, tree: Option<&'t HostTree>) -> Result<&'t HostTree, Response> {
    tree.ok_or_else(|| Response::err(request.id, NO_TREE, "No tree available"))
}

/// Execute one request against the engine and the latest committed tree.
pub fn dispatch(
    engine: &mut Engine,
    tree: Option<&HostTree>,
    geometry: &dyn GeometryBackend,
    request: &Request,
) -> Response {
    match handle(engine, tree, geometry, request) {
        Ok(response) | Err(response) => response,
    }
}

fn handle(
    engine: &mut Engine,
    tree: Option<&HostTree>,
    geometry: &dyn GeometryBackend,
    request: &Request,
) -> Result<Response, Response> {
    let id = request.id;
    let response = match request.method.as_str() {
        "tree.query" => {
            let params: QueryParams = required_params(request)?;
            respond(id, &engine.query_selector(with_tree(request, tree)?, geometry, &params.selector))
        }
        "tree.snapshot" => {
            let params: SnapshotParams = optional_params(request)?;
            let depth = params.depth.unwrap_or(engine.config().max_traversal_depth);
            respond(id, &engine.snapshot(with_tree(request, tree)?, geometry, depth))
        }
        "tree.inspect" => {
            let params: UidParams = required_params(request)?;
            respond(id, &engine.inspect(with_tree(request, tree)?, geometry, &params.uid))
        }
        "console.list" => respond(id, &engine.console(&optional_params::<ConsoleQuery>(request)?)),
        "network.list" => respond(id, &engine.network(&optional_params::<NetworkQuery>(request)?)),
        "state.list" => {
            respond(id, &engine.state_changes(&optional_params::<StateChangeQuery>(request)?))
        }
        "render.list" => respond(id, &engine.renders(&optional_params::<RenderQuery>(request)?)),
        "profiler.start" => {
            let options: ProfileOptions = optional_params(request)?;
            engine.start_profiling(&options);
            Response::ok(id, json!({ "profiling": true }))
        }
        "profiler.stop" => respond(id, &engine.stop_profiling()),
        "profiler.report" => respond(id, &engine.render_report()),
        "mocks.add" => {
            let spec: MockSpec = required_params(request)?;
            respond(id, &engine.mocks_mut().add(spec))
        }
        "mocks.remove" => {
            let params: MockIdParams = required_params(request)?;
            Response::ok(id, json!({ "removed": engine.mocks_mut().remove(&params.id) }))
        }
        "mocks.clear" => {
            engine.mocks_mut().clear();
            Response::ok(id, json!({ "cleared": true }))
        }
        "mocks.list" => respond(id, &engine.mocks().list()),
        "mocks.setEnabled" => {
            let params: SetEnabledParams = required_params(request)?;
            let found = engine.mocks_mut().set_enabled(&params.id, params.enabled);
            Response::ok(id, json!({ "updated": found }))
        }
        "buffers.clear" => {
            let params: ClearParams = optional_params(request)?;
            match params.kind {
                Some(kind) => engine.clear_buffer(kind),
                None => engine.clear_buffers(),
            }
            Response::ok(id, json!({ "cleared": true }))
        }
        other => Response::err(id, METHOD_NOT_FOUND, format!("Unknown method: {other}")),
    };
    Ok(response)
}

/// Handle one newline-delimited request and return the encoded response line.
pub fn handle_line(
    engine: &mut Engine,
    tree: Option<&HostTree>,
    geometry: &dyn GeometryBackend,
    line: &str,
) -> String {
    let response = match serde_json::from_str::<Request>(line) {
        Ok(request) => dispatch(engine, tree, geometry, &request),
        Err(e) => Response::err(0, PARSE_ERROR, format!("Parse error: {e}")),
    };
    serde_json::to_string(&response).unwrap_or_else(|e| {
        format!(r#"{{"error":{{"code":{INTERNAL_ERROR},"message":"{e}"}},"id":{}}}"#, response.id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::NoGeometry;
    use crate::host::{HostValue, Node, NodeKind};

    fn request(method: &str, params: Option<Value>) -> Request {
        Request { method: method.to_string(), params, id: 7 }
    }

    fn tree() -> HostTree {
        let mut tree = HostTree::new();
        let root = tree.add_root(Node::new(NodeKind::Root, "Root"));
        tree.add_child(
            root,
            Node::function("Pressable")
                .with_prop("testID", "x")
                .with_prop("onPress", HostValue::function("go")),
        );
        tree
    }

    #[test]
    fn test_query_returns_records() {
        let mut engine = Engine::default();
        let tree = tree();
        let req = request("tree.query", Some(json!({ "selector": "Pressable:has-press" })));
        let response = dispatch(&mut engine, Some(&tree), &NoGeometry, &req);
        assert_eq!(response.id, 7);
        let result = response.result.unwrap();
        assert_eq!(result[0]["uid"], "x");
        assert_eq!(result[0]["hasOnPress"], true);
    }

    #[test]
    fn test_error_codes() {
        let mut engine = Engine::default();
        let tree = tree();

        let response = dispatch(&mut engine, Some(&tree), &NoGeometry, &request("tree.drop", None));
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);

        let response = dispatch(&mut engine, Some(&tree), &NoGeometry, &request("tree.query", None));
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

        let req = request("tree.snapshot", None);
        let response = dispatch(&mut engine, None, &NoGeometry, &req);
        assert_eq!(response.error.unwrap().code, NO_TREE);

        let line = handle_line(&mut engine, Some(&tree), &NoGeometry, "{not json");
        let parsed: Response = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.error.unwrap().code, PARSE_ERROR);
    }

    #[test]
    fn test_mock_methods() {
        let mut engine = Engine::default();
        let add = request("mocks.add", Some(json!({ "urlPattern": "/users", "method": "GET" })));
        let response = dispatch(&mut engine, None, &NoGeometry, &add);
        assert_eq!(response.result.unwrap()["id"], "mock_1");

        let disable = request("mocks.setEnabled", Some(json!({ "id": "mock_1", "enabled": false })));
        dispatch(&mut engine, None, &NoGeometry, &disable);

        let list = dispatch(&mut engine, None, &NoGeometry, &request("mocks.list", None));
        assert_eq!(list.result.unwrap()[0]["enabled"], false);

        let remove = request("mocks.remove", Some(json!({ "id": "mock_1" })));
        let response = dispatch(&mut engine, None, &NoGeometry, &remove);
        assert_eq!(response.result.unwrap()["removed"], true);
    }

    #[test]
    fn test_buffer_methods() {
        let mut engine = Engine::default();
        engine.record_console(treescope_common::LogLevel::Error, "boom");

        let req = request("console.list", Some(json!({ "level": "error" })));
        let response = dispatch(&mut engine, None, &NoGeometry, &req);
        assert_eq!(response.result.unwrap()[0]["message"], "boom");

        let req = request("buffers.clear", Some(json!({ "kind": "console" })));
        dispatch(&mut engine, None, &NoGeometry, &req);
        let response = dispatch(&mut engine, None, &NoGeometry, &request("console.list", None));
        assert_eq!(response.result.unwrap(), json!([]));
    }
}
