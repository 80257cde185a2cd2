use serde_json::{json, Value};
use std::path::PathBuf;

use treescope::buffers::{EventBuffers, StateChangeQuery};
use treescope::engine::Engine;
use treescope::geometry::NoGeometry;
use treescope::host::fixture::load_tree;
use treescope::network::{Interception, MockSpec, OutboundRequest};
use treescope::protocol::{handle_line, NO_TREE};
use treescope_common::{MockResponse, StateChangeRecord};

fn call(engine: &mut Engine, line: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/screen.json");
    let tree = load_tree(path).expect("Failed to load screen fixture");
    let response = handle_line(engine, Some(&tree), &NoGeometry, line);
    serde_json::from_str(&response).expect("response is JSON")
}

#[test]
fn test_request_lines() {
    let mut engine = Engine::default();

    let response = call(&mut engine, r#"{"method":"tree.query","params":{"selector":"Pressable"},"id":1}"#);
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"].as_array().map(Vec::len), Some(2));

    let response = call(&mut engine, r#"{"method":"tree.inspect","params":{"uid":"feed"},"id":2}"#);
    assert_eq!(response["result"]["props"]["onScroll"], "[Function handleScroll]");

    let response = call(&mut engine, r#"{"method":"profiler.report","id":3}"#);
    assert_eq!(response["result"]["totalRenders"], 0);
}

#[test]
fn test_requests_without_tree() {
    let mut engine = Engine::default();
    let line = r#"{"method":"tree.snapshot","id":4}"#;
    let response: Value = serde_json::from_str(&handle_line(&mut engine, None, &NoGeometry, line)).unwrap();
    assert_eq!(response["error"]["code"], NO_TREE);

    // Buffer and mock methods never need a tree
    let line = r#"{"method":"network.list","id":5}"#;
    let response: Value = serde_json::from_str(&handle_line(&mut engine, None, &NoGeometry, line)).unwrap();
    assert_eq!(response["result"], json!([]));
}

#[test]
fn test_state_change_buffer_evicts_oldest() {
    let mut buffers = EventBuffers::default();
    for i in 0..310 {
        buffers.push_state_change(StateChangeRecord {
            id: 0,
            timestamp: f64::from(i),
            component: "Counter".to_string(),
            hook_index: 0,
            prev: Some(json!(i)),
            next: Some(json!(i + 1)),
        });
    }

    assert_eq!(buffers.state_changes.len(), 300);
    let ids: Vec<u64> = buffers.state_changes.iter().map(|r| r.id).collect();
    assert_eq!(ids.first(), Some(&11));
    assert_eq!(ids.last(), Some(&310));

    let recent = buffers.state_changes(&StateChangeQuery { limit: Some(3), ..Default::default() });
    let recent_ids: Vec<u64> = recent.iter().map(|r| r.id).collect();
    assert_eq!(recent_ids, vec![308, 309, 310]);
}

#[test]
fn test_first_enabled_mock_wins_and_is_recorded() {
    let mut engine = Engine::default();

    let mut broad = MockSpec::new("/api/");
    broad.response = MockResponse { status: 500, ..MockResponse::default() };
    broad.enabled = false;
    engine.mocks_mut().add(broad);

    let mut users = MockSpec::new(r"/api/users/\d+");
    users.is_regex = true;
    users.method = Some("GET".to_string());
    let users = engine.mocks_mut().add(users);

    let mut fallback = MockSpec::new("/api/users");
    fallback.response = MockResponse { status: 404, ..MockResponse::default() };
    engine.mocks_mut().add(fallback);

    let answer = engine.intercept_request(&OutboundRequest::new("get", "https://x.test/api/users/42"));
    match answer {
        Interception::Respond { source, response } => {
            assert_eq!(source, users.id);
            assert_eq!(response.status, 200);
        }
        Interception::Proceed => panic!("expected a mocked response"),
    }

    let answer = engine.intercept_request(&OutboundRequest::new("POST", "https://x.test/api/users/42"));
    assert!(matches!(answer, Interception::Respond { response, .. } if response.status == 404));

    let answer = engine.intercept_request(&OutboundRequest::new("GET", "https://x.test/health"));
    assert_eq!(answer, Interception::Proceed);

    let listed = engine.mocks().list();
    let hits: Vec<u64> = listed.iter().map(|r| r.hit_count).collect();
    assert_eq!(hits, vec![0, 1, 1]);

    let network = call(&mut engine, r#"{"method":"network.list","id":6}"#);
    let entries = network["result"].as_array().expect("network entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["mocked"], true);
    assert_eq!(entries[0]["mockId"], "mock_2");
}
