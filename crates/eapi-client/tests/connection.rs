//! Connection behavior driven through a scripted transport binding.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use eapi_client::Connection;
use eapi_transport::{HttpRequest, HttpResponse, Transport, TransportError, TransportResult};

const SUCCESS: &str = r#"{
    "jsonrpc": "2.0",
    "result": [{"first": 1}, {"second": 2}, {"warnings": ["unconverted command"]}],
    "id": "1"
}"#;

const FAILURE: &str = r#"{
    "jsonrpc": "2.0",
    "error": {"code": 1002, "message": "CLI command failed", "data": [{}]},
    "id": "1"
}"#;

#[derive(Debug, Clone)]
enum Reply {
    Body(&'static str),
    FailConnect,
}

#[derive(Debug, Default)]
struct Calls {
    opened: usize,
    closed: usize,
    requests: Vec<HttpRequest>,
}

/// Transport double that serves a scripted reply per exchange and counts
/// open/close calls.
#[derive(Debug)]
struct ScriptedTransport {
    script: VecDeque<Reply>,
    current: Option<Reply>,
    calls: Arc<Mutex<Calls>>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn endpoint(&self) -> String {
        "stub://test".to_string()
    }

    async fn connect(&mut self) -> TransportResult<()> {
        self.calls.lock().unwrap().opened += 1;
        let reply = self.script.pop_front().expect("script exhausted");
        match reply {
            Reply::FailConnect => Err(TransportError::ConnectionFailed("refused".to_string())),
            other => {
                self.current = Some(other);
                Ok(())
            }
        }
    }

    async fn send(&mut self, request: &HttpRequest) -> TransportResult<()> {
        self.calls.lock().unwrap().requests.push(request.clone());
        Ok(())
    }

    async fn receive(&mut self) -> TransportResult<HttpResponse> {
        let Some(Reply::Body(body)) = self.current.take() else {
            return Err(TransportError::NotConnected);
        };
        Ok(HttpResponse {
            status: 200,
            reason: "OK".to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Bytes::from_static(body.as_bytes()),
        })
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        self.calls.lock().unwrap().closed += 1;
        Ok(())
    }
}

fn scripted(replies: Vec<Reply>) -> (Connection, Arc<Mutex<Calls>>) {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let transport = ScriptedTransport {
        script: replies.into(),
        current: None,
        calls: Arc::clone(&calls),
    };
    (Connection::new(Box::new(transport)), calls)
}

#[tokio::test]
async fn success_returns_all_results_in_order() {
    let (mut connection, calls) = scripted(vec![Reply::Body(SUCCESS)]);
    let response = connection
        .execute(["show version", "show hostname"], "json")
        .await
        .unwrap();

    let result = response.result.as_ref().expect("success envelope has results");
    assert_eq!(result.len(), 3);
    assert_eq!(result[0]["first"], 1);
    assert_eq!(result[1]["second"], 2);
    assert_eq!(response.warnings().unwrap().len(), 1);

    assert!(connection.last_error().is_none());
    let calls = calls.lock().unwrap();
    assert_eq!(calls.opened, 1);
    assert_eq!(calls.closed, 1);
}

#[tokio::test]
async fn failure_envelope_classifies_as_command_error() {
    let (mut connection, calls) = scripted(vec![Reply::Body(FAILURE)]);
    let error = connection
        .execute(["show version", "bogus command"], "json")
        .await
        .unwrap_err();

    let command = error.as_command().expect("command error");
    assert_eq!(command.code, 1002);
    assert_eq!(command.text, "CLI command failed");
    assert!(error.to_string().contains("1002"));
    assert!(error.to_string().contains("CLI command failed"));
    assert_eq!(
        error.commands(),
        Some(["show version".to_string(), "bogus command".to_string()].as_slice())
    );

    assert_eq!(connection.last_error(), Some(&error));
    let calls = calls.lock().unwrap();
    assert_eq!(calls.opened, 1);
    assert_eq!(calls.closed, 1);
}

#[tokio::test]
async fn connect_failure_classifies_as_connection_error() {
    let (mut connection, calls) = scripted(vec![Reply::FailConnect]);
    let error = connection.execute(["show version"], "json").await.unwrap_err();

    let connection_error = error.as_connection().expect("connection error");
    assert_eq!(connection_error.connection_type, "stub://test");
    assert_eq!(error.to_string(), "unable to connect to eAPI");
    assert_eq!(error.commands(), Some(["show version".to_string()].as_slice()));
    assert!(connection_error.detail.as_deref().unwrap().contains("refused"));

    assert_eq!(connection.last_error(), Some(&error));
    // The binding is released even when it never opened a stream.
    let calls = calls.lock().unwrap();
    assert_eq!(calls.opened, 1);
    assert_eq!(calls.closed, 1);
}

#[tokio::test]
async fn undecodable_body_classifies_as_connection_error() {
    let (mut connection, calls) = scripted(vec![Reply::Body("<html>401 Unauthorized</html>")]);
    let error = connection.execute(["show version"], "json").await.unwrap_err();

    let connection_error = error.as_connection().expect("connection error");
    assert_eq!(error.to_string(), "unable to connect to eAPI");
    assert!(connection_error.detail.as_deref().unwrap().contains("malformed"));

    let calls = calls.lock().unwrap();
    assert_eq!(calls.opened, 1);
    assert_eq!(calls.closed, 1);
}

#[tokio::test]
async fn invalid_encoding_is_rejected_before_any_io() {
    let (mut connection, calls) = scripted(vec![Reply::Body(FAILURE)]);

    // Seed the last-error slot with a real wire failure first.
    let seeded = connection.execute(["show version"], "json").await.unwrap_err();
    assert!(seeded.as_command().is_some());

    let error = connection.execute(["show version"], "xml").await.unwrap_err();
    assert_eq!(
        error.to_string(),
        "encoding must be one of [json, text], got 'xml'"
    );
    assert_eq!(error.commands(), None);

    // No connection attempt, and the slot still holds the earlier failure.
    assert_eq!(connection.last_error(), Some(&seeded));
    let calls = calls.lock().unwrap();
    assert_eq!(calls.opened, 1);
    assert_eq!(calls.closed, 1);
}

#[tokio::test]
async fn error_slot_resets_on_the_next_call() {
    let (mut connection, _calls) = scripted(vec![Reply::Body(FAILURE), Reply::Body(SUCCESS)]);

    assert!(connection.execute(["bogus"], "json").await.is_err());
    assert!(connection.last_error().is_some());

    connection.execute(["show version"], "json").await.unwrap();
    assert!(connection.last_error().is_none());
}

#[tokio::test]
async fn protocol_headers_are_always_present() {
    let (mut connection, calls) = scripted(vec![Reply::Body(SUCCESS)]);
    connection.execute(["show version"], "json").await.unwrap();

    let calls = calls.lock().unwrap();
    let request = &calls.requests[0];
    assert_eq!(
        request.header_value("content-type"),
        Some("application/json-rpc")
    );
    let declared: usize = request.header_value("content-length").unwrap().parse().unwrap();
    assert_eq!(declared, request.body.len());
    assert_eq!(request.header_value("authorization"), None);
}

#[tokio::test]
async fn authorization_header_follows_authentication() {
    let (mut connection, calls) = scripted(vec![Reply::Body(SUCCESS), Reply::Body(SUCCESS)]);
    connection.authenticate("admin", "x");

    connection.execute(["show version"], "json").await.unwrap();
    connection.execute(["show hostname"], "json").await.unwrap();

    let calls = calls.lock().unwrap();
    for request in &calls.requests {
        assert_eq!(
            request.header_value("authorization"),
            Some("Basic YWRtaW46eA==")
        );
    }
}

#[tokio::test]
async fn text_encoding_is_accepted() {
    let (mut connection, calls) = scripted(vec![Reply::Body(SUCCESS)]);
    connection.execute(["show version"], "text").await.unwrap();

    let calls = calls.lock().unwrap();
    let body = String::from_utf8(calls.requests[0].body.to_vec()).unwrap();
    assert!(body.contains(r#""format":"text""#));
    assert!(body.contains(r#""method":"runCmds""#));
}

#[tokio::test]
async fn send_surfaces_the_full_envelope() {
    let (mut connection, _calls) = scripted(vec![Reply::Body(SUCCESS)]);
    let request = connection.build_request(
        &["show version".to_string()],
        "json".parse().unwrap(),
        Some("req-1"),
    );
    let response = connection.send(&request).await.unwrap();
    assert_eq!(response.jsonrpc, "2.0");
    assert!(response.is_success());
    assert_eq!(response.id, Some(serde_json::json!("1")));
}
