//! End-to-end tests for the remote build client
//!
//! A local fake compile service answers `POST /api/build` so the real HTTP
//! client, resolver and coordinator run together.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hooks_build::BuildError;
use hooks_build::build::{BuildService, Coordinator, RemoteBuildClient, Scanner, assemble};
use serde_json::{Value, json};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const WASM_HEADER: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

#[derive(Debug, Clone)]
struct Recorded {
    request_line: String,
    content_type: Option<String>,
    body: Value,
}

struct FakeService {
    url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// Serve every connection with `respond(request_body) -> (status, body)`.
fn start_service<F>(respond: F) -> FakeService
where
    F: Fn(&Value) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);
    let respond = Arc::new(respond);

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let recorded = Arc::clone(&recorded);
            let respond = Arc::clone(&respond);
            thread::spawn(move || {
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();

                let mut content_length = 0usize;
                let mut content_type = None;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        let value = value.trim();
                        match name.to_ascii_lowercase().as_str() {
                            "content-length" => content_length = value.parse().unwrap(),
                            "content-type" => content_type = Some(value.to_string()),
                            _ => {}
                        }
                    }
                }

                let mut body = vec![0u8; content_length];
                reader.read_exact(&mut body).unwrap();
                let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

                let (status, response) = respond(&body);
                recorded.lock().unwrap().push(Recorded {
                    request_line: request_line.trim_end().to_string(),
                    content_type,
                    body,
                });

                let reply = format!(
                    "HTTP/1.1 {status} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response}",
                    response.len()
                );
                stream.write_all(reply.as_bytes()).unwrap();
                stream.flush().unwrap();
            });
        }
    });

    FakeService { url, requests }
}

fn unit_name(body: &Value) -> String {
    body["files"][0]["name"].as_str().unwrap_or_default().to_string()
}

/// Succeeds with the standard wasm header unless the unit name contains "broken".
fn compile_service() -> FakeService {
    start_service(|body| {
        let name = unit_name(body);
        let response = if name.contains("broken") {
            json!({
                "success": false,
                "message": "Build failed",
                "tasks": [
                    { "name": "clang", "console": format!("{name}:1:1: error: unknown type name"), "success": false },
                    { "name": "optimize", "console": "skipped", "success": true },
                    { "name": "wasm-ld", "console": "link aborted", "success": false }
                ]
            })
        } else {
            json!({
                "success": true,
                "message": "ok",
                "output": STANDARD.encode(WASM_HEADER),
                "tasks": [{ "name": "clang", "console": "", "success": true }]
            })
        };
        (200, response.to_string())
    })
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn client(url: &str) -> RemoteBuildClient {
    RemoteBuildClient::new(Some(url.to_string()), Some(Duration::from_secs(10)))
}

#[test]
fn test_request_contract() {
    let service = compile_service();
    let src = tempfile::tempdir().unwrap();
    let inc = tempfile::tempdir().unwrap();
    write(src.path(), "hook.c", "int64_t hook(uint32_t r) { return 0; }");
    write(inc.path(), "hookapi.h", "#define SBUF(x) x");

    let scanner = Scanner::default();
    let unit = scanner.load_unit(&src.path().join("hook.c")).unwrap();
    let headers = scanner.scan_headers(Some(inc.path())).unwrap();

    let result = client(&service.url).submit(&assemble(&unit, &headers)).unwrap();
    assert!(result.success);
    assert_eq!(result.tasks.len(), 1);

    let requests = service.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.request_line.starts_with("POST /api/build "));
    assert_eq!(request.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        request.body,
        json!({
            "output": "wasm",
            "compress": true,
            "strip": true,
            "files": [{
                "type": "c",
                "name": "hook.c",
                "options": "-O3",
                "src": "int64_t hook(uint32_t r) { return 0; }"
            }],
            "headers": [{ "type": "h", "name": "hookapi.h", "src": "#define SBUF(x) x" }]
        })
    );
}

#[test]
fn test_directory_build_isolates_failures() {
    let service = compile_service();
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    for name in ["alpha.c", "beta.c", "broken.c", "nested/gamma.c", "nested/delta.c"] {
        write(src.path(), name, "int x;");
    }
    write(src.path(), ".git/objects/skip.c", "never sent");

    let coordinator = Coordinator::new(Scanner::default(), client(&service.url));
    let report = coordinator.dispatch(src.path(), out.path(), None).unwrap();

    assert_eq!(report.len(), 5);
    assert_eq!(report.failed_count(), 1);
    for name in ["alpha", "beta", "gamma", "delta"] {
        let artifact = out.path().join(format!("{name}.wasm"));
        assert_eq!(fs::read(&artifact).unwrap(), WASM_HEADER, "{name}");
        assert!(!out.path().join(format!("{name}.log")).exists());
    }
    assert!(!out.path().join("broken.wasm").exists());
    assert_eq!(
        fs::read_to_string(out.path().join("broken.log")).unwrap(),
        "broken.c:1:1: error: unknown type name\nlink aborted"
    );

    let sent: Vec<String> = service
        .requests
        .lock()
        .unwrap()
        .iter()
        .map(|r| unit_name(&r.body))
        .collect();
    assert_eq!(sent.len(), 5);
    assert!(!sent.iter().any(|n| n == "skip.c"));

    match report.into_result() {
        Err(BuildError::BuildFailed {
            message,
            log,
            console,
        }) => {
            assert_eq!(message, "Build failed");
            assert_eq!(log, out.path().join("broken.log"));
            assert!(console.starts_with("broken.c:1:1: error: unknown type name"));
        }
        other => panic!("expected build failure, got {other:?}"),
    }
}

#[test]
fn test_success_without_output_writes_no_artifact() {
    let service = start_service(|_| {
        (
            200,
            json!({ "success": true, "message": "ok", "tasks": [] }).to_string(),
        )
    });
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(src.path(), "main.c", "int x;");

    let coordinator = Coordinator::new(Scanner::default(), client(&service.url));
    let err = coordinator
        .build_one(&src.path().join("main.c"), out.path(), None)
        .unwrap_err();
    assert!(matches!(err, BuildError::Transport(_)), "{err}");
    assert!(err.to_string().contains("success without output"));
    assert!(!out.path().join("main.wasm").exists());
}

#[test]
fn test_http_error_status_is_transport_error() {
    let service = start_service(|_| (500, "{\"error\":\"boom\"}".to_string()));
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(src.path(), "main.c", "int x;");

    let coordinator = Coordinator::new(Scanner::default(), client(&service.url));
    let err = coordinator
        .build_one(&src.path().join("main.c"), out.path(), None)
        .unwrap_err();
    assert!(matches!(err, BuildError::Transport(_)));
    assert!(err.to_string().contains("500"));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_malformed_body_is_transport_error() {
    let service = start_service(|_| (200, "{\"success\":true}".to_string()));
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(src.path(), "main.c", "int x;");

    let coordinator = Coordinator::new(Scanner::default(), client(&service.url));
    let err = coordinator
        .build_one(&src.path().join("main.c"), out.path(), None)
        .unwrap_err();
    assert!(matches!(err, BuildError::Transport(_)));
    assert!(!out.path().join("main.wasm").exists());
    assert!(!out.path().join("main.log").exists());
}

#[test]
fn test_connection_refused_is_transport_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let src = tempfile::tempdir().unwrap();
    write(src.path(), "main.c", "int x;");
    let unit = Scanner::default().load_unit(&src.path().join("main.c")).unwrap();

    let err = client(&format!("http://{addr}"))
        .submit(&assemble(&unit, &[]))
        .unwrap_err();
    assert!(matches!(err, BuildError::Transport(_)));
}
