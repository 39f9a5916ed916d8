use assert_cmd::Command;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Answer each incoming request with the next canned body, returning
/// "<request line> <body>" for every request served.
fn serve(replies: Vec<&'static str>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for body in replies {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0usize;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
                if let Some(value) = header.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();
            seen.push(format!(
                "{} {}",
                request_line.trim_end(),
                String::from_utf8(request_body).unwrap()
            ));
        }
        seen
    });
    (url, handle)
}

const STATUS: &str = r#"{"device_id":"cam-01","name":"rig","stream_fps":30,"enabled":false,"camera_endpoint":"rtsp://rig/cam","uptime_sec":3723}"#;

#[test]
fn prints_status_and_uptime() {
    let (url, server) = serve(vec![STATUS]);
    let assert = Command::cargo_bin("gaitlab")
        .unwrap()
        .args(["device", "--base-url", &url, "status"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("\"device_id\": \"cam-01\""));
    assert!(stdout.contains("uptime: 1h 2m 3s"));
    assert_eq!(server.join().unwrap(), vec!["GET /status HTTP/1.1 "]);
}

#[test]
fn start_trial_overrides_current_config() {
    let (url, server) = serve(vec![STATUS, "{}"]);
    let assert = Command::cargo_bin("gaitlab")
        .unwrap()
        .args([
            "device",
            "--base-url",
            &url,
            "start-trial",
            "--fps",
            "60",
            "--enabled",
            "true",
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("Trial started successfully!"));
    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].starts_with("POST /start_trial HTTP/1.1 "));
    let (_, body) = requests[1].split_once("HTTP/1.1 ").unwrap();
    let body: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(body["name"], "rig");
    assert_eq!(body["stream_fps"], 60);
    assert_eq!(body["enabled"], true);
    assert_eq!(body["camera_endpoint"], "rtsp://rig/cam");
}

#[test]
fn prints_log_lines() {
    let (url, server) = serve(vec![
        r#"[{"time":"12:00:01","level":"INFO","msg":"stream up"},{"error":"bad json","raw":"{oops"}]"#,
    ]);
    let assert = Command::cargo_bin("gaitlab")
        .unwrap()
        .args(["device", "--base-url", &url, "logs"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines[0], "12:00:01 [INFO] stream up");
    assert!(lines[1].starts_with("unparsed (bad json)"));
    server.join().unwrap();
}

#[test]
fn unreachable_device_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    Command::cargo_bin("gaitlab")
        .unwrap()
        .args(["device", "--base-url", &url, "stop-trial"])
        .assert()
        .failure();
}
