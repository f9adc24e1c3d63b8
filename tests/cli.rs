use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

fn purge_cmd() -> Command {
    let mut cmd = Command::cargo_bin("anilist-purge").unwrap();
    cmd.env_remove("ANILIST_TOKEN")
        .env_remove("ANILIST_USERNAME")
        .env_remove("ANILIST_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

const ONE_ENTRY: &str = r#"{"data":{"MediaListCollection":{"lists":[{"name":"Reading","entries":[{"id":5,"media":{"title":{"romaji":"Yotsuba to!","english":"Yotsuba&!"}}}]}]}}}"#;
const DELETED: &str = r#"{"data":{"DeleteMediaListEntry":{"deleted":true}}}"#;

fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
        status,
        body.len(),
        extra_headers,
        body
    )
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serve `responses` in order, one per connection, recording each raw
/// request. Returns the endpoint URL and the request log.
fn serve(responses: Vec<String>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let log = Arc::new(Mutex::new(Vec::new()));
    let requests = Arc::clone(&log);
    thread::spawn(move || {
        for response in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            requests.lock().unwrap().push(request);
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
    });
    (url, log)
}

#[test]
fn test_help_exits_successfully() {
    purge_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ACCESS_TOKEN"))
        .stdout(predicate::str::contains("USERNAME"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_short_help_flag() {
    purge_cmd().arg("-h").assert().success();
}

#[test]
fn test_missing_credentials_prints_usage() {
    purge_cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing access token"))
        .stderr(predicate::str::contains("ANILIST_TOKEN"));
}

#[test]
fn test_missing_username_prints_usage() {
    purge_cmd()
        .arg("some-token")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing username"));
}

#[test]
fn test_username_falls_back_to_env() {
    // Nothing listens on the discard port, so the fetch fails fast and the
    // run stops before any prompt.
    purge_cmd()
        .arg("some-token")
        .env("ANILIST_USERNAME", "alice")
        .env("ANILIST_API_URL", "http://127.0.0.1:9")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to fetch MANGA lists for alice"));
}

#[test]
fn test_unknown_media_type_exits_with_one() {
    purge_cmd()
        .args(["tok", "alice", "--type", "novel"])
        .assert()
        .code(1);
}

#[test]
fn test_piped_yes_deletes_and_retries_after_rate_limit() {
    let (url, requests) = serve(vec![
        http_response("200 OK", "", ONE_ENTRY),
        http_response("429 Too Many Requests", "Retry-After: 0\r\n", r#"{"errors":[{"message":"Too Many Requests."}]}"#),
        http_response("200 OK", "", DELETED),
    ]);

    purge_cmd()
        .args(["tok", "alice"])
        .env("ANILIST_API_URL", &url)
        .write_stdin("yes\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reading: 1 entries"))
        .stdout(predicate::str::contains("Rate limited. Waiting 0s"))
        .stdout(predicate::str::contains("[1/1] Deleted Yotsuba to! (5)"))
        .stdout(predicate::str::contains("1 deleted, 0 failed"));

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    for request in requests.iter() {
        assert!(request.to_lowercase().contains("authorization: bearer tok"));
    }
    assert!(requests[0].contains("MediaListCollection"));
    assert!(requests[0].contains(r#""type":"MANGA""#));
    assert!(requests[0].contains(r#""userName":"alice""#));
    for delete in &requests[1..] {
        assert!(delete.contains("DeleteMediaListEntry"));
        assert!(delete.contains(r#""id":5"#));
    }
}

#[test]
fn test_piped_decline_issues_no_deletes() {
    let (url, requests) = serve(vec![http_response("200 OK", "", ONE_ENTRY)]);

    purge_cmd()
        .args(["tok", "alice"])
        .env("ANILIST_API_URL", &url)
        .write_stdin("no\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted. Nothing was deleted."))
        .stdout(predicate::str::contains("Deleted").not());

    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[test]
fn test_graphql_error_on_fetch_is_fatal() {
    let (url, _requests) = serve(vec![http_response(
        "404 Not Found",
        "",
        r#"{"data":{"MediaListCollection":null},"errors":[{"message":"User not found","status":404}]}"#,
    )]);

    purge_cmd()
        .args(["tok", "nobody"])
        .env("ANILIST_API_URL", &url)
        .write_stdin("yes\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("User not found"));
}
