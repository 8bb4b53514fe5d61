use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::{json, Value};
use tempfile::TempDir;

fn fancycrets_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fancycrets"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("RUST_LOG", "off");
    cmd
}

/// Minimal secrets endpoint: serves GETs from a fixed map, accepts PATCHes
/// and records every request line with its headers.
struct FakeCluster {
    url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeCluster {
    fn start(secrets: BTreeMap<&'static str, Value>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve(stream, &secrets, &log);
            }
        });
        Self { url, requests }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests").clone()
    }
}

fn serve(mut stream: TcpStream, secrets: &BTreeMap<&str, Value>, log: &Mutex<Vec<String>>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone"));
    let mut head = String::new();
    let mut content_length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
        if line == "\r\n" {
            break;
        }
        head.push_str(&line);
    }
    let mut body = vec![0; content_length];
    let _ = reader.read_exact(&mut body);
    log.lock().expect("log").push(head.to_ascii_lowercase());

    let mut parts = head.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let name = parts
        .next()
        .and_then(|path| path.rsplit('/').next())
        .unwrap_or_default();
    let (status, payload) = match (method, secrets.get(name)) {
        ("GET", Some(secret)) => ("200 OK", secret.to_string()),
        ("PATCH", Some(_)) => ("200 OK", "{}".to_string()),
        _ => (
            "404 Not Found",
            json!({ "kind": "Status", "message": "not found" }).to_string(),
        ),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    let _ = stream.write_all(response.as_bytes());
}

fn cluster() -> FakeCluster {
    let mut secrets = BTreeMap::new();
    secrets.insert(
        "db",
        json!({
            "metadata": { "name": "db", "namespace": "default", "resourceVersion": "1" },
            "data": { "user": "am9l", "pass": "cGFzcw==" }
        }),
    );
    secrets.insert(
        "app",
        json!({
            "metadata": {
                "name": "app",
                "namespace": "default",
                "resourceVersion": "2",
                "annotations": {
                    "fancycrets.secretSource.db": "db",
                    "fancycrets.secretFormat.conn": "{user}:{pass}"
                }
            },
            "data": {}
        }),
    );
    FakeCluster::start(secrets)
}

#[test]
fn diff_prints_redacted_additions() {
    let home = TempDir::new().expect("home");
    let cluster = cluster();

    fancycrets_cmd(home.path())
        .args(["diff", "app", "--api-url", &cluster.url])
        .assert()
        .success()
        .stdout(contains("b/default/app"))
        .stdout(contains("+conn = sha256:"))
        .stdout(contains("joe:pass").not());
    assert!(cluster.requests().iter().all(|r| r.starts_with("get ")));
}

#[test]
fn compose_patches_the_target_secret() {
    let home = TempDir::new().expect("home");
    let cluster = cluster();

    fancycrets_cmd(home.path())
        .args(["compose", "app", "-n", "default", "--api-url", &cluster.url])
        .assert()
        .success()
        .stdout(contains("patched"))
        .stdout(contains("conn"));

    let requests = cluster.requests();
    let patch = requests
        .iter()
        .find(|r| r.starts_with("patch /api/v1/namespaces/default/secrets/app "))
        .expect("patch request");
    assert!(patch.contains("content-type: application/merge-patch+json"));
}

#[test]
fn compose_dry_run_does_not_patch() {
    let home = TempDir::new().expect("home");
    let cluster = cluster();

    fancycrets_cmd(home.path())
        .args(["compose", "app", "--dry-run", "--api-url", &cluster.url])
        .assert()
        .success()
        .stdout(contains("added"))
        .stdout(contains("conn"));
    assert!(cluster.requests().iter().all(|r| !r.starts_with("patch ")));
}

#[test]
fn compose_reports_missing_target() {
    let home = TempDir::new().expect("home");
    let cluster = cluster();

    fancycrets_cmd(home.path())
        .args(["compose", "ghost", "--api-url", &cluster.url])
        .assert()
        .failure()
        .stderr(contains("default/ghost"));
}
