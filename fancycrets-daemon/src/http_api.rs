//! Blocking Kubernetes API client for secrets over plain HTTP(S).
//!
//! Intended to sit behind `kubectl proxy` or any endpoint that accepts an
//! optional bearer token. Status codes map onto [`ApiError`]:
//! 404 → `NotFound`, 401/403 → `Forbidden`, 409 → `Conflict`, else `Transport`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use fancycrets_core::{ApiError, Secret, SecretApi, SecretPatch};

use crate::error::DaemonError;
use crate::settings::Settings;
use crate::watcher::SecretLister;

const MERGE_PATCH: &str = "application/merge-patch+json";

#[derive(Deserialize)]
struct SecretList {
    #[serde(default)]
    items: Vec<Secret>,
}

pub struct HttpSecretApi {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpSecretApi {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, DaemonError> {
        Ok(Self::new(&settings.api_url, settings.read_token()?))
    }

    fn secrets_url(&self, namespace: &str) -> String {
        format!("{}/api/v1/namespaces/{namespace}/secrets", self.base_url)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let request = self
            .agent
            .request(method, url)
            .set("Accept", "application/json");
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }
}

/// `message` of a Kubernetes `Status` body, or the raw body.
fn status_message(response: ureq::Response) -> String {
    let body = response.into_string().unwrap_or_default();
    serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or(body)
}

fn map_error(err: ureq::Error, name: &str, namespace: &str) -> ApiError {
    match err {
        ureq::Error::Status(404, _) => ApiError::NotFound {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
        },
        ureq::Error::Status(401 | 403, response) => ApiError::Forbidden {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            message: status_message(response),
        },
        ureq::Error::Status(409, response) => ApiError::Conflict {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            message: status_message(response),
        },
        ureq::Error::Status(code, response) => {
            ApiError::Transport(format!("unexpected status {code}: {}", status_message(response)))
        }
        ureq::Error::Transport(transport) => ApiError::Transport(transport.to_string()),
    }
}

fn body_error(err: std::io::Error) -> ApiError {
    ApiError::Transport(format!("invalid response body: {err}"))
}

impl SecretApi for HttpSecretApi {
    fn read_secret(&self, name: &str, namespace: &str) -> Result<Secret, ApiError> {
        let url = format!("{}/{name}", self.secrets_url(namespace));
        let response = self
            .request("GET", &url)
            .call()
            .map_err(|e| map_error(e, name, namespace))?;
        response.into_json::<Secret>().map_err(body_error)
    }

    fn patch_secret(
        &self,
        name: &str,
        namespace: &str,
        patch: &SecretPatch,
    ) -> Result<(), ApiError> {
        let url = format!("{}/{name}", self.secrets_url(namespace));
        self.request("PATCH", &url)
            .set("Content-Type", MERGE_PATCH)
            .send_json(patch.to_merge_patch())
            .map_err(|e| map_error(e, name, namespace))?;
        Ok(())
    }
}

impl SecretLister for HttpSecretApi {
    fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, ApiError> {
        let response = self
            .request("GET", &self.secrets_url(namespace))
            .call()
            .map_err(|e| map_error(e, "*", namespace))?;
        let list = response.into_json::<SecretList>().map_err(body_error)?;
        Ok(list
            .items
            .into_iter()
            .map(|mut secret| {
                if secret.metadata.namespace.is_empty() {
                    secret.metadata.namespace = namespace.to_owned();
                }
                secret
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use fancycrets_core::SecretData;

    /// Serve a single canned response on loopback; the handle yields the raw request.
    fn serve_once(status: &str, body: &str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut request = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("read header");
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().expect("content length");
                }
                let end_of_headers = line == "\r\n" || line.is_empty();
                request.push_str(&line);
                if end_of_headers {
                    break;
                }
            }
            let mut payload = vec![0; content_length];
            reader.read_exact(&mut payload).expect("read body");
            request.push_str(&String::from_utf8_lossy(&payload));
            stream.write_all(response.as_bytes()).expect("write response");
            request
        });
        (url, handle)
    }

    fn status_body(message: &str) -> String {
        serde_json::json!({ "kind": "Status", "message": message }).to_string()
    }

    #[test]
    fn status_codes_map_onto_api_errors() {
        let cases: [(&str, fn(&ApiError) -> bool); 5] = [
            ("404 Not Found", |e| matches!(e, ApiError::NotFound { .. })),
            ("401 Unauthorized", |e| {
                matches!(e, ApiError::Forbidden { message, .. } if message == "denied")
            }),
            ("403 Forbidden", |e| {
                matches!(e, ApiError::Forbidden { message, .. } if message == "denied")
            }),
            ("409 Conflict", |e| {
                matches!(e, ApiError::Conflict { message, .. } if message == "denied")
            }),
            ("500 Internal Server Error", |e| {
                matches!(e, ApiError::Transport(message) if message == "unexpected status 500: denied")
            }),
        ];
        for (status, expected) in cases {
            let (url, server) = serve_once(status, &status_body("denied"));
            let api = HttpSecretApi::new(&url, None);
            let err = api.read_secret("db", "default").unwrap_err();
            server.join().expect("server");
            assert!(expected(&err), "{status} mapped to {err:?}");
        }
    }

    #[test]
    fn read_hits_the_secret_url_without_a_token() {
        let secret = serde_json::json!({
            "metadata": { "name": "db", "namespace": "prod", "resourceVersion": "3" },
            "data": { "user": "am9l" }
        });
        let (url, server) = serve_once("200 OK", &secret.to_string());
        let api = HttpSecretApi::new(&url, None);

        let read = api.read_secret("db", "prod").expect("read");
        let request = server.join().expect("server").to_ascii_lowercase();

        assert!(request.starts_with("get /api/v1/namespaces/prod/secrets/db "), "{request}");
        assert!(!request.contains("authorization:"));
        assert_eq!(read.data["user"], "am9l");
        assert_eq!(read.metadata.resource_version.as_deref(), Some("3"));
    }

    #[test]
    fn patch_sends_merge_patch_with_bearer_token() {
        let (url, server) = serve_once("200 OK", "{}");
        let api = HttpSecretApi::new(&url, Some("s3cr3t-token".into()));
        let mut data = SecretData::new();
        data.insert("conn".into(), "eA==".into());
        let patch = SecretPatch {
            data,
            resource_version: Some("7".into()),
        };

        api.patch_secret("app", "default", &patch).expect("patch");
        let request = server.join().expect("server");
        let (head, body) = request.split_once("\r\n\r\n").expect("request body");
        let head = head.to_ascii_lowercase();

        assert!(head.starts_with("patch /api/v1/namespaces/default/secrets/app "), "{head}");
        assert!(head.contains("content-type: application/merge-patch+json"), "{head}");
        assert!(head.contains("authorization: bearer s3cr3t-token"), "{head}");
        let body: Value = serde_json::from_str(body).expect("json body");
        assert_eq!(body["data"]["conn"], "eA==");
        assert_eq!(body["metadata"]["resourceVersion"], "7");
    }

    #[test]
    fn conflicting_patch_is_conflict() {
        let (url, server) = serve_once("409 Conflict", &status_body("object has been modified"));
        let api = HttpSecretApi::new(&url, None);
        let patch = SecretPatch {
            data: SecretData::new(),
            resource_version: Some("1".into()),
        };
        let err = api.patch_secret("app", "default", &patch).unwrap_err();
        server.join().expect("server");
        assert!(matches!(err, ApiError::Conflict { ref name, .. } if name == "app"), "got: {err}");
    }

    #[test]
    fn listed_secrets_inherit_the_namespace() {
        let list = serde_json::json!({
            "kind": "SecretList",
            "items": [
                { "metadata": { "name": "a" } },
                { "metadata": { "name": "b", "namespace": "prod" } }
            ]
        });
        let (url, server) = serve_once("200 OK", &list.to_string());
        let api = HttpSecretApi::new(&url, None);

        let secrets = api.list_secrets("prod").expect("list");
        let request = server.join().expect("server").to_ascii_lowercase();

        assert!(request.starts_with("get /api/v1/namespaces/prod/secrets "), "{request}");
        assert_eq!(secrets.len(), 2);
        assert!(secrets.iter().all(|s| s.namespace() == "prod"));
    }

    #[test]
    fn urls_are_built_without_double_slashes() {
        let api = HttpSecretApi::new("http://127.0.0.1:8001/", None);
        assert_eq!(
            api.secrets_url("prod"),
            "http://127.0.0.1:8001/api/v1/namespaces/prod/secrets"
        );
    }

    #[test]
    fn unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is essentially never an HTTP server.
        let api = HttpSecretApi::new("http://127.0.0.1:9", None);
        let err = api.read_secret("db", "default").unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got: {err}");
    }
}
