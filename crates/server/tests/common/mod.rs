//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock capabilities injected, so the HTTP surface can be exercised
//! without Python, model weights or network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use lipsync_core::{
    config::{JobsConfig, ServerConfig, WorkspaceConfig},
    testing::{MockFetcher, MockTool},
    Config, LipSyncOrchestrator, Workspace,
};

/// Boundary used by `post_multipart`.
pub const BOUNDARY: &str = "lipsync-test-boundary";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_submit() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/wav2lip-url", json!({
///         "video_url": "https://x/face.mp4",
///         "audio_url": "https://x/voice.wav"
///     })).await;
///
///     assert_eq!(response.status, StatusCode::ACCEPTED);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock lip-sync tool - configure run outcomes
    pub tool: Arc<MockTool>,
    /// Mock fetcher - configure input downloads
    pub fetcher: Arc<MockFetcher>,
    pub orchestrator: Arc<LipSyncOrchestrator>,
    pub workspace: Workspace,
    /// Temporary directory holding the workspace
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response with the raw body, for binary endpoints
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    pub public_url: Option<String>,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                public_url: test_config.public_url,
            },
            workspace: WorkspaceConfig {
                temp_dir: temp_dir.path().join("temp"),
                output_dir: temp_dir.path().join("outputs"),
            },
            jobs: JobsConfig {
                retention_secs: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        let workspace = Workspace::new(&config.workspace);
        workspace
            .ensure_dirs()
            .await
            .expect("Failed to create workspace");

        let tool = Arc::new(MockTool::new());
        let fetcher = Arc::new(MockFetcher::new());
        let orchestrator = Arc::new(LipSyncOrchestrator::new(
            Arc::clone(&tool) as Arc<dyn lipsync_core::LipSyncTool>,
            Arc::clone(&fetcher) as Arc<dyn lipsync_core::Fetcher>,
            workspace.clone(),
            config.jobs.clone(),
        ));

        let state = Arc::new(lipsync_server::state::AppState::new(
            config,
            Arc::clone(&orchestrator),
        ));
        let router = lipsync_server::api::create_router(state);

        Self {
            router,
            tool,
            fetcher,
            orchestrator,
            workspace,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        Self::to_json(self.send(request).await)
    }

    /// Send a GET request and keep the raw body.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with a JSON body and keep the raw response body.
    pub async fn post_json_raw(&self, path: &str, body: Value) -> RawResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    /// Send a multipart form. Each part is `(field, file_name, bytes)`.
    pub async fn post_multipart(&self, path: &str, parts: &[(&str, &str, &[u8])]) -> RawResponse {
        let mut body = Vec::new();
        for (field, file_name, bytes) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    field, file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Poll a job until it reaches a terminal status.
    pub async fn wait_for_job(&self, job_id: &str, timeout: Duration) -> Value {
        let start = std::time::Instant::now();
        loop {
            let response = self.get(&format!("/job/{}", job_id)).await;
            assert_eq!(response.status, StatusCode::OK, "{}", response.body);
            let status = response.body["status"].as_str().unwrap_or_default();
            if status == "completed" || status == "error" {
                return response.body;
            }
            assert!(
                start.elapsed() < timeout,
                "Job {} stuck in {}",
                job_id,
                status
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Number of entries left in the temp directory.
    pub fn temp_entries(&self) -> usize {
        std::fs::read_dir(self.workspace.temp_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        Self::to_json(self.send(request).await)
    }

    async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        RawResponse {
            status,
            headers,
            body,
        }
    }

    fn to_json(raw: RawResponse) -> TestResponse {
        let body = if raw.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&raw.body).unwrap_or(Value::Null)
        };
        TestResponse {
            status: raw.status,
            body,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
