//! Test doubles and request helpers shared by the API tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use looksim::app_state::AppState;
use looksim::models::artifact::Artifact;
use looksim::models::job::{Job, JobStatus};
use looksim::routes;
use looksim::services::editor::{EditRequest, ImageEditor};
use looksim::services::job_client::{JobBackend, JobError, JobInput};
use looksim::services::storage::{ObjectStore, StorageError};

/// Editor that returns a fixed result and records what it was asked.
pub struct CannedEditor {
    pub name: &'static str,
    pub result: Result<Artifact, fn() -> JobError>,
    pub requests: Mutex<Vec<EditRequest>>,
}

impl CannedEditor {
    pub fn ok(name: &'static str, artifact: Artifact) -> Arc<Self> {
        Arc::new(Self {
            name,
            result: Ok(artifact),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &'static str, error: fn() -> JobError) -> Arc<Self> {
        Arc::new(Self {
            name,
            result: Err(error),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageEditor for CannedEditor {
    fn provider(&self) -> &'static str {
        self.name
    }

    async fn edit(&self, request: &EditRequest) -> Result<Artifact, JobError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.result {
            Ok(artifact) => Ok(artifact.clone()),
            Err(make) => Err(make()),
        }
    }
}

/// How a scripted model behaves when submitted.
#[derive(Clone)]
pub enum ModelScript {
    /// Reports `running` this many times, then succeeds with the URL.
    SucceedsAfter(usize, &'static str),
    /// Reports `failed` with the message.
    Fails(&'static str),
    /// Creation is rejected with this HTTP status.
    Rejected(u16),
    /// Never leaves `running`.
    Hangs,
}

/// Replicate-like backend scripted per model.
pub struct ScriptedBackend {
    scripts: HashMap<String, ModelScript>,
    polls: Mutex<HashMap<String, usize>>,
    pub submitted: Mutex<Vec<JobInput>>,
}

impl ScriptedBackend {
    pub fn new(scripts: &[(&str, ModelScript)]) -> Arc<Self> {
        Arc::new(Self {
            scripts: scripts
                .iter()
                .map(|(model, script)| (model.to_string(), script.clone()))
                .collect(),
            polls: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl JobBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn submit(&self, input: &JobInput) -> Result<Job, JobError> {
        self.submitted.lock().unwrap().push(input.clone());
        match self.scripts.get(&input.model) {
            Some(ModelScript::Rejected(status)) => Err(JobError::Submission {
                status: Some(*status),
                details: format!("{} is unavailable", input.model),
            }),
            Some(_) => Ok(Job::observed(input.model.clone(), JobStatus::Queued, vec![], None)),
            None => Err(JobError::Submission {
                status: Some(404),
                details: format!("unknown model {}", input.model),
            }),
        }
    }

    async fn status(&self, job_id: &str) -> Result<Job, JobError> {
        let seen = {
            let mut polls = self.polls.lock().unwrap();
            let count = polls.entry(job_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let job = match self.scripts.get(job_id) {
            Some(ModelScript::SucceedsAfter(n, url)) if seen > *n => {
                Job::observed(job_id, JobStatus::Succeeded, vec![url.to_string()], None)
            }
            Some(ModelScript::Fails(message)) => {
                Job::observed(job_id, JobStatus::Failed, vec![], Some(message.to_string()))
            }
            _ => Job::observed(job_id, JobStatus::Running, vec![], None),
        };
        Ok(job)
    }

    async fn fetch_asset(&self, url: &str) -> Result<Artifact, JobError> {
        Ok(Artifact::new("image/png", url.as_bytes().to_vec()))
    }
}

/// Object store that keeps uploads in memory.
#[derive(Default)]
pub struct RecordingStore {
    pub uploads: Mutex<Vec<(String, Vec<u8>, String)>>,
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String, StorageError> {
        self.uploads
            .lock()
            .unwrap()
            .push((key.to_string(), data.to_vec(), content_type.to_string()));
        Ok(format!("https://bucket.test/{key}"))
    }
}

/// Router with the same middleware stack as the server.
pub fn app(state: AppState) -> Router {
    app_with_timeout(state, Duration::from_secs(300))
}

pub fn app_with_timeout(state: AppState, request_timeout: Duration) -> Router {
    routes::finish(routes::api_routes(), state, request_timeout)
}

/// Send a request and decode the JSON body (`Value::Null` when empty).
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("origin", "http://localhost:5173");
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, json)
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, _, json) = send(app, Method::POST, uri, Some(body)).await;
    (status, json)
}
