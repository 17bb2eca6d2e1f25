//! In-process stand-in for an MLflow tracking server.

use anyhow::anyhow;
use serde_json::{json, Value};
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use crate::{
    api::{
        error::TransportError,
        experiment::{Experiment, LifecycleStage},
        tag::Tags,
        NAMESPACE_TAG,
    },
    backend::{
        rest::Server,
        transport::{HttpRequest, HttpResponse, Method, Transport},
    },
};

pub(crate) const ADDRESS: &str = "http://mlflow.test";
const API: &str = "http://mlflow.test/api/2.0/mlflow/";
const EPOCH: i64 = 1_700_000_000;

#[derive(Default)]
pub(crate) struct FakeMlflow {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    experiments: BTreeMap<u64, Experiment>,
    requests: Vec<HttpRequest>,
    canned: VecDeque<HttpResponse>,
    failing: HashMap<String, HttpResponse>,
}

impl FakeMlflow {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(FakeMlflow::default())
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Answers the next request with `status` and `body` instead of handling it.
    pub(crate) fn respond_next(&self, status: u16, body: &str) {
        self.state.lock().unwrap().canned.push_back(HttpResponse {
            status,
            body: body.to_string(),
        });
    }

    /// Answers every request to `path` with `status` and `body`, leaving the
    /// stored experiments untouched.
    pub(crate) fn fail_on(&self, path: &str, status: u16, body: &str) {
        self.state.lock().unwrap().failing.insert(
            path.to_string(),
            HttpResponse {
                status,
                body: body.to_string(),
            },
        );
    }

    /// The experiment as stored on the server, with its qualified name.
    pub(crate) fn stored(&self, id: &str) -> Option<Experiment> {
        let id = id.parse::<u64>().ok()?;
        self.state.lock().unwrap().experiments.get(&id).cloned()
    }
}

pub(crate) fn server(fake: &Arc<FakeMlflow>) -> Server {
    Server::with_transport(ADDRESS, Arc::clone(fake)).unwrap()
}

/// A transport whose server is never reachable.
pub(crate) struct Unreachable;

impl Transport for Unreachable {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        Err(anyhow!("connection refused: {}", request.url))
    }
}

fn reply(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        body: body.to_string(),
    }
}

fn failure(status: u16, code: &str, message: &str) -> HttpResponse {
    reply(status, json!({ "error_code": code, "message": message }))
}

fn does_not_exist() -> HttpResponse {
    failure(404, "RESOURCE_DOES_NOT_EXIST", "No Experiment with the given id exists")
}

/// Mirrors the server format: timestamps as strings, `last_update_time`.
fn represent(experiment: &Experiment) -> Value {
    json!({
        "experiment_id": experiment.experiment_id,
        "name": experiment.name,
        "artifact_location": experiment.artifact_location,
        "lifecycle_stage": experiment.lifecycle_stage,
        "creation_time": experiment.creation_time.to_string(),
        "last_update_time": experiment.last_updated_time.to_string(),
        "tags": experiment.tags,
    })
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or("")
}

impl Transport for FakeMlflow {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        if let Some(response) = state.canned.pop_front() {
            return Ok(response);
        }

        let rest = request
            .url
            .strip_prefix(API)
            .ok_or_else(|| anyhow!("unexpected url {}", request.url))?;
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        if let Some(response) = state.failing.get(path) {
            return Ok(response.clone());
        }
        let query: HashMap<String, String> = serde_qs::from_str(query)?;
        let body: Value = match &request.body {
            Some(body) => serde_json::from_str(body)?,
            None => Value::Null,
        };

        let response = match (request.method, path) {
            (Method::Post, "experiments/create") => state.create(&body),
            (Method::Get, "experiments/get") => {
                let id = query.get("experiment_id").map(String::as_str).unwrap_or("");
                state.get(id)
            }
            (Method::Get, "experiments/get-by-name") => {
                let name = query.get("experiment_name").map(String::as_str).unwrap_or("");
                state.get_by_name(name)
            }
            (Method::Post, "experiments/delete") => state.set_stage(text(&body, "experiment_id"), LifecycleStage::Deleted),
            (Method::Post, "experiments/restore") => state.set_stage(text(&body, "experiment_id"), LifecycleStage::Active),
            (Method::Post, "experiments/update") => state.rename(&body),
            (Method::Post, "experiments/set-experiment-tag") => state.set_tag(&body),
            (Method::Post, "experiments/search") => state.search(&body),
            _ => failure(404, "ENDPOINT_NOT_FOUND", "No such endpoint"),
        };
        Ok(response)
    }
}

impl State {
    fn lookup(&mut self, id: &str) -> Option<&mut Experiment> {
        let id = id.parse::<u64>().ok()?;
        self.experiments.get_mut(&id)
    }

    fn name_taken(&self, name: &str) -> bool {
        self.experiments.values().any(|experiment| experiment.name == name)
    }

    fn create(&mut self, body: &Value) -> HttpResponse {
        let name = text(body, "name");
        if name.is_empty() {
            return failure(400, "INVALID_PARAMETER_VALUE", "Missing value for required parameter 'name'");
        }
        if self.name_taken(name) {
            return failure(400, "RESOURCE_ALREADY_EXISTS", "Experiment already exists");
        }
        self.next_id += 1;
        let id = self.next_id;
        let tags = serde_json::from_value::<Tags>(body["tags"].clone()).unwrap_or_default();
        let artifact_location = match text(body, "artifact_location") {
            "" => format!("./mlruns/{}", id),
            location => location.to_string(),
        };
        let experiment = Experiment {
            experiment_id: id.to_string().into(),
            name: name.to_string(),
            artifact_location,
            creation_time: EPOCH + id as i64,
            last_updated_time: EPOCH + id as i64,
            lifecycle_stage: Some(LifecycleStage::Active),
            tags,
        };
        self.experiments.insert(id, experiment);
        reply(200, json!({ "experiment_id": id.to_string() }))
    }

    fn get(&mut self, id: &str) -> HttpResponse {
        match self.lookup(id) {
            Some(experiment) => reply(200, json!({ "experiment": represent(experiment) })),
            None => does_not_exist(),
        }
    }

    fn get_by_name(&self, name: &str) -> HttpResponse {
        match self.experiments.values().find(|experiment| experiment.name == name) {
            Some(experiment) => reply(200, json!({ "experiment": represent(experiment) })),
            None => does_not_exist(),
        }
    }

    fn set_stage(&mut self, id: &str, stage: LifecycleStage) -> HttpResponse {
        match self.lookup(id) {
            Some(experiment) if experiment.lifecycle_stage != Some(stage) => {
                experiment.lifecycle_stage = Some(stage);
                experiment.last_updated_time += 1;
                reply(200, json!({}))
            }
            _ => does_not_exist(),
        }
    }

    fn rename(&mut self, body: &Value) -> HttpResponse {
        let new_name = text(body, "new_name").to_string();
        if self.name_taken(&new_name) {
            return failure(400, "RESOURCE_ALREADY_EXISTS", "Experiment already exists");
        }
        match self.lookup(text(body, "experiment_id")) {
            Some(experiment) => {
                experiment.name = new_name;
                experiment.last_updated_time += 1;
                reply(200, json!({}))
            }
            None => does_not_exist(),
        }
    }

    fn set_tag(&mut self, body: &Value) -> HttpResponse {
        let (key, value) = (text(body, "key"), text(body, "value"));
        match self.lookup(text(body, "experiment_id")) {
            Some(experiment) => {
                experiment.tags.set(key, value);
                // the server answers tag updates with an empty body
                HttpResponse {
                    status: 200,
                    body: String::new(),
                }
            }
            None => does_not_exist(),
        }
    }

    fn search(&self, body: &Value) -> HttpResponse {
        let filter = text(body, "filter");
        let expected = format!("tags.`{}` = '", NAMESPACE_TAG);
        let namespace = filter
            .strip_prefix(expected.as_str())
            .and_then(|rest| rest.strip_suffix('\''))
            .unwrap_or("");
        let max_results = body["max_results"].as_u64().unwrap_or(1000) as usize;
        let visible = |experiment: &&Experiment| match text(body, "view_type") {
            "ALL" => true,
            "DELETED_ONLY" => experiment.lifecycle_stage == Some(LifecycleStage::Deleted),
            _ => experiment.lifecycle_stage == Some(LifecycleStage::Active),
        };
        let found: Vec<Value> = self
            .experiments
            .values()
            .filter(|experiment| experiment.tags.get(NAMESPACE_TAG) == namespace)
            .filter(visible)
            .take(max_results)
            .map(represent)
            .collect();
        if found.is_empty() {
            reply(200, json!({}))
        } else {
            reply(200, json!({ "experiments": found }))
        }
    }
}
