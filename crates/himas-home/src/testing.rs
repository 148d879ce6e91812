//! In-memory fakes for the Home Assistant API and the language model.

use crate::client::HomeApi;
use crate::entity::Entity;
use crate::error::ServiceError;
use async_trait::async_trait;
use himas_core::{
    error::HimasError,
    message::{GenerateRequest, Generation},
    traits::Provider,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A recorded `call_service` invocation.
#[derive(Debug, Clone)]
pub(crate) struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub data: Value,
}

/// Fake Home Assistant holding a fixed entity list.
///
/// Service calls succeed unless the target entity id was registered with
/// [`FakeHome::fail_service_for`].
pub(crate) struct FakeHome {
    entities: Mutex<Vec<Entity>>,
    fail_fetch: Mutex<bool>,
    fetches: Mutex<usize>,
    failures: Mutex<HashMap<String, ServiceError>>,
    calls: Mutex<Vec<ServiceCall>>,
}

impl FakeHome {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities: Mutex::new(entities),
            fail_fetch: Mutex::new(false),
            fetches: Mutex::new(0),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_entities(&self, entities: Vec<Entity>) {
        *self.entities.lock().unwrap() = entities;
    }

    pub fn fail_state_fetches(&self, fail: bool) {
        *self.fail_fetch.lock().unwrap() = fail;
    }

    pub fn fail_service_for(&self, entity_id: &str, err: ServiceError) {
        self.failures
            .lock()
            .unwrap()
            .insert(entity_id.to_string(), err);
    }

    pub fn state_fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HomeApi for FakeHome {
    async fn fetch_states(&self) -> Result<Vec<Entity>, HimasError> {
        *self.fetches.lock().unwrap() += 1;
        if *self.fail_fetch.lock().unwrap() {
            return Err(HimasError::HomeAssistant("connection refused".into()));
        }
        Ok(self.entities.lock().unwrap().clone())
    }

    async fn fetch_state(&self, entity_id: &str) -> Option<Entity> {
        self.entities
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.entity_id == entity_id)
            .cloned()
    }

    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: &Value,
    ) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(ServiceCall {
            domain: domain.to_string(),
            service: service.to_string(),
            data: data.clone(),
        });
        let target = data["entity_id"].as_str().unwrap_or_default();
        match self.failures.lock().unwrap().get(target) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn api_status(&self) -> Result<String, HimasError> {
        Ok("API running.".to_string())
    }
}

/// Language model that replays queued replies and records prompts.
///
/// An empty queue answers with an error, like an unreachable server.
pub(crate) struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, err: &str) -> Self {
        self.replies.lock().unwrap().push_back(Err(err.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }
}

#[async_trait]
impl Provider for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, HimasError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(Generation {
                text,
                model: request.model.clone(),
                processing_time_ms: 0,
            }),
            Some(Err(e)) => Err(HimasError::Provider(e)),
            None => Err(HimasError::Provider("no scripted reply".into())),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}
