//! In-process gateway that records every request, for unit tests

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use url::Url;

use super::client::Gateway;
use super::error::GatewayError;
use super::request::Request;

/// Records requests and answers them from canned responses
///
/// Actions without a queued response get a plausible success envelope;
/// `collection_create` hands out increasing collection ids starting at 1000.
#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<Request>>,
    queued: Mutex<HashMap<&'static str, VecDeque<Result<Value, GatewayError>>>>,
    next_collection_id: Mutex<u64>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            next_collection_id: Mutex::new(1000),
            ..Default::default()
        }
    }

    /// Queue a response for the next call to `action`
    pub fn respond(&self, action: &'static str, response: Result<Value, GatewayError>) {
        self.queued
            .lock()
            .unwrap()
            .entry(action)
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<&'static str> {
        self.calls().iter().map(|r| r.action).collect()
    }

    fn default_response(&self, request: &Request) -> Value {
        match request.action {
            "userinfo" => json!({"result": 0, "auth": "fresh-token"}),
            "collection_list" => json!({"result": 0, "collections": []}),
            "collection_create" => {
                let mut next = self.next_collection_id.lock().unwrap();
                let id = *next;
                *next += 1;
                json!({
                    "result": 0,
                    "collection": {"id": id, "name": request.value("name").unwrap_or_default()}
                })
            }
            "listtokens" => json!({"result": 0, "tokens": []}),
            _ => json!({"result": 0}),
        }
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn call(&self, request: &Request) -> Result<Value, GatewayError> {
        self.calls.lock().unwrap().push(request.clone());

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(request.action)
            .and_then(|q| q.pop_front());

        match queued {
            Some(response) => response,
            None => Ok(self.default_response(request)),
        }
    }

    fn display_url(&self, request: &Request) -> String {
        request.display_url(&Url::parse("https://recording.invalid").unwrap())
    }
}
