//! Scripted transport for unit tests.

use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

type Reply = Result<HttpResponse, TransportError>;

/// Replays queued replies in order and records every request it sees.
/// Running out of replies yields a non-transient transport error.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(&self, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        self.replies.lock().push_back(Ok(HttpResponse {
            status,
            body: body.into(),
        }));
        self
    }

    pub(crate) fn reply_json(&self, status: u16, body: serde_json::Value) -> &Self {
        self.reply(status, body.to_string())
    }

    pub(crate) fn fail(&self, error: TransportError) -> &Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Reply {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no scripted reply left", false)))
    }
}

pub(crate) fn sign_in_body(token: &str, site_id: &str, user_id: &str) -> serde_json::Value {
    serde_json::json!({
        "credentials": {
            "token": token,
            "site": {"id": site_id, "contentUrl": ""},
            "user": {"id": user_id}
        }
    })
}
