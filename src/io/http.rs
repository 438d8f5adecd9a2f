// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Review server client.
//!
//! `GET {base}/files/{id}` lists a file's annotations and
//! `POST {base}/files/{id}/annotations` stores one. Timeouts are enforced
//! by the agent, not by the editor.

use super::gateway::{PersistenceError, PersistenceGateway};
use super::wire::{decode_load_response, decode_save_response, AnnotationRecord};
use std::time::Duration;

const USER_AGENT: &str = concat!("reviewmark/", env!("CARGO_PKG_VERSION"));

pub struct HttpGateway {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn file_url(&self, target: &str) -> String {
        format!("{}/files/{}", self.base_url, target)
    }

    fn annotations_url(&self, target: &str) -> String {
        format!("{}/files/{}/annotations", self.base_url, target)
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }
}

/// Map a ureq failure, pulling the server's `error` message when present.
fn request_error(error: ureq::Error) -> PersistenceError {
    match error {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_string()
                .ok()
                .and_then(|body| error_message(&body))
                .unwrap_or_else(|| format!("HTTP {}", status));
            PersistenceError::Status { status, message }
        }
        ureq::Error::Transport(transport) => PersistenceError::Transport(transport.to_string()),
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}

impl PersistenceGateway for HttpGateway {
    fn load_annotations(&self, target: &str) -> Result<Vec<AnnotationRecord>, PersistenceError> {
        let url = self.file_url(target);
        log::debug!("GET {}", url);

        let body = self
            .authorize(self.agent.get(&url))
            .call()
            .map_err(request_error)?
            .into_string()
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        decode_load_response(&body)
            .ok_or_else(|| PersistenceError::Malformed("no annotation list in response".to_string()))
    }

    fn save_annotation(
        &self,
        target: &str,
        annotation: &AnnotationRecord,
    ) -> Result<AnnotationRecord, PersistenceError> {
        let url = self.annotations_url(target);
        log::debug!("POST {} ({})", url, annotation.kind);

        let body = self
            .authorize(self.agent.post(&url))
            .send_json(annotation)
            .map_err(request_error)?
            .into_string()
            .map_err(|e| PersistenceError::Transport(e.to_string()))?;

        decode_save_response(&body).map_err(|e| PersistenceError::Malformed(e.to_string()))
    }
}
