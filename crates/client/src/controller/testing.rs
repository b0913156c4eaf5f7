//! Scripted network used by controller and strategy tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode, header};
use showroom_core::Error;

use crate::fetch::{Network, Request, Response, ServedFrom};

#[derive(Debug, Clone)]
pub(crate) enum Script {
    Respond { status: StatusCode, headers: Vec<(&'static str, &'static str)>, body: String },
    Fail,
    Hang,
}

impl Script {
    pub(crate) fn ok(body: &str) -> Self {
        Self::status(StatusCode::OK, body)
    }

    pub(crate) fn status(status: StatusCode, body: &str) -> Self {
        Script::Respond { status, headers: Vec::new(), body: body.to_string() }
    }

    pub(crate) fn ok_with_header(body: &str, name: &'static str, value: &'static str) -> Self {
        Script::Respond { status: StatusCode::OK, headers: vec![(name, value)], body: body.to_string() }
    }
}

/// Answers requests by URL from a script table. Unscripted URLs fail like a dropped connection.
#[derive(Default)]
pub(crate) struct ScriptedNetwork {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<(Method, String, Option<Bytes>)>>,
}

impl ScriptedNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(&self, url: &str, script: Script) {
        self.scripts.lock().unwrap().insert(url.to_string(), script);
    }

    pub(crate) fn calls(&self) -> Vec<(Method, String, Option<Bytes>)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(_, u, _)| u == url).count()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls
            .lock()
            .unwrap()
            .push((request.method.clone(), request.url.to_string(), request.body.clone()));

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .unwrap_or(Script::Fail);

        match script {
            Script::Respond { status, headers, body } => {
                let mut map = header::HeaderMap::new();
                for (name, value) in headers {
                    map.append(name, header::HeaderValue::from_static(value));
                }
                Ok(Response {
                    url: request.url.clone(),
                    status,
                    headers: map,
                    body: Bytes::from(body),
                    served_from: ServedFrom::Network,
                })
            }
            Script::Fail => Err(Error::Network(format!("connection refused: {}", request.url))),
            Script::Hang => std::future::pending().await,
        }
    }
}
