//! `fetch()`-backed transport (WASM only)

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::{ScoreSubmission, ScoreTransport, TransportEvent, decode_submit, decode_top};
use crate::error::NetworkError;

pub struct FetchTransport {
    base_url: String,
    completed: Rc<RefCell<Vec<TransportEvent>>>,
}

impl FetchTransport {
    /// `base_url` is prepended to `/highscores` and `/scores`; empty means
    /// same origin.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            completed: Rc::default(),
        }
    }
}

fn js_error(value: JsValue) -> NetworkError {
    NetworkError::Transport(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

/// Send one request and return status and body text
async fn send(url: String, method: &str, body: Option<String>) -> Result<(u16, String), NetworkError> {
    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);
    if let Some(body) = &body {
        opts.set_body(&JsValue::from_str(body));
    }

    let request = Request::new_with_str_and_init(&url, &opts).map_err(js_error)?;
    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(js_error)?;
    }

    let window = web_sys::window().ok_or_else(|| NetworkError::Transport("no window".into()))?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?
        .dyn_into()
        .map_err(js_error)?;
    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?
        .as_string()
        .unwrap_or_default();
    Ok((response.status(), text))
}

impl ScoreTransport for FetchTransport {
    fn fetch_top(&mut self, limit: u32) {
        let url = format!("{}/highscores?limit={}", self.base_url, limit);
        let completed = self.completed.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = send(url, "GET", None)
                .await
                .and_then(|(status, body)| decode_top(status, &body));
            completed.borrow_mut().push(TransportEvent::TopLoaded(result));
        });
    }

    fn submit(&mut self, submission: ScoreSubmission) {
        let url = format!("{}/scores", self.base_url);
        let completed = self.completed.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = match serde_json::to_string(&submission) {
                Ok(body) => send(url, "POST", Some(body))
                    .await
                    .and_then(|(status, body)| decode_submit(status, &body)),
                Err(e) => Err(NetworkError::Decode(e.to_string())),
            };
            completed
                .borrow_mut()
                .push(TransportEvent::Submitted { submission, result });
        });
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        std::mem::take(&mut *self.completed.borrow_mut())
    }
}
