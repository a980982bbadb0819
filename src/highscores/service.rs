//! In-memory scoring service
//!
//! Speaks the same request/response contract as the hosted leaderboard:
//! `GET /highscores?limit=N` and `POST /scores`. Backs the native demo and the
//! round-trip tests through [`LocalTransport`].

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};

use super::{
    DEFAULT_LIMIT, LeaderboardEntry, MAX_NAME_LEN, ScoreSubmission, ScoreTransport,
    TransportEvent, decode_submit, decode_top, normalize_limit,
};
use crate::platform::time::{Clock, format_timestamp};

/// Status code and JSON body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

impl ServiceResponse {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }
}

#[derive(Debug, Clone)]
struct StoredScore {
    entry: LeaderboardEntry,
    /// Insertion order, last tie-breaker
    seq: u64,
}

pub struct MemoryScoreService {
    rows: Vec<StoredScore>,
    next_seq: u64,
    clock: Box<dyn Clock>,
    /// When set, every request fails as if the backing store were down
    outage: Option<String>,
}

impl MemoryScoreService {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            rows: Vec::new(),
            next_seq: 0,
            clock,
            outage: None,
        }
    }

    /// Simulate a backend failure (`Some`) or recovery (`None`)
    pub fn set_outage(&mut self, reason: Option<&str>) {
        self.outage = reason.map(str::to_string);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Route one request. `target` is the path plus optional query string.
    pub fn handle(&mut self, method: &str, target: &str, body: &str) -> ServiceResponse {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        match (path, method) {
            ("/highscores", "GET") => self.top(query),
            ("/highscores", _) => ServiceResponse::error(405, "Method not allowed"),
            ("/scores", "POST") => self.insert(body),
            ("/scores", _) => ServiceResponse::error(405, "Method not allowed"),
            _ => ServiceResponse::error(404, "Not found"),
        }
    }

    fn top(&self, query: &str) -> ServiceResponse {
        if let Some(reason) = &self.outage {
            log::warn!("highscores: {}", reason);
            return ServiceResponse::error(500, "Internal Server Error");
        }
        let limit = parse_limit(query) as usize;
        let mut rows: Vec<&StoredScore> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            b.entry
                .score
                .cmp(&a.entry.score)
                .then_with(|| a.entry.created_at.cmp(&b.entry.created_at))
                .then_with(|| a.seq.cmp(&b.seq))
        });
        let top: Vec<&LeaderboardEntry> = rows.into_iter().take(limit).map(|r| &r.entry).collect();
        ServiceResponse::json(200, json!(top))
    }

    fn insert(&mut self, body: &str) -> ServiceResponse {
        let Ok(data) = serde_json::from_str::<Value>(body) else {
            return ServiceResponse::error(400, "Missing player or score");
        };
        let (Some(player), Some(score)) = (data.get("player"), data.get("score")) else {
            return ServiceResponse::error(400, "Missing player or score");
        };
        let Some(player) = player.as_str().map(str::trim).filter(|p| !p.is_empty()) else {
            return ServiceResponse::error(400, "Invalid player name");
        };
        let Some(score) = numeric_score(score) else {
            return ServiceResponse::error(400, "Invalid score");
        };
        if player.chars().count() > MAX_NAME_LEN {
            return ServiceResponse::error(400, "Player name too long");
        }
        if let Some(reason) = &self.outage {
            log::warn!("scores: {}", reason);
            return ServiceResponse::error(500, "Database error");
        }

        self.next_seq += 1;
        self.rows.push(StoredScore {
            entry: LeaderboardEntry {
                player: player.to_string(),
                score,
                created_at: format_timestamp(self.clock.epoch_ms()),
            },
            seq: self.next_seq,
        });
        ServiceResponse::json(200, json!({ "success": true }))
    }
}

/// Pull `limit` out of a query string and clamp it. Missing or non-integer
/// values mean the default.
fn parse_limit(query: &str) -> u32 {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "limit")
        .and_then(|(_, value)| value.parse::<i64>().ok())
        .map_or(DEFAULT_LIMIT, normalize_limit)
}

/// Integers, integral floats and numeric strings are accepted; fractions are
/// truncated, negatives rejected.
fn numeric_score(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() || n < 0.0 || n > u32::MAX as f64 {
        return None;
    }
    Some(n.trunc() as u32)
}

/// [`ScoreTransport`] over a shared [`MemoryScoreService`]. Completions are
/// queued and delivered on the next [`ScoreTransport::poll`], like a real
/// request finishing after the current frame.
#[derive(Clone)]
pub struct LocalTransport {
    service: Rc<RefCell<MemoryScoreService>>,
    completed: Rc<RefCell<Vec<TransportEvent>>>,
    requests: Rc<RefCell<u32>>,
}

impl LocalTransport {
    pub fn new(service: Rc<RefCell<MemoryScoreService>>) -> Self {
        Self {
            service,
            completed: Rc::default(),
            requests: Rc::default(),
        }
    }

    pub fn service(&self) -> &Rc<RefCell<MemoryScoreService>> {
        &self.service
    }

    /// Requests sent so far
    pub fn request_count(&self) -> u32 {
        *self.requests.borrow()
    }

    fn send(&self, method: &str, target: &str, body: &str) -> ServiceResponse {
        *self.requests.borrow_mut() += 1;
        log::debug!("{} {}", method, target);
        self.service.borrow_mut().handle(method, target, body)
    }
}

impl ScoreTransport for LocalTransport {
    fn fetch_top(&mut self, limit: u32) {
        let response = self.send("GET", &format!("/highscores?limit={limit}"), "");
        self.completed
            .borrow_mut()
            .push(TransportEvent::TopLoaded(decode_top(
                response.status,
                &response.body,
            )));
    }

    fn submit(&mut self, submission: ScoreSubmission) {
        let body = json!({ "player": submission.player, "score": submission.score }).to_string();
        let response = self.send("POST", "/scores", &body);
        self.completed.borrow_mut().push(TransportEvent::Submitted {
            submission,
            result: decode_submit(response.status, &response.body),
        });
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        std::mem::take(&mut *self.completed.borrow_mut())
    }
}
