//! Remote leaderboard client
//!
//! Talks to the scoring service through a [`ScoreTransport`]. Requests are
//! fire-and-forget: results come back through [`ScoreTransport::poll`] and are
//! applied between frames, so the render loop never waits on the network.

pub mod service;

#[cfg(target_arch = "wasm32")]
pub mod fetch;

use serde::{Deserialize, Serialize};

use crate::error::{LeaderboardError, NetworkError, ValidationError};

/// Rows returned when no limit is given (or the given one is unusable)
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page the service hands out
pub const MAX_LIMIT: u32 = 100;
/// Longest accepted player name, in characters
pub const MAX_NAME_LEN: usize = 10;

/// One leaderboard row as the service returns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: String,
    pub score: u32,
    /// `YYYY-MM-DD HH:MM:SS`, as stored by the service
    pub created_at: String,
}

/// Body of a score submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub player: String,
    pub score: u32,
}

/// Error body the service sends with non-success statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SuccessBody {
    success: bool,
}

/// Clamp a requested page size: above the maximum → maximum, below one →
/// default.
pub fn normalize_limit(requested: i64) -> u32 {
    if requested < 1 {
        DEFAULT_LIMIT
    } else {
        requested.min(MAX_LIMIT as i64) as u32
    }
}

/// Check a name before anything goes over the wire. Returns the trimmed name.
pub fn validate_name(name: &str, max_len: usize) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let len = name.chars().count();
    if len > max_len {
        return Err(ValidationError::NameTooLong { len, max: max_len });
    }
    Ok(name.to_string())
}

fn status_error(status: u16, body: &str) -> NetworkError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.chars().take(120).collect());
    NetworkError::Status {
        code: status,
        message,
    }
}

/// Interpret a `GET /highscores` response
pub fn decode_top(status: u16, body: &str) -> Result<Vec<LeaderboardEntry>, NetworkError> {
    if !(200..300).contains(&status) {
        return Err(status_error(status, body));
    }
    serde_json::from_str(body).map_err(|e| NetworkError::Decode(e.to_string()))
}

/// Interpret a `POST /scores` response
pub fn decode_submit(status: u16, body: &str) -> Result<(), NetworkError> {
    if !(200..300).contains(&status) {
        return Err(status_error(status, body));
    }
    match serde_json::from_str::<SuccessBody>(body) {
        Ok(SuccessBody { success: true }) => Ok(()),
        Ok(_) => Err(NetworkError::Decode("success flag not set".into())),
        Err(e) => Err(NetworkError::Decode(e.to_string())),
    }
}

/// Completed request, delivered by [`ScoreTransport::poll`]
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    TopLoaded(Result<Vec<LeaderboardEntry>, NetworkError>),
    Submitted {
        submission: ScoreSubmission,
        result: Result<(), NetworkError>,
    },
}

/// Fire-and-forget access to the scoring service
pub trait ScoreTransport {
    fn fetch_top(&mut self, limit: u32);
    fn submit(&mut self, submission: ScoreSubmission);
    /// Drain requests that finished since the last call
    fn poll(&mut self) -> Vec<TransportEvent>;
}

/// What changed after applying finished requests
#[derive(Debug, Clone, PartialEq)]
pub enum ClientUpdate {
    Refreshed { entries: usize },
    RefreshFailed(NetworkError),
    Submitted(ScoreSubmission),
    SubmitFailed {
        submission: ScoreSubmission,
        error: NetworkError,
    },
}

pub struct LeaderboardClient {
    transport: Box<dyn ScoreTransport>,
    /// Last list received; replaced whole on every successful fetch
    entries: Vec<LeaderboardEntry>,
    limit: u32,
    max_name_len: usize,
    /// Submission that failed and can be retried
    failed: Option<ScoreSubmission>,
}

impl LeaderboardClient {
    pub fn new(transport: Box<dyn ScoreTransport>, limit: i64, max_name_len: usize) -> Self {
        Self {
            transport,
            entries: Vec::new(),
            limit: normalize_limit(limit),
            max_name_len,
            failed: None,
        }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Ask for the current top list
    pub fn refresh(&mut self) {
        self.transport.fetch_top(self.limit);
    }

    /// Validate and send a score. Invalid names never reach the transport.
    pub fn submit(&mut self, name: &str, score: u32) -> Result<ScoreSubmission, LeaderboardError> {
        let player = validate_name(name, self.max_name_len)?;
        let submission = ScoreSubmission { player, score };
        log::info!(
            "Submitting score {} for {}",
            submission.score,
            submission.player
        );
        self.failed = None;
        self.transport.submit(submission.clone());
        Ok(submission)
    }

    pub fn failed_submission(&self) -> Option<&ScoreSubmission> {
        self.failed.as_ref()
    }

    /// Send the last failed submission again. Returns false if there is none.
    pub fn retry_failed(&mut self) -> bool {
        match self.failed.take() {
            Some(submission) => {
                log::info!("Retrying submission for {}", submission.player);
                self.transport.submit(submission);
                true
            }
            None => false,
        }
    }

    pub fn discard_failed(&mut self) {
        if let Some(submission) = self.failed.take() {
            log::info!("Discarded submission for {}", submission.player);
        }
    }

    /// Apply finished requests
    pub fn poll(&mut self) -> Vec<ClientUpdate> {
        self.transport
            .poll()
            .into_iter()
            .map(|event| match event {
                TransportEvent::TopLoaded(Ok(entries)) => {
                    log::info!("Leaderboard refreshed ({} entries)", entries.len());
                    self.entries = entries;
                    ClientUpdate::Refreshed {
                        entries: self.entries.len(),
                    }
                }
                TransportEvent::TopLoaded(Err(error)) => {
                    log::warn!("Cannot fetch highscores: {}", error);
                    ClientUpdate::RefreshFailed(error)
                }
                TransportEvent::Submitted {
                    submission,
                    result: Ok(()),
                } => ClientUpdate::Submitted(submission),
                TransportEvent::Submitted {
                    submission,
                    result: Err(error),
                } => {
                    log::warn!("Score submission failed: {}", error);
                    self.failed = Some(submission.clone());
                    ClientUpdate::SubmitFailed { submission, error }
                }
            })
            .collect()
    }
}
