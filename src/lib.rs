//! El-vis - swim between the pillars, don't touch anything
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player physics, obstacles, collisions)
//! - `game`: Idle / Playing / GameOver state machine and frame loop
//! - `renderer`: 2D scene drawing through a `Surface` trait
//! - `platform`: Input, frame scheduling, clocks and key-value storage
//! - `persistence`: Local best score
//! - `highscores`: Remote leaderboard client and an in-memory service
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences
//! - `ui`: Overlay UI capability

pub mod error;
pub mod game;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use error::{LeaderboardError, NetworkError, StorageError, TuningError, ValidationError};
pub use game::{FrameTimer, Game, Phase, Ports};
pub use settings::Settings;
pub use tuning::Tuning;
