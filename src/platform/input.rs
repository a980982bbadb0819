//! Input normalization
//!
//! Keyboard, pointer and touch events collapse into two logical signals.
//! Events aimed at overlay UI (save-score panel, play-again, restart) never
//! reach the game.

use crate::ui::UiRegion;

/// Logical game input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Press: starts a run, restarts after game over, or begins lifting
    Activate,
    /// Release: stop lifting
    Release,
}

/// Physical event kinds the host forwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawKind {
    /// `KeyboardEvent.code`
    KeyDown(String),
    KeyUp(String),
    PointerDown,
    PointerUp,
    TouchStart,
    TouchEnd,
    TouchMove,
}

/// A host event plus the element ids from its target up to the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    pub kind: RawKind,
    pub target_ancestry: Vec<String>,
}

impl RawInput {
    pub fn new(kind: RawKind) -> Self {
        Self {
            kind,
            target_ancestry: Vec::new(),
        }
    }

    pub fn with_target<I, S>(kind: RawKind, ancestry: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            target_ancestry: ancestry.into_iter().map(Into::into).collect(),
        }
    }
}

/// What the adapter decided about one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Game(Signal),
    /// Event belongs to overlay UI; the host must let it through untouched
    Ui(UiRegion),
    /// Not an input the game cares about, but the host should still swallow
    /// its default action (e.g. touch scrolling)
    Swallow,
    Ignore,
}

/// Maps raw events to signals
#[derive(Debug, Clone)]
pub struct InputAdapter {
    activation_keys: Vec<String>,
}

impl Default for InputAdapter {
    fn default() -> Self {
        Self {
            activation_keys: vec!["Space".to_string()],
        }
    }
}

impl InputAdapter {
    /// Closest ancestor (target included) that is an overlay region
    pub fn ui_target(ancestry: &[String]) -> Option<UiRegion> {
        ancestry
            .iter()
            .find_map(|id| UiRegion::INTERACTIVE.into_iter().find(|r| r.dom_id() == id.as_str()))
    }

    pub fn route(&self, input: &RawInput) -> Routed {
        if let Some(region) = Self::ui_target(&input.target_ancestry) {
            log::debug!("Input {:?} belongs to {:?}, not the game", input.kind, region);
            return Routed::Ui(region);
        }

        match &input.kind {
            RawKind::KeyDown(code) if self.is_activation_key(code) => {
                Routed::Game(Signal::Activate)
            }
            RawKind::KeyUp(code) if self.is_activation_key(code) => Routed::Game(Signal::Release),
            RawKind::KeyDown(_) | RawKind::KeyUp(_) => Routed::Ignore,
            RawKind::PointerDown | RawKind::TouchStart => Routed::Game(Signal::Activate),
            RawKind::PointerUp | RawKind::TouchEnd => Routed::Game(Signal::Release),
            RawKind::TouchMove => Routed::Swallow,
        }
    }

    fn is_activation_key(&self, code: &str) -> bool {
        self.activation_keys.iter().any(|k| k == code)
    }
}

/// Activation flag: set by a press, cleared by a release, sampled once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationLatch {
    held: bool,
}

impl ActivationLatch {
    pub fn press(&mut self) {
        self.held = true;
    }

    pub fn release(&mut self) {
        self.held = false;
    }

    /// Value the current frame's physics observes
    #[inline]
    pub fn sample(&self) -> bool {
        self.held
    }
}
