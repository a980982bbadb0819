//! Overlay UI capability
//!
//! The state machine never touches a document tree. It shows and hides named
//! regions, fills named text slots, and raises transient notices through
//! [`UiPorts`]; the host decides what that means.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Named overlay regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiRegion {
    /// Game-over panel holding scores, the save flow and play-again
    SaveScorePanel,
    /// "Save Score" button inside the panel
    SaveScoreButton,
    /// Name entry + confirm
    NameInput,
    PlayAgain,
    Restart,
    /// How-to-play blurb shown while idle
    Intro,
    Notification,
}

impl UiRegion {
    /// Regions whose events must never be read as game input
    pub const INTERACTIVE: [UiRegion; 3] = [
        UiRegion::SaveScorePanel,
        UiRegion::PlayAgain,
        UiRegion::Restart,
    ];

    pub fn dom_id(&self) -> &'static str {
        match self {
            UiRegion::SaveScorePanel => "saveScoreContainer",
            UiRegion::SaveScoreButton => "saveScoreBtn",
            UiRegion::NameInput => "nameInputContainer",
            UiRegion::PlayAgain => "playAgainBtn",
            UiRegion::Restart => "restartBtn",
            UiRegion::Intro => "intro",
            UiRegion::Notification => "notification",
        }
    }
}

/// Named text slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiText {
    GameOverScore,
    GameOverHighScore,
    GameOverHighScoreDate,
    /// Name input value
    PlayerName,
}

impl UiText {
    pub fn dom_id(&self) -> &'static str {
        match self {
            UiText::GameOverScore => "gameOverScore",
            UiText::GameOverHighScore => "gameOverHighScore",
            UiText::GameOverHighScoreDate => "gameOverHighScoreDate",
            UiText::PlayerName => "playerName",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient, dismissible message that expires on its own
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub ttl_ms: f64,
}

impl Notice {
    pub fn info(message: impl Into<String>, ttl_ms: f64) -> Self {
        Self {
            message: message.into(),
            level: NoticeLevel::Info,
            ttl_ms,
        }
    }

    pub fn error(message: impl Into<String>, ttl_ms: f64) -> Self {
        Self {
            message: message.into(),
            level: NoticeLevel::Error,
            ttl_ms,
        }
    }
}

/// What the state machine may ask of the overlay UI
pub trait UiPorts {
    fn show(&mut self, region: UiRegion);
    fn hide(&mut self, region: UiRegion);
    fn set_text(&mut self, slot: UiText, text: &str);
    fn notify(&mut self, notice: Notice);
}

/// UI for headless hosts: everything goes to the log
#[derive(Debug, Default)]
pub struct LogUi;

impl UiPorts for LogUi {
    fn show(&mut self, region: UiRegion) {
        log::debug!("ui: show {:?}", region);
    }

    fn hide(&mut self, region: UiRegion) {
        log::debug!("ui: hide {:?}", region);
    }

    fn set_text(&mut self, slot: UiText, text: &str) {
        log::debug!("ui: {:?} = {:?}", slot, text);
    }

    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => log::info!("notice: {}", notice.message),
            NoticeLevel::Error => log::warn!("notice: {}", notice.message),
        }
    }
}

#[derive(Debug, Default)]
struct RecordedUi {
    visible: HashSet<UiRegion>,
    texts: HashMap<UiText, String>,
    notices: Vec<Notice>,
}

/// UI that only remembers what it was told. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingUi {
    inner: Rc<RefCell<RecordedUi>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, region: UiRegion) -> bool {
        self.inner.borrow().visible.contains(&region)
    }

    pub fn text(&self, slot: UiText) -> Option<String> {
        self.inner.borrow().texts.get(&slot).cloned()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.inner.borrow().notices.clone()
    }

    pub fn last_notice(&self) -> Option<Notice> {
        self.inner.borrow().notices.last().cloned()
    }
}

impl UiPorts for RecordingUi {
    fn show(&mut self, region: UiRegion) {
        self.inner.borrow_mut().visible.insert(region);
    }

    fn hide(&mut self, region: UiRegion) {
        self.inner.borrow_mut().visible.remove(&region);
    }

    fn set_text(&mut self, slot: UiText, text: &str) {
        self.inner.borrow_mut().texts.insert(slot, text.to_string());
    }

    fn notify(&mut self, notice: Notice) {
        self.inner.borrow_mut().notices.push(notice);
    }
}

/// DOM-backed UI (WASM only)
#[cfg(target_arch = "wasm32")]
pub mod dom {
    use std::cell::Cell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, HtmlInputElement};

    use super::{Notice, NoticeLevel, UiPorts, UiRegion, UiText};

    pub struct DomUi {
        document: Document,
        /// Bumped per notice so an older timer cannot hide a newer notice
        notice_generation: Rc<Cell<u32>>,
    }

    impl DomUi {
        pub fn new(document: Document) -> Self {
            Self {
                document,
                notice_generation: Rc::new(Cell::new(0)),
            }
        }

        fn element(&self, id: &str) -> Option<HtmlElement> {
            self.document
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        }

        fn set_display(&self, region: UiRegion, display: &str) {
            if let Some(el) = self.element(region.dom_id()) {
                let _ = el.style().set_property("display", display);
            }
        }
    }

    impl UiPorts for DomUi {
        fn show(&mut self, region: UiRegion) {
            let display = match region {
                UiRegion::SaveScoreButton => "inline-block",
                _ => "block",
            };
            self.set_display(region, display);
        }

        fn hide(&mut self, region: UiRegion) {
            self.set_display(region, "none");
        }

        fn set_text(&mut self, slot: UiText, text: &str) {
            let Some(el) = self.document.get_element_by_id(slot.dom_id()) else {
                return;
            };
            match el.dyn_into::<HtmlInputElement>() {
                Ok(input) => input.set_value(text),
                Err(el) => el.set_text_content(Some(text)),
            }
        }

        fn notify(&mut self, notice: Notice) {
            let Some(panel) = self.element(UiRegion::Notification.dom_id()) else {
                log::warn!("notice (no panel): {}", notice.message);
                return;
            };
            if let Some(msg) = self.document.get_element_by_id("notification-message") {
                msg.set_text_content(Some(&notice.message));
            }
            let class = match notice.level {
                NoticeLevel::Info => "notification",
                NoticeLevel::Error => "notification notification--error",
            };
            panel.set_class_name(class);
            let _ = panel.style().set_property("display", "block");

            let generation = self.notice_generation.get().wrapping_add(1);
            self.notice_generation.set(generation);
            let current = self.notice_generation.clone();
            let closure = Closure::once(move || {
                if current.get() == generation {
                    let _ = panel.style().set_property("display", "none");
                }
            });
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    notice.ttl_ms as i32,
                );
            }
            closure.forget();
        }
    }
}
