//! El-vis entry point
//!
//! On the web this wires the DOM to the game. Natively it runs a headless
//! autopilot session against the in-memory leaderboard.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(not(target_arch = "wasm32"))]
use el_vis::tuning::Tuning;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, Element, Event, HtmlCanvasElement, HtmlInputElement, KeyboardEvent, PointerEvent,
    };

    use el_vis::highscores::fetch::FetchTransport;
    use el_vis::platform::input::{RawInput, RawKind, Routed};
    use el_vis::platform::scheduler::raf::RafScheduler;
    use el_vis::platform::storage::{KeyValueStore, LocalStorage, MemoryStorage};
    use el_vis::platform::time::{Clock, PerformanceClock};
    use el_vis::renderer::Sprite;
    use el_vis::renderer::canvas::CanvasSurface;
    use el_vis::ui::UiRegion;
    use el_vis::ui::dom::DomUi;
    use el_vis::{Game, Ports, Tuning};

    type SharedGame = Rc<RefCell<Game>>;

    /// How often finished requests are applied while the loop is stopped
    const NETWORK_POLL_MS: i32 = 250;

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("El-vis starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .ok_or("no #gameCanvas")?
            .dyn_into()?;

        let tuning = Tuning::default();
        let surface = CanvasSurface::new(canvas, tuning.surface())?;
        let scheduler = RafScheduler::new();
        let storage: Box<dyn KeyValueStore> = match LocalStorage::open() {
            Some(storage) => Box::new(storage),
            None => {
                log::warn!("localStorage unavailable, best score will not persist");
                Box::new(MemoryStorage::new())
            }
        };
        let clock = PerformanceClock;
        let seed = clock.epoch_ms() as u64;

        let ports = Ports {
            scheduler: Box::new(scheduler.clone()),
            ui: Box::new(DomUi::new(document.clone())),
            surface: Box::new(surface.clone()),
            transport: Box::new(FetchTransport::new("")),
            storage,
            clock: Box::new(clock),
        };
        let game: SharedGame = Rc::new(RefCell::new(Game::new(tuning, ports, seed)));
        log::info!("Game initialized with seed: {}", seed);

        {
            let game = game.clone();
            scheduler.install(Closure::new(move |timestamp: f64| {
                game.borrow_mut().on_frame(timestamp);
            }));
        }

        setup_input_handlers(&document, game.clone());
        setup_overlay_buttons(&document, game.clone());
        setup_resize(&window, surface.clone(), game.clone());
        setup_network_poll(&window, game.clone())?;
        setup_visibility(&document, game.clone());

        // First frame waits for the player sprite; a missing sprite still boots
        match surface.image(Sprite::Player) {
            Some(img) if !img.complete() => {
                let onload = {
                    let game = game.clone();
                    Closure::once(move || game.borrow_mut().boot())
                };
                let onerror = {
                    let game = game.clone();
                    Closure::once(move || {
                        log::warn!("Could not load {}", Sprite::Player.path());
                        game.borrow_mut().boot();
                    })
                };
                img.set_onload(Some(onload.as_ref().unchecked_ref()));
                img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
                onload.forget();
                onerror.forget();
            }
            _ => game.borrow_mut().boot(),
        }

        log::info!("El-vis running!");
        Ok(())
    }

    /// Element ids from the event target up to the root
    fn target_ancestry(event: &Event) -> Vec<String> {
        let mut ids = Vec::new();
        let mut node = event.target().and_then(|t| t.dyn_into::<Element>().ok());
        while let Some(el) = node {
            let id = el.id();
            if !id.is_empty() {
                ids.push(id);
            }
            node = el.parent_element();
        }
        ids
    }

    fn forward(game: &SharedGame, event: &Event, kind: RawKind) {
        let input = RawInput {
            kind,
            target_ancestry: target_ancestry(event),
        };
        let routed = game.borrow_mut().handle_input(&input);
        if matches!(routed, Routed::Game(_) | Routed::Swallow) {
            event.prevent_default();
        }
    }

    fn listen<E, F>(target: &web_sys::EventTarget, name: &str, mut handler: F)
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Ok(event) = event.dyn_into::<E>() {
                handler(event);
            }
        });
        let _ = target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(document: &Document, game: SharedGame) {
        {
            let game = game.clone();
            listen(document, "keydown", move |event: KeyboardEvent| {
                let kind = RawKind::KeyDown(event.code());
                forward(&game, &event, kind);
            });
        }
        {
            let game = game.clone();
            listen(document, "keyup", move |event: KeyboardEvent| {
                let kind = RawKind::KeyUp(event.code());
                forward(&game, &event, kind);
            });
        }

        // Touch arrives as touch events; pointer events cover mouse and pen
        for (name, kind) in [
            ("pointerdown", RawKind::PointerDown),
            ("pointerup", RawKind::PointerUp),
        ] {
            let game = game.clone();
            listen(document, name, move |event: PointerEvent| {
                if event.pointer_type() != "touch" {
                    forward(&game, &event, kind.clone());
                }
            });
        }
        for (name, kind) in [
            ("touchstart", RawKind::TouchStart),
            ("touchend", RawKind::TouchEnd),
            ("touchmove", RawKind::TouchMove),
        ] {
            let game = game.clone();
            listen(document, name, move |event: Event| {
                forward(&game, &event, kind.clone());
            });
        }
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut(Event) + 'static) {
        match document.get_element_by_id(id) {
            Some(el) => listen(&el, "click", handler),
            None => log::debug!("No #{} in page", id),
        }
    }

    fn player_name(document: &Document) -> String {
        document
            .get_element_by_id("playerName")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
            .unwrap_or_default()
    }

    fn setup_overlay_buttons(document: &Document, game: SharedGame) {
        {
            let game = game.clone();
            on_click(document, "saveScoreBtn", move |event| {
                event.stop_propagation();
                game.borrow_mut().begin_save();
            });
        }
        {
            let game = game.clone();
            let doc = document.clone();
            on_click(document, "confirmSaveBtn", move |event| {
                event.stop_propagation();
                let _ = game.borrow_mut().submit_score(&player_name(&doc));
            });
        }
        if let Some(input) = document.get_element_by_id("playerName") {
            let game = game.clone();
            let doc = document.clone();
            listen(&input, "keydown", move |event: KeyboardEvent| {
                if event.key() == "Enter" {
                    event.prevent_default();
                    let _ = game.borrow_mut().submit_score(&player_name(&doc));
                }
            });
        }
        for id in ["playAgainBtn", "restartBtn"] {
            let game = game.clone();
            on_click(document, id, move |event| {
                event.stop_propagation();
                game.borrow_mut().play_again();
            });
        }
        {
            let game = game.clone();
            on_click(document, "retrySaveBtn", move |_| {
                game.borrow_mut().retry_submission();
            });
        }
        {
            let game = game.clone();
            on_click(document, "discardSaveBtn", move |_| {
                game.borrow_mut().discard_submission();
            });
        }
        {
            let doc = document.clone();
            on_click(document, "notification-close", move |_| {
                if let Some(panel) = doc
                    .get_element_by_id(UiRegion::Notification.dom_id())
                    .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
                {
                    let _ = panel.style().set_property("display", "none");
                }
            });
        }
    }

    fn setup_resize(window: &web_sys::Window, surface: CanvasSurface, game: SharedGame) {
        {
            let surface = surface.clone();
            let game = game.clone();
            listen(window, "resize", move |_: Event| {
                surface.fit_to_viewport();
                game.borrow_mut().redraw();
            });
        }
        // Viewport size settles a moment after rotation
        listen(window, "orientationchange", move |_: Event| {
            let surface = surface.clone();
            let game = game.clone();
            let refit = Closure::once(move || {
                surface.fit_to_viewport();
                game.borrow_mut().redraw();
            });
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    refit.as_ref().unchecked_ref(),
                    200,
                );
            }
            refit.forget();
        });
    }

    /// Stop the loop while the tab is hidden, pick it up again on return
    fn setup_visibility(document: &Document, game: SharedGame) {
        let doc = document.clone();
        listen(document, "visibilitychange", move |_: Event| {
            let mut game = game.borrow_mut();
            if doc.visibility_state() == web_sys::VisibilityState::Hidden {
                game.suspend();
            } else {
                game.resume();
            }
        });
    }

    fn setup_network_poll(window: &web_sys::Window, game: SharedGame) -> Result<(), JsValue> {
        let closure = Closure::<dyn FnMut()>::new(move || {
            // Skip if a handler is running; the next tick catches up
            if let Ok(mut game) = game.try_borrow_mut() {
                if !game.is_looping() {
                    game.pump_network();
                }
            }
        });
        window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            NETWORK_POLL_MS,
        )?;
        closure.forget();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::rc::Rc;

    use el_vis::highscores::service::{LocalTransport, MemoryScoreService};
    use el_vis::platform::input::Signal;
    use el_vis::platform::scheduler::ManualScheduler;
    use el_vis::platform::storage::MemoryStorage;
    use el_vis::platform::time::{Clock, ManualClock, SystemClock};
    use el_vis::renderer::RecordingSurface;
    use el_vis::ui::LogUi;
    use el_vis::{Game, Phase, Ports, Tuning};

    /// Two minutes of simulated play
    const MAX_FRAMES: u32 = 60 * 120;
    /// Player centre may sit this far below the target before lifting
    const DEADBAND: f32 = 10.0;

    struct Session {
        game: Game,
        scheduler: ManualScheduler,
        clock: ManualClock,
        now: f64,
    }

    impl Session {
        fn frame(&mut self) -> bool {
            self.now += self.game.tuning().step_ms();
            self.clock.set(self.now);
            match self.scheduler.take_next() {
                Some(_) => {
                    self.game.on_frame(self.now);
                    true
                }
                None => false,
            }
        }
    }

    /// Lift whenever the player sits below the centre of the next gap
    fn wants_lift(game: &Game) -> bool {
        let tuning = game.tuning();
        let run = game.run();
        let target = run
            .obstacles
            .iter()
            .find(|pair| pair.trailing_edge(tuning) > run.player.x)
            .map(|pair| pair.gap_top + tuning.obstacle_gap / 2.0)
            .unwrap_or(tuning.surface_height / 2.0);
        run.player.hitbox(tuning).center.y > target + DEADBAND
    }

    pub fn run(tuning: Tuning) {
        let epoch = SystemClock::default().epoch_ms();
        let clock = ManualClock::new(epoch);
        let scheduler = ManualScheduler::new();
        let service = Rc::new(RefCell::new(MemoryScoreService::new(Box::new(clock.clone()))));
        for (player, score) in [("Zed", 12), ("Max", 3)] {
            let body = format!(r#"{{"player":"{player}","score":{score}}}"#);
            service.borrow_mut().handle("POST", "/scores", &body);
        }

        let ports = Ports {
            scheduler: Box::new(scheduler.clone()),
            ui: Box::new(LogUi),
            surface: Box::new(RecordingSurface::new(tuning.surface())),
            transport: Box::new(LocalTransport::new(service)),
            storage: Box::new(MemoryStorage::new()),
            clock: Box::new(clock.clone()),
        };
        let mut session = Session {
            game: Game::new(tuning, ports, epoch as u64),
            scheduler,
            clock,
            now: 0.0,
        };
        session.game.boot();

        for _ in 0..30 {
            session.frame();
        }

        session.game.on_signal(Signal::Activate);
        let mut held = true;
        let mut frames = 0;
        while session.game.phase() == Phase::Playing && frames < MAX_FRAMES {
            let lift = wants_lift(&session.game);
            if lift != held {
                session
                    .game
                    .on_signal(if lift { Signal::Activate } else { Signal::Release });
                held = lift;
            }
            if !session.frame() {
                break;
            }
            frames += 1;
        }

        let score = session.game.run().score;
        log::info!("Autopilot scored {} in {} frames", score, frames);

        if session.game.phase() == Phase::GameOver && score > 0 {
            if let Err(e) = session.game.submit_score("autopilot") {
                log::warn!("Could not submit: {}", e);
            }
        } else {
            session.game.play_again();
        }
        // Submission completes, then the refresh it triggers
        for _ in 0..3 {
            session.frame();
        }

        for (i, entry) in session.game.leaderboard().iter().enumerate() {
            log::info!(
                "{}. {}: {} ({})",
                i + 1,
                entry.player,
                entry.score,
                entry.created_at
            );
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("El-vis (native, headless) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::error!("Bad tuning file {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => Tuning::default(),
    };

    headless::run(tuning);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
