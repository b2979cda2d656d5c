use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gloo_timers::future::TimeoutFuture;
use js_sys::Function;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::config::{Difficulty, GameConfig};
use crate::error::ConfigError;
use crate::game::{GameEvent, GameSession};
use crate::scheduler::{Scheduler, Task, TaskHandle};

type SharedSession = Rc<RefCell<GameSession<BrowserScheduler>>>;

/// Runs tasks on the browser event loop through `setTimeout`.
pub struct BrowserScheduler {
    session: Weak<RefCell<GameSession<BrowserScheduler>>>,
    listener: Option<Function>,
    next_id: u64,
    live: HashMap<TaskHandle, Rc<Cell<bool>>>,
    emitting: bool,
}

impl BrowserScheduler {
    fn new(session: Weak<RefCell<GameSession<BrowserScheduler>>>, listener: Option<Function>) -> Self {
        Self {
            session,
            listener,
            next_id: 0,
            live: HashMap::new(),
            emitting: false,
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&mut self, _task: Task, delay: Duration) -> TaskHandle {
        let handle = TaskHandle::new(self.next_id);
        self.next_id += 1;

        let canceled = Rc::new(Cell::new(false));
        self.live.insert(handle, Rc::clone(&canceled));

        let session = self.session.clone();
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        spawn_local(async move {
            TimeoutFuture::new(millis).await;
            if canceled.get() {
                return;
            }
            if let Some(session) = session.upgrade() {
                deliver(&session, handle);
            }
        });

        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        if let Some(canceled) = self.live.remove(&handle) {
            canceled.set(true);
        }
    }
}

fn deliver(session: &SharedSession, handle: TaskHandle) {
    {
        let mut session = session.borrow_mut();
        session.scheduler_mut().live.remove(&handle);
        session.fire(handle);
    }
    notify(session);
}

/// Forwards queued events to the JS listener. The session is not borrowed
/// while the listener runs, so it may call back into the game. A nested call
/// only queues; the outermost call keeps draining until the queue is empty,
/// so the listener sees events in the order the session produced them.
fn notify(session: &SharedSession) {
    {
        let mut session = session.borrow_mut();
        if session.scheduler().emitting {
            return;
        }
        session.scheduler_mut().emitting = true;
    }

    loop {
        let (events, listener) = {
            let mut session = session.borrow_mut();
            let events = session.drain_events();
            if events.is_empty() {
                session.scheduler_mut().emitting = false;
                return;
            }
            (events, session.scheduler().listener.clone())
        };
        let Some(listener) = listener else {
            continue;
        };
        for event in events {
            emit(&listener, &event);
        }
    }
}

fn emit(listener: &Function, event: &GameEvent) {
    match to_value(event) {
        Ok(value) => {
            if let Err(err) = listener.call1(&JsValue::NULL, &value) {
                tracing::warn!(?err, "event listener threw");
            }
        }
        Err(err) => tracing::warn!(%err, "failed to serialize event"),
    }
}

fn to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}

#[wasm_bindgen]
pub struct WasmGame {
    session: SharedSession,
}

#[wasm_bindgen]
impl WasmGame {
    /// `config` is an optional `{ difficulty, timeLimitSecs, computerDelayMs, seed }`
    /// object; `listener` receives every game event.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, listener: Option<Function>) -> Result<WasmGame, JsValue> {
        let config: GameConfig = if config.is_undefined() || config.is_null() {
            GameConfig::default()
        } else {
            from_value(config).map_err(|err| to_js_error(ConfigError::Invalid(err.to_string())))?
        };

        let session = Rc::new_cyclic(|weak| {
            RefCell::new(GameSession::new(
                config,
                BrowserScheduler::new(weak.clone(), listener),
            ))
        });
        let game = WasmGame { session };
        notify(&game.session);
        Ok(game)
    }

    pub fn start_new_game(&self, difficulty: &str, time_limit_secs: u32) -> Result<(), JsValue> {
        let difficulty: Difficulty = difficulty.parse().map_err(to_js_error)?;
        self.session
            .borrow_mut()
            .start_new_game(difficulty, time_limit_secs);
        notify(&self.session);
        Ok(())
    }

    /// Returns whether the move was accepted.
    pub fn submit_move(&self, row: u8, col: u8) -> bool {
        let accepted = self.session.borrow_mut().submit_human_move(row, col).is_ok();
        notify(&self.session);
        accepted
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_value(&self.session.borrow().to_game_state()).map_err(to_js_error)
    }

    /// `undefined` until the game is over.
    pub fn result(&self) -> Result<JsValue, JsValue> {
        to_value(&self.session.borrow().result()).map_err(to_js_error)
    }

    pub fn legal_moves(&self) -> Result<JsValue, JsValue> {
        to_value(&self.session.borrow().legal_moves()).map_err(to_js_error)
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        self.session.borrow().remaining_seconds()
    }

    pub fn is_game_over(&self) -> bool {
        self.session.borrow().is_game_over()
    }
}
