//! Browser shell
//!
//! `FruitFusion` owns one canvas inside a host element, one animation frame
//! loop and the DOM listeners feeding pointer input to [`GameHost`]. Every
//! closure holds a weak handle to the shared state, so dropping the shell
//! or unmounting releases everything.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, HtmlCanvasElement, HtmlElement, HtmlImageElement, MouseEvent, TouchEvent};

use crate::app::{GameHost, HostListener};
use crate::error::{GameError, GameResult};
use crate::renderer::{AssetRegistry, WebCanvas, render_frame};
use crate::settings::Settings;
use crate::sim::{FRUIT_LEVELS, GameMode};
use crate::tuning::Tuning;

/// Where level sprites are served from
const SPRITE_BASE: &str = "assets/fruits/";

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A second init (module reloaded) is harmless
    let _ = console_log::init_with_level(log::Level::Info);
}

impl From<GameError> for JsValue {
    fn from(err: GameError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Notifications queued while the host is borrowed and delivered after
#[derive(Debug, Clone, Copy)]
enum Notice {
    Score(u64),
    GameOver(u64),
    NextLevel(usize),
    Lives(u8),
}

#[derive(Default)]
struct Callbacks {
    score: Option<js_sys::Function>,
    game_over: Option<js_sys::Function>,
    next_level: Option<js_sys::Function>,
    lives: Option<js_sys::Function>,
}

impl Callbacks {
    fn deliver(&self, notice: Notice) {
        let (callback, value) = match notice {
            Notice::Score(score) => (&self.score, JsValue::from_f64(score as f64)),
            Notice::GameOver(score) => (&self.game_over, JsValue::from_f64(score as f64)),
            Notice::NextLevel(level) => (&self.next_level, JsValue::from_f64(level as f64)),
            Notice::Lives(lives) => (&self.lives, JsValue::from_f64(lives as f64)),
        };
        if let Some(callback) = callback
            && let Err(err) = callback.call1(&JsValue::NULL, &value)
        {
            log::warn!("UI callback threw: {:?}", err);
        }
    }
}

/// Collects host notifications for later delivery to JS
struct JsListener {
    queue: Rc<RefCell<Vec<Notice>>>,
}

impl HostListener for JsListener {
    fn score_changed(&mut self, score: u64) {
        self.queue.borrow_mut().push(Notice::Score(score));
    }

    fn game_over(&mut self, score: u64) {
        self.queue.borrow_mut().push(Notice::GameOver(score));
    }

    fn next_level_changed(&mut self, level: usize) {
        self.queue.borrow_mut().push(Notice::NextLevel(level));
    }

    fn lives_changed(&mut self, lives: u8) {
        self.queue.borrow_mut().push(Notice::Lives(lives));
    }
}

/// A registered DOM listener, kept so it can be removed again
struct DomListener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl DomListener {
    fn detach(self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

/// One pending sprite and its load callbacks
struct SpriteLoad {
    image: HtmlImageElement,
    _on_load: Closure<dyn FnMut()>,
    _on_error: Closure<dyn FnMut()>,
}

impl SpriteLoad {
    fn detach(&self) {
        self.image.set_onload(None);
        self.image.set_onerror(None);
    }
}

struct Shared {
    host: GameHost,
    canvas: Option<WebCanvas>,
    container: Option<HtmlElement>,
    assets: AssetRegistry<HtmlImageElement>,
    sprites: Vec<SpriteLoad>,
    listeners: Vec<DomListener>,
    raf_id: Option<i32>,
}

impl Shared {
    fn teardown(&mut self) {
        if let Some(id) = self.raf_id.take()
            && let Some(window) = web_sys::window()
        {
            let _ = window.cancel_animation_frame(id);
        }

        for listener in self.listeners.drain(..) {
            listener.detach();
        }
        for sprite in self.sprites.drain(..) {
            sprite.detach();
        }
        self.assets.clear();

        if let Some(canvas) = self.canvas.take() {
            canvas.element().remove();
        }
        self.container = None;
        self.host.unmount();
    }

    fn container_size(&self) -> Option<(u32, u32)> {
        let container = self.container.as_ref()?;
        let w = container.client_width().max(1) as u32;
        let h = container.client_height().max(1) as u32;
        Some((w, h))
    }

    fn draw(&mut self) {
        let Shared {
            host,
            canvas,
            assets,
            ..
        } = self;
        if let (Some(canvas), Some(session)) = (canvas.as_mut(), host.session()) {
            render_frame(canvas, session, assets, host.settings());
        }
    }
}

/// Browser entry point: one game mounted into a host element
#[wasm_bindgen]
pub struct FruitFusion {
    shared: Rc<RefCell<Shared>>,
    queue: Rc<RefCell<Vec<Notice>>>,
    callbacks: Rc<RefCell<Callbacks>>,
}

#[wasm_bindgen]
impl FruitFusion {
    #[wasm_bindgen(constructor)]
    pub fn new() -> FruitFusion {
        let queue = Rc::new(RefCell::new(Vec::new()));
        let listener = JsListener {
            queue: queue.clone(),
        };
        let host = GameHost::new(Tuning::load(), Settings::load(), Box::new(listener));
        let shared = Shared {
            host,
            canvas: None,
            container: None,
            assets: AssetRegistry::new(FRUIT_LEVELS.len()),
            sprites: Vec::new(),
            listeners: Vec::new(),
            raf_id: None,
        };
        FruitFusion {
            shared: Rc::new(RefCell::new(shared)),
            queue,
            callbacks: Rc::new(RefCell::new(Callbacks::default())),
        }
    }

    /// Mount a game of `mode` ("drop" or "cut") into `container`
    pub fn mount(&self, container: HtmlElement, mode: &str) -> Result<(), JsValue> {
        let mode: GameMode = mode
            .parse()
            .map_err(|_| GameError::Platform(format!("unknown game mode '{}'", mode)))?;

        self.unmount();
        self.mount_inner(container, mode)?;
        self.flush();
        Ok(())
    }

    /// Tear everything down. Safe to call at any time.
    pub fn unmount(&self) {
        self.shared.borrow_mut().teardown();
        self.queue.borrow_mut().clear();
    }

    pub fn restart(&self) {
        self.shared.borrow_mut().host.restart(now_ms());
        self.flush();
    }

    /// Replace the player settings with a JSON object; missing fields take defaults
    pub fn set_settings(&self, json: &str) -> Result<(), JsValue> {
        let settings: Settings = serde_json::from_str(json).map_err(GameError::from)?;
        self.shared.borrow_mut().host.set_settings(settings);
        Ok(())
    }

    pub fn set_score_callback(&self, callback: Option<js_sys::Function>) {
        self.callbacks.borrow_mut().score = callback;
    }

    pub fn set_game_over_callback(&self, callback: Option<js_sys::Function>) {
        self.callbacks.borrow_mut().game_over = callback;
    }

    pub fn set_next_level_callback(&self, callback: Option<js_sys::Function>) {
        self.callbacks.borrow_mut().next_level = callback;
    }

    pub fn set_lives_callback(&self, callback: Option<js_sys::Function>) {
        self.callbacks.borrow_mut().lives = callback;
    }
}

impl Default for FruitFusion {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FruitFusion {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.try_borrow_mut() {
            shared.teardown();
        }
    }
}

impl FruitFusion {
    fn mount_inner(&self, container: HtmlElement, mode: GameMode) -> GameResult<()> {
        let window = web_sys::window().ok_or_else(|| GameError::Platform("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| GameError::Platform("no document".into()))?;

        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|_| GameError::Platform("could not create canvas".into()))?
            .dyn_into()
            .map_err(|_| GameError::Platform("created element is not a canvas".into()))?;
        let style = canvas.style();
        let _ = style.set_property("display", "block");
        let _ = style.set_property("touch-action", "none");
        container
            .append_child(&canvas)
            .map_err(|_| GameError::Platform("could not attach canvas".into()))?;

        let canvas = WebCanvas::new(canvas)?;
        let seed = js_sys::Date::now() as u64;
        log::info!("Mounting {} game with seed {}", mode, seed);

        let weak = Rc::downgrade(&self.shared);
        let generation = {
            let mut shared = self.shared.borrow_mut();
            shared.container = Some(container);
            let (w, h) = shared.container_size().unwrap_or((1, 1));
            canvas.resize(w, h);
            let element = canvas.element().clone();
            shared.canvas = Some(canvas);

            let generation = shared.host.mount(mode, w as f32, h as f32, seed, now_ms());
            load_sprites(&mut shared, &weak);
            attach_input(&mut shared, &element, &weak, &self.queue, &self.callbacks);
            attach_resize(&mut shared, &window, &weak);
            generation
        };

        schedule_frame(&self.shared, generation, self.queue.clone(), self.callbacks.clone());
        Ok(())
    }

    fn flush(&self) {
        flush(&self.queue, &self.callbacks);
    }
}

fn flush(queue: &Rc<RefCell<Vec<Notice>>>, callbacks: &Rc<RefCell<Callbacks>>) {
    let notices: Vec<Notice> = queue.borrow_mut().drain(..).collect();
    let callbacks = callbacks.borrow();
    for notice in notices {
        callbacks.deliver(notice);
    }
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

fn load_sprites(shared: &mut Shared, weak: &Weak<RefCell<Shared>>) {
    for (level, def) in FRUIT_LEVELS.iter().enumerate() {
        let Ok(image) = HtmlImageElement::new() else {
            shared.assets.mark_failed(level);
            continue;
        };

        let on_load = {
            let weak = weak.clone();
            let image = image.clone();
            Closure::<dyn FnMut()>::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.borrow_mut().assets.mark_loaded(level, image.clone());
                }
            })
        };
        let on_error = {
            let weak = weak.clone();
            Closure::<dyn FnMut()>::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.borrow_mut().assets.mark_failed(level);
                }
            })
        };
        image.set_onload(Some(on_load.as_ref().unchecked_ref()));
        image.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        image.set_src(&format!("{}{}", SPRITE_BASE, def.sprite));

        shared.sprites.push(SpriteLoad {
            image,
            _on_load: on_load,
            _on_error: on_error,
        });
    }
}

#[derive(Debug, Clone, Copy)]
enum Pointer {
    Down,
    Move,
    Up,
}

/// Pointer position relative to the canvas' top-left corner
fn canvas_local(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    Vec2::new(
        client_x as f32 - rect.left() as f32,
        client_y as f32 - rect.top() as f32,
    )
}

fn event_position(canvas: &HtmlCanvasElement, event: &Event) -> Option<Vec2> {
    if let Some(touch_event) = event.dyn_ref::<TouchEvent>() {
        touch_event.prevent_default();
        // touchend has no active touches left
        let touch = touch_event
            .touches()
            .get(0)
            .or_else(|| touch_event.changed_touches().get(0))?;
        return Some(canvas_local(canvas, touch.client_x(), touch.client_y()));
    }
    let mouse = event.dyn_ref::<MouseEvent>()?;
    Some(canvas_local(canvas, mouse.client_x(), mouse.client_y()))
}

fn attach_input(
    shared: &mut Shared,
    canvas: &HtmlCanvasElement,
    weak: &Weak<RefCell<Shared>>,
    queue: &Rc<RefCell<Vec<Notice>>>,
    callbacks: &Rc<RefCell<Callbacks>>,
) {
    let bindings: [(&'static str, Pointer); 7] = [
        ("mousedown", Pointer::Down),
        ("mousemove", Pointer::Move),
        ("mouseup", Pointer::Up),
        ("touchstart", Pointer::Down),
        ("touchmove", Pointer::Move),
        ("touchend", Pointer::Up),
        ("touchcancel", Pointer::Up),
    ];

    for (kind, pointer) in bindings {
        let weak = weak.clone();
        let element = canvas.clone();
        let queue = queue.clone();
        let callbacks = callbacks.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(pos) = event_position(&element, &event) else {
                return;
            };
            let Some(shared) = weak.upgrade() else {
                return;
            };
            {
                let mut shared = shared.borrow_mut();
                let now = now_ms();
                match pointer {
                    Pointer::Down => shared.host.pointer_down(pos, now),
                    Pointer::Move => shared.host.pointer_move(pos, now),
                    Pointer::Up => shared.host.pointer_up(pos, now),
                }
            }
            flush(&queue, &callbacks);
        });

        let target: EventTarget = canvas.clone().into();
        if target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .is_err()
        {
            log::warn!("Could not listen for {}", kind);
            continue;
        }
        shared.listeners.push(DomListener {
            target,
            kind,
            closure,
        });
    }
}

fn attach_resize(shared: &mut Shared, window: &web_sys::Window, weak: &Weak<RefCell<Shared>>) {
    let weak = weak.clone();
    let closure = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let mut shared = shared.borrow_mut();
        let Some((w, h)) = shared.container_size() else {
            return;
        };
        if let Some(canvas) = shared.canvas.as_ref() {
            canvas.resize(w, h);
        }
        shared.host.resize(w as f32, h as f32);
        log::debug!("Resized to {}x{}", w, h);
    });

    let target: EventTarget = window.clone().into();
    if target
        .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        .is_ok()
    {
        shared.listeners.push(DomListener {
            target,
            kind: "resize",
            closure,
        });
    }
}

fn schedule_frame(
    shared: &Rc<RefCell<Shared>>,
    generation: u64,
    queue: Rc<RefCell<Vec<Notice>>>,
    callbacks: Rc<RefCell<Callbacks>>,
) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let weak = Rc::downgrade(shared);
    // Frees itself once called; a cancelled frame leaks only this small closure
    let callback = Closure::once_into_js(move |time: f64| {
        if let Some(shared) = weak.upgrade() {
            frame(&shared, time, generation, queue, callbacks);
        }
    });

    match window.request_animation_frame(callback.unchecked_ref()) {
        Ok(id) => shared.borrow_mut().raf_id = Some(id),
        Err(err) => log::warn!("requestAnimationFrame failed: {:?}", err),
    }
}

fn frame(
    shared: &Rc<RefCell<Shared>>,
    time: f64,
    generation: u64,
    queue: Rc<RefCell<Vec<Notice>>>,
    callbacks: Rc<RefCell<Callbacks>>,
) {
    {
        let mut state = shared.borrow_mut();
        state.raf_id = None;
        // A frame scheduled by an earlier mount stops here
        if !state.host.is_current(generation) {
            return;
        }
        state.host.frame(time, generation);
        state.draw();
    }

    flush(&queue, &callbacks);
    // A callback may have unmounted or remounted the host
    if !shared.borrow().host.is_current(generation) {
        return;
    }
    schedule_frame(shared, generation, queue, callbacks);
}
