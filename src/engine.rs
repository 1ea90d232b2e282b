use crate::browser;
use anyhow::{anyhow, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::CanvasRenderingContext2d;

use self::input::InputState;

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, input: &mut InputState);
    fn draw(&self, renderer: &Renderer);
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut input_receiver = input::prepare_input()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer {
            context: browser::context()?,
        };
        let mut input_state = InputState::default();
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut input_state, &mut input_receiver);
            game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
            while game_loop.accumulated_delta > FRAME_SIZE {
                game.update(&mut input_state);
                game_loop.accumulated_delta -= FRAME_SIZE;
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);
            if let Some(callback) = f.borrow().as_ref() {
                let _ = browser::request_animation_frame(callback);
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

// ==================== Geometry ====================
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    /// Square of side `side` centered on `center`.
    pub fn centered(center: Point, side: f64) -> Self {
        Rect {
            position: Point {
                x: center.x - side / 2.0,
                y: center.y - side / 2.0,
            },
            size: Size {
                width: side,
                height: side,
            },
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }
}

// ==================== Rendering ====================
pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context
            .clear_rect(rect.x(), rect.y(), rect.width(), rect.height());
    }

    pub fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context
            .fill_rect(rect.x(), rect.y(), rect.width(), rect.height());
    }

    pub fn stroke_rect(&self, rect: &Rect, color: &str, line_width: f64) {
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(line_width);
        self.context
            .stroke_rect(rect.x(), rect.y(), rect.width(), rect.height());
    }

    pub fn stroke_circle(&self, center: Point, radius: f64, color: &str, line_width: f64) {
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(line_width);
        self.context.begin_path();
        // arc only fails on a negative radius
        if self
            .context
            .arc(center.x, center.y, radius.max(0.0), 0.0, std::f64::consts::TAU)
            .is_ok()
        {
            self.context.stroke();
        }
    }

    /// Centered text, used for the crocodile and coin glyphs.
    pub fn draw_text(&self, text: &str, center: Point, font_px: f64, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.set_font(&format!("bold {}px Arial", font_px));
        self.context.set_text_align("center");
        self.context.set_text_baseline("middle");
        let _ = self.context.fill_text(text, center.x, center.y);
    }
}

/// Debug-only overlays (hit radius and friends)
pub trait DebugDraw {
    fn draw_debug(&self, renderer: &Renderer);
}

// ==================== Input ====================
pub mod input {
    use super::Point;
    use crate::browser;
    use anyhow::{anyhow, Result};
    use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
    use wasm_bindgen::JsCast;
    use web_sys::{Event, KeyboardEvent, MouseEvent};

    /// ┌──────────── Input Flow ───────────────────────────────┐
    /// │ DOM listener ──► UnboundedSender ──► (channel)         │
    /// │ raf frame    ──► process_input   ──► InputState        │
    /// │ Game::update ──► InputState::drain ──► Round calls     │
    /// └────────────────────────────────────────────────────────┘
    #[derive(Debug, Clone, PartialEq)]
    pub enum InputEvent {
        KeyDown(String),
        /// canvas-relative coordinates
        Click(Point),
        Button(String),
        Resize,
    }

    #[derive(Debug, Default)]
    pub struct InputState {
        pending: Vec<InputEvent>,
    }

    impl InputState {
        pub fn push(&mut self, event: InputEvent) {
            self.pending.push(event);
        }

        /// Hand the queued events over exactly once.
        pub fn drain(&mut self) -> Vec<InputEvent> {
            std::mem::take(&mut self.pending)
        }

        pub fn is_empty(&self) -> bool {
            self.pending.is_empty()
        }
    }

    pub fn process_input(state: &mut InputState, receiver: &mut UnboundedReceiver<InputEvent>) {
        // try_recv: Ok -> event, Err -> empty or closed
        while let Ok(event) = receiver.try_recv() {
            state.push(event);
        }
    }

    pub(super) fn prepare_input() -> Result<UnboundedReceiver<InputEvent>> {
        let (sender, receiver) = unbounded();
        listen_keys(sender.clone())?;
        listen_canvas_clicks(sender.clone())?;
        for id in [
            browser::html::START_BUTTON_ID,
            browser::html::PAUSE_BUTTON_ID,
            browser::html::RESET_BUTTON_ID,
        ] {
            // a page without one of the buttons still plays via keyboard
            if let Err(err) = listen_button(id, sender.clone()) {
                log!("Input: {:#}", err);
            }
        }
        listen_resize(sender)?;
        Ok(receiver)
    }

    fn listen_keys(sender: UnboundedSender<InputEvent>) -> Result<()> {
        let onkeydown = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
            if event.code() == "Space" {
                event.prevent_default();
            }
            let _ = sender.unbounded_send(InputEvent::KeyDown(event.code()));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        browser::document()?
            .add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not listen for keydown : {:#?}", err))?;
        // listener lives as long as the page
        onkeydown.forget();
        Ok(())
    }

    fn listen_canvas_clicks(sender: UnboundedSender<InputEvent>) -> Result<()> {
        let canvas = browser::canvas()?;
        let target = canvas.clone();
        let onclick = browser::closure_wrap(Box::new(move |event: MouseEvent| {
            let bounds = target.get_bounding_client_rect();
            let point = Point {
                x: f64::from(event.client_x()) - bounds.left(),
                y: f64::from(event.client_y()) - bounds.top(),
            };
            let _ = sender.unbounded_send(InputEvent::Click(point));
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not listen for canvas clicks : {:#?}", err))?;
        onclick.forget();
        Ok(())
    }

    fn listen_button(id: &'static str, sender: UnboundedSender<InputEvent>) -> Result<()> {
        let onclick = browser::closure_wrap(Box::new(move |_event: Event| {
            let _ = sender.unbounded_send(InputEvent::Button(id.to_string()));
        }) as Box<dyn FnMut(Event)>);
        browser::element_by_id(id)?
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not listen for '{}' clicks : {:#?}", id, err))?;
        onclick.forget();
        Ok(())
    }

    fn listen_resize(sender: UnboundedSender<InputEvent>) -> Result<()> {
        let onresize = browser::closure_wrap(Box::new(move |_event: Event| {
            let _ = sender.unbounded_send(InputEvent::Resize);
        }) as Box<dyn FnMut(Event)>);
        browser::window()?
            .add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not listen for resize : {:#?}", err))?;
        onresize.forget();
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn drain_hands_events_over_once() {
            let mut state = InputState::default();
            state.push(InputEvent::KeyDown("Space".into()));
            state.push(InputEvent::Click(Point::new(3.0, 4.0)));

            let events = state.drain();
            assert_eq!(events.len(), 2);
            assert_eq!(events[0], InputEvent::KeyDown("Space".into()));
            assert!(state.is_empty());
            assert!(state.drain().is_empty());
        }

        #[test]
        fn process_input_moves_channel_events_into_state() {
            let (sender, mut receiver) = unbounded();
            sender.unbounded_send(InputEvent::Resize).unwrap();
            sender
                .unbounded_send(InputEvent::Button("resetBtn".into()))
                .unwrap();

            let mut state = InputState::default();
            process_input(&mut state, &mut receiver);
            assert_eq!(
                state.drain(),
                vec![InputEvent::Resize, InputEvent::Button("resetBtn".into())]
            );
        }

        #[test]
        fn closed_channel_drains_what_is_left_then_stops() {
            let (sender, mut receiver) = unbounded();
            sender
                .unbounded_send(InputEvent::KeyDown("Space".into()))
                .unwrap();
            drop(sender);

            let mut state = InputState::default();
            process_input(&mut state, &mut receiver);
            process_input(&mut state, &mut receiver);
            assert_eq!(state.drain(), vec![InputEvent::KeyDown("Space".into())]);
        }
    }
}
