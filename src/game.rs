use crate::browser;
use crate::config::GameConfig;
use crate::display::{self, DomScorePanel, ScorePanel};
use crate::engine::input::{InputEvent, InputState};
#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::{Game, Point, Rect, Renderer, Size};
use crate::feedback::{Cue, Feedback, FeedbackChannel, WebAudio};
use crate::layout;
use crate::round::{Round, RoundEvent};
#[cfg(debug_assertions)]
use crate::spawner::Target;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// TABLE
/// ┌───────────────────── Game Architecture Overview ────────────────────────┐
/// │                                                                         │
/// │    ┌─────────────┐          ┌─────────────┐          ┌─────────────┐    │
/// │    │  engine.rs  │  update  │   game.rs   │  calls   │  round.rs   │    │
/// │    │  GameLoop   ├─────────►│    Pond     ├─────────►│   Round     │    │
/// │    │ InputState  │          │   step()    │◄─────────┤ RoundEvent  │    │
/// │    └─────────────┘          └──────┬──────┘  events  └─────────────┘    │
/// │                                    │                                    │
/// │                       ┌────────────┼─────────────┐                      │
/// │                       ▼            ▼             ▼                      │
/// │                 ScorePanel   FeedbackChannel   Renderer                 │
/// │                 (DOM text)   (Web Audio)       (canvas)                 │
/// │                                                                         │
/// ├──────────────────────── Call Sequence ──────────────────────────────────┤
/// │  1. Input   : Space / buttons / clicks -> Round                         │
/// │  2. Clock   : Round::advance(now) fires ticks, spawns, expiries         │
/// │  3. Events  : drained once, fanned out to panel and feedback            │
/// │  4. Overlay : phrase and coin popups time out                           │
/// │  5. Music   : background loop queues its next beats                     │
/// └─────────────────────────────────────────────────────────────────────────┘
pub enum CrocodileGame {
    /// Config, canvas and audio are being prepared
    Loading,

    /// Pond is live and reacting to input
    Loaded(Pond),
}

impl CrocodileGame {
    pub fn new() -> Self {
        CrocodileGame::Loading
    }

    async fn load_config() -> GameConfig {
        let loaded = browser::fetch_json::<GameConfig>(GameConfig::PATH)
            .await
            .with_context(|| format!("Failed to load config from : {}", GameConfig::PATH))
            .and_then(|config| config.validate().map(|_| config));
        match loaded {
            Ok(config) => config,
            Err(err) => {
                log!("Using default config : {:#}", err);
                GameConfig::default()
            }
        }
    }
}

impl Default for CrocodileGame {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Game for CrocodileGame {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            CrocodileGame::Loading => {
                let config = Self::load_config().await;
                let size = layout::fit_canvas().context("Failed to size the canvas")?;
                let feedback = FeedbackChannel::new(
                    WebAudio::new(config.volume).map(|audio| Box::new(audio) as Box<dyn Feedback>),
                );
                let round = Round::for_canvas(config, size.width, size.height);
                let mut pond = Pond::new(
                    round,
                    Box::new(DomScorePanel),
                    feedback,
                    StdRng::from_entropy(),
                );
                pond.refresh_panel();
                log!("Whack-a-Croc ready : {} cells", pond.round().grid().len());
                Ok(Box::new(CrocodileGame::Loaded(pond)))
            }
            CrocodileGame::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, input: &mut InputState) {
        if let CrocodileGame::Loaded(pond) = self {
            pond.step(input.drain(), browser::wall_clock());
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let CrocodileGame::Loaded(pond) = self {
            pond.draw(renderer);
        }
    }
}

const SPACE: &str = "Space";
const PHRASE_MS: f64 = 2000.0;
const COIN_POPUP_MS: f64 = 1000.0;

struct CoinPopup {
    position: Point,
    until: f64,
}

/// Live game: the round plus everything that only shows it.
pub struct Pond {
    round: Round,
    panel: Box<dyn ScorePanel>,
    feedback: FeedbackChannel,
    rng: StdRng,
    phrase_until: Option<f64>,
    popups: Vec<CoinPopup>,
}

impl Pond {
    pub fn new(
        round: Round,
        panel: Box<dyn ScorePanel>,
        feedback: FeedbackChannel,
        rng: StdRng,
    ) -> Self {
        Pond {
            round,
            panel,
            feedback,
            rng,
            phrase_until: None,
            popups: Vec::new(),
        }
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    /// One update: input first, then the clock, then the fan-out.
    pub fn step(&mut self, events: Vec<InputEvent>, now: f64) {
        for event in events {
            self.handle(event, now);
        }
        self.round.advance(now);
        self.dispatch(now);
        self.expire_overlays(now);
        self.feedback.keep_music(now);
    }

    fn handle(&mut self, event: InputEvent, now: f64) {
        match event {
            InputEvent::KeyDown(code) if code == SPACE => {
                if self.round.phase().is_active() {
                    self.round.toggle_pause(now);
                } else {
                    self.round.start(now);
                }
            }
            InputEvent::KeyDown(_) => {}
            InputEvent::Button(id) => match id.as_str() {
                browser::html::START_BUTTON_ID => {
                    self.round.start(now);
                }
                browser::html::PAUSE_BUTTON_ID => {
                    self.round.toggle_pause(now);
                }
                browser::html::RESET_BUTTON_ID => self.round.reset(),
                _ => {}
            },
            InputEvent::Click(point) => {
                self.round.click(point, now);
            }
            InputEvent::Resize => match layout::fit_canvas() {
                Ok(size) => self.round.resize(size.width, size.height),
                Err(err) => error!("Resize failed, keeping the old grid : {:#}", err),
            },
        }
    }

    fn dispatch(&mut self, now: f64) {
        for event in self.round.drain_events() {
            match event {
                RoundEvent::Started => {
                    self.feedback.notify(Cue::Start);
                    let delay = self.round.config().music_delay_ms;
                    self.music_from(now, delay);
                    self.phrase(display::START_PHRASE, now);
                    let hidden = self.panel.hide_game_over();
                    Self::report(hidden);
                    self.refresh_panel();
                }
                RoundEvent::Hit { position, .. } => {
                    self.feedback.notify(Cue::Hit);
                    self.popups.push(CoinPopup {
                        position,
                        until: now + COIN_POPUP_MS,
                    });
                    let phrase = display::lucky_phrase(&mut self.rng);
                    self.phrase(phrase, now);
                    self.refresh_counters();
                }
                RoundEvent::Ticked { .. } => self.refresh_counters(),
                RoundEvent::Paused => {
                    self.feedback.stop_music();
                    self.phrase(display::PAUSE_PHRASE, now);
                    self.refresh_panel();
                }
                RoundEvent::Resumed => {
                    self.music_from(now, 0.0);
                    self.phrase(display::RESUME_PHRASE, now);
                    self.refresh_panel();
                }
                RoundEvent::Ended { score, coins } => {
                    log!("Round over : score {} coins {}", score, coins);
                    self.feedback.notify(Cue::End);
                    self.feedback.stop_music();
                    let shown = self.panel.show_game_over(self.round.session());
                    Self::report(shown);
                    self.refresh_panel();
                }
                RoundEvent::Reset => {
                    self.feedback.stop_music();
                    self.popups.clear();
                    let hidden = self.panel.hide_game_over();
                    Self::report(hidden);
                    self.refresh_panel();
                }
                RoundEvent::Spawned { .. }
                | RoundEvent::Expired { .. }
                | RoundEvent::Relaid { .. } => {}
            }
        }
    }

    fn music_from(&mut self, now: f64, delay_ms: f64) {
        if self.round.config().music {
            self.feedback.start_music(now, delay_ms);
        }
    }

    fn phrase(&mut self, phrase: &str, now: f64) {
        let shown = self.panel.show_phrase(phrase);
        Self::report(shown);
        self.phrase_until = Some(now + PHRASE_MS);
    }

    fn expire_overlays(&mut self, now: f64) {
        if self.phrase_until.is_some_and(|until| until <= now) {
            self.phrase_until = None;
            let hidden = self.panel.hide_phrase();
            Self::report(hidden);
        }
        self.popups.retain(|popup| popup.until > now);
    }

    fn refresh_counters(&mut self) {
        let session = self.round.session();
        let (score, coins, time_left) = (session.score(), session.coins(), session.time_left());
        let shown = self.panel.show_counters(score, coins, time_left);
        Self::report(shown);
    }

    /// Counters and buttons from the current session.
    pub fn refresh_panel(&mut self) {
        self.refresh_counters();
        let shown = self.panel.show_controls(self.round.phase());
        Self::report(shown);
    }

    // a missing page element only costs that element
    fn report(result: Result<()>) {
        if let Err(err) = result {
            log!("Display : {:#}", err);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let grid = self.round.grid();
        let canvas = Rect::new(
            Point::default(),
            Size {
                width: grid.width(),
                height: grid.height(),
            },
        );
        renderer.clear(&canvas);
        Self::draw_background(renderer, &canvas);

        // Draw order matters : water -> occupied cells -> crocodiles -> coins
        for cell in grid.cells().iter().filter(|cell| cell.is_occupied()) {
            let square = Rect::centered(cell.center, cell.size);
            renderer.fill_rect(&square, "#4CAF50");
            renderer.stroke_rect(&square, "#2E7D32", (cell.size / 15.0).max(3.0));
            let inner = Rect::centered(cell.center, cell.size - 4.0);
            renderer.stroke_rect(&inner, "#1B5E20", (cell.size / 30.0).max(1.0));
        }
        for target in self.round.targets() {
            renderer.draw_text("🐊", target.position, target.size * 0.8, "#FFFFFF");

            #[cfg(debug_assertions)]
            HitZone {
                target,
                radius_factor: self.round.config().hit_radius_factor,
            }
            .draw_debug(renderer);
        }
        for popup in &self.popups {
            renderer.draw_text("💰", popup.position, 30.0, "#FFD700");
        }
    }

    fn draw_background(renderer: &Renderer, canvas: &Rect) {
        renderer.fill_rect(canvas, "#87CEEB");
        for ring in 0..5 {
            let ring = f64::from(ring);
            renderer.stroke_circle(
                Point::new(200.0 + ring * 200.0, 300.0 + ring * 50.0),
                100.0 + ring * 20.0,
                "rgba(255, 255, 255, 0.3)",
                2.0,
            );
        }
    }
}

/// Outline of the area a click has to land in.
#[cfg(debug_assertions)]
struct HitZone<'a> {
    target: &'a Target,
    radius_factor: f64,
}

#[cfg(debug_assertions)]
impl DebugDraw for HitZone<'_> {
    fn draw_debug(&self, renderer: &Renderer) {
        renderer.stroke_circle(
            self.target.position,
            self.target.size * self.radius_factor,
            "#FF0000",
            1.0,
        );
    }
}
