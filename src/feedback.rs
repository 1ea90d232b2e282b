//! Sound cues for start, hit and end, and the percussion loop under a round.
//!
//! Feedback is fire-and-forget: a backend that cannot be created leaves the
//! channel disabled, a cue that fails to play is logged and dropped. Neither
//! ever reaches the round.

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use web_sys::{AudioContext, AudioContextState, OscillatorType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Start,
    Hit,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One tone, times in seconds from the moment the cue is played.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub frequency: f64,
    pub offset: f64,
    pub duration: f64,
    pub wave: Wave,
    /// fraction of the master volume
    pub level: f64,
}

pub mod pitch {
    pub const C2: f64 = 65.41;
    pub const C3: f64 = 130.81;
    pub const C4: f64 = 261.63;
    pub const D4: f64 = 293.66;
    pub const E4: f64 = 329.63;
    pub const F4: f64 = 349.23;
    pub const G4: f64 = 392.00;
    pub const A4: f64 = 440.00;
    pub const B4: f64 = 493.88;
    pub const C5: f64 = 523.25;
    pub const D5: f64 = 587.33;
    pub const E5: f64 = 659.25;
    pub const F5: f64 = 698.46;
    pub const G5: f64 = 783.99;
    pub const C6: f64 = 1046.50;
    pub const C7: f64 = 2093.00;
    pub const E7: f64 = 2637.02;
}

const RISING: [f64; 7] = [
    pitch::C4,
    pitch::E4,
    pitch::G4,
    pitch::C5,
    pitch::E5,
    pitch::G5,
    pitch::C6,
];
const HIT_NOTES: [f64; 3] = [pitch::C5, pitch::E5, pitch::G5];

fn kick(offset: f64) -> Note {
    Note {
        frequency: pitch::C2,
        offset,
        duration: 0.5,
        wave: Wave::Triangle,
        level: 0.8,
    }
}

fn snare(offset: f64, duration: f64) -> Note {
    Note {
        frequency: pitch::C4,
        offset,
        duration,
        wave: Wave::Square,
        level: 0.6,
    }
}

fn hi_hat(offset: f64) -> Note {
    Note {
        frequency: pitch::C6,
        offset,
        duration: 0.25,
        wave: Wave::Sine,
        level: 0.4,
    }
}

fn crash(frequency: f64, offset: f64, duration: f64) -> Note {
    Note {
        frequency,
        offset,
        duration,
        wave: Wave::Square,
        level: 0.5,
    }
}

/// ┌──────── Cue scores ──────────────────────────────────────────┐
/// │ Start │ C4→C6 sawtooth every 0.3s, C2 bass on every other    │
/// │       │ + kicks at 0, 0.6 and 1.2s                           │
/// │ Hit   │ random C5/E5/G5 sine + C3 bass + C7, E7 sparkle      │
/// │       │ + a short snare                                      │
/// │ End   │ C6→C4 triangle every 0.4s over a C2 sine drone       │
/// │       │ + C5 then C4 crash                                   │
/// └───────────────────────────────────────────────────────────────┘
pub fn score<R: Rng + ?Sized>(cue: Cue, rng: &mut R) -> Vec<Note> {
    match cue {
        Cue::Start => RISING
            .iter()
            .enumerate()
            .flat_map(|(index, frequency)| {
                let offset = index as f64 * 0.3;
                let lead = Note {
                    frequency: *frequency,
                    offset,
                    duration: 0.5,
                    wave: Wave::Sawtooth,
                    level: 0.7,
                };
                let bass = (index % 2 == 0).then_some(Note {
                    frequency: pitch::C2,
                    offset,
                    duration: 0.25,
                    wave: Wave::Triangle,
                    level: 0.5,
                });
                std::iter::once(lead).chain(bass)
            })
            .chain([0.0, 0.6, 1.2].map(kick))
            .collect(),
        Cue::Hit => {
            let main = *HIT_NOTES.choose(rng).unwrap_or(&pitch::C5);
            vec![
                Note {
                    frequency: main,
                    offset: 0.0,
                    duration: 0.25,
                    wave: Wave::Sine,
                    level: 0.6,
                },
                Note {
                    frequency: pitch::C3,
                    offset: 0.0,
                    duration: 0.5,
                    wave: Wave::Triangle,
                    level: 0.4,
                },
                Note {
                    frequency: pitch::C7,
                    offset: 0.05,
                    duration: 0.06,
                    wave: Wave::Square,
                    level: 0.3,
                },
                Note {
                    frequency: pitch::E7,
                    offset: 0.1,
                    duration: 0.06,
                    wave: Wave::Square,
                    level: 0.3,
                },
                snare(0.0, 0.125),
            ]
        }
        Cue::End => RISING
            .iter()
            .rev()
            .enumerate()
            .flat_map(|(index, frequency)| {
                let offset = index as f64 * 0.4;
                [
                    Note {
                        frequency: *frequency,
                        offset,
                        duration: 0.5,
                        wave: Wave::Triangle,
                        level: 0.6,
                    },
                    Note {
                        frequency: pitch::C2,
                        offset,
                        duration: 0.25,
                        wave: Wave::Sine,
                        level: 0.4,
                    },
                ]
            })
            .chain([crash(pitch::C5, 0.0, 1.0), crash(pitch::C4, 1.0, 2.0)])
            .collect(),
    }
}

// ==================== Background loop ====================
/// A quarter note every 0.5 s, four to a bar.
pub const BEAT_MS: f64 = 500.0;
pub const BEATS_PER_BAR: u64 = 4;
/// Beats starting within this window of the update step are queued.
pub const LOOKAHEAD_MS: f64 = 250.0;

/// One arpeggio is picked at random for every bar.
const MELODIES: [[f64; 4]; 4] = [
    [pitch::C4, pitch::E4, pitch::G4, pitch::C5],
    [pitch::D4, pitch::F4, pitch::A4, pitch::D5],
    [pitch::E4, pitch::G4, pitch::B4, pitch::E5],
    [pitch::F4, pitch::A4, pitch::C5, pitch::F5],
];

/// TABLE:
/// ┌──────┬──────┬───────┬────────┬──────────────────────┐
/// │ beat │ kick │ snare │ hi-hat │ melody               │
/// ├──────┼──────┼───────┼────────┼──────────────────────┤
/// │  0   │  x   │       │   x    │ new arpeggio, 4 x 4n │
/// │  1   │      │       │        │                      │
/// │  2   │      │   x   │   x    │                      │
/// │  3   │      │       │        │                      │
/// └──────┴──────┴───────┴────────┴──────────────────────┘
fn beat_notes<R: Rng + ?Sized>(beat: u64, offset: f64, rng: &mut R) -> Vec<Note> {
    let step = beat % BEATS_PER_BAR;
    let mut notes = Vec::new();
    if step == 0 {
        notes.push(kick(offset));
        let melody = MELODIES.choose(rng).unwrap_or(&MELODIES[0]);
        notes.extend(melody.iter().enumerate().map(|(index, frequency)| Note {
            frequency: *frequency,
            offset: offset + index as f64 * BEAT_MS / 1000.0,
            duration: BEAT_MS / 1000.0,
            wave: Wave::Sawtooth,
            level: 0.5,
        }));
    }
    if step == 2 {
        notes.push(snare(offset, 0.25));
    }
    if step % 2 == 0 {
        notes.push(hi_hat(offset));
    }
    notes
}

/// Percussion and melody loop, counted in beats from `origin` (wall clock ms).
#[derive(Debug, Clone, PartialEq)]
pub struct Groove {
    origin: f64,
    next_beat: u64,
}

impl Groove {
    pub fn new(origin: f64) -> Self {
        Groove {
            origin,
            next_beat: 0,
        }
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn next_beat(&self) -> u64 {
        self.next_beat
    }

    /// Notes of every beat starting before `now + LOOKAHEAD_MS`, offsets in
    /// seconds from `now`. Beats that fell behind by more than a whole beat
    /// (a throttled tab) are skipped rather than played in a burst.
    pub fn queue<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) -> Vec<Note> {
        let behind = ((now - self.origin) / BEAT_MS).floor();
        if behind > self.next_beat as f64 {
            self.next_beat = behind as u64;
        }
        let mut notes = Vec::new();
        loop {
            let at = self.origin + self.next_beat as f64 * BEAT_MS;
            if at >= now + LOOKAHEAD_MS {
                break;
            }
            let offset = ((at - now) / 1000.0).max(0.0);
            notes.extend(beat_notes(self.next_beat, offset, rng));
            self.next_beat += 1;
        }
        notes
    }
}

pub trait Feedback {
    fn play(&mut self, cue: Cue) -> Result<()>;

    /// Start the background loop `delay_ms` after `now`, from its first beat.
    fn start_music(&mut self, now: f64, delay_ms: f64) -> Result<()>;

    fn stop_music(&mut self) -> Result<()>;

    /// Queue whatever the background loop needs next. Called every update.
    fn keep_music(&mut self, now: f64) -> Result<()>;
}

/// Swallows every feedback failure.
pub struct FeedbackChannel {
    backend: Option<Box<dyn Feedback>>,
}

impl FeedbackChannel {
    pub fn new(backend: Result<Box<dyn Feedback>>) -> Self {
        match backend {
            Ok(backend) => FeedbackChannel {
                backend: Some(backend),
            },
            Err(err) => {
                log!("Feedback disabled : {:#}", err);
                FeedbackChannel::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        FeedbackChannel { backend: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn notify(&mut self, cue: Cue) {
        if let Some(backend) = self.backend.as_mut() {
            if let Err(err) = backend.play(cue) {
                log!("Could not play {:?} cue : {:#}", cue, err);
            }
        }
    }

    pub fn start_music(&mut self, now: f64, delay_ms: f64) {
        if let Some(backend) = self.backend.as_mut() {
            if let Err(err) = backend.start_music(now, delay_ms) {
                log!("Could not start music : {:#}", err);
            }
        }
    }

    pub fn stop_music(&mut self) {
        if let Some(backend) = self.backend.as_mut() {
            if let Err(err) = backend.stop_music() {
                log!("Could not stop music : {:#}", err);
            }
        }
    }

    /// A loop that fails to queue is stopped, so the error is logged once
    /// instead of every frame.
    pub fn keep_music(&mut self, now: f64) {
        if let Some(backend) = self.backend.as_mut() {
            if let Err(err) = backend.keep_music(now) {
                log!("Music stopped : {:#}", err);
                let _ = backend.stop_music();
            }
        }
    }
}

/// Oscillator synth on the page's `AudioContext`.
pub struct WebAudio {
    context: AudioContext,
    volume: f64,
    rng: StdRng,
    groove: Option<Groove>,
}

impl WebAudio {
    pub fn new(volume: f64) -> Result<Self> {
        let context =
            AudioContext::new().map_err(|err| anyhow!("Could not create AudioContext : {:#?}", err))?;
        Ok(WebAudio {
            context,
            volume,
            rng: StdRng::from_entropy(),
            groove: None,
        })
    }

    // browsers keep a fresh context suspended until a user gesture
    fn wake(&self) {
        if self.context.state() == AudioContextState::Suspended {
            let _ = self.context.resume();
        }
    }

    fn tone(&self, note: &Note) -> Result<()> {
        let oscillator = self
            .context
            .create_oscillator()
            .map_err(|err| anyhow!("Could not create oscillator : {:#?}", err))?;
        let gain = self
            .context
            .create_gain()
            .map_err(|err| anyhow!("Could not create gain : {:#?}", err))?;

        oscillator.set_type(match note.wave {
            Wave::Sine => OscillatorType::Sine,
            Wave::Square => OscillatorType::Square,
            Wave::Sawtooth => OscillatorType::Sawtooth,
            Wave::Triangle => OscillatorType::Triangle,
        });
        oscillator.frequency().set_value(note.frequency as f32);

        let start = self.context.current_time() + note.offset;
        let stop = start + note.duration;
        let level = (self.volume * note.level).max(0.001) as f32;
        gain.gain()
            .set_value_at_time(level, start)
            .and_then(|param| param.exponential_ramp_to_value_at_time(0.001, stop))
            .map_err(|err| anyhow!("Could not shape envelope : {:#?}", err))?;

        oscillator
            .connect_with_audio_node(&gain)
            .and_then(|_| gain.connect_with_audio_node(&self.context.destination()))
            .map_err(|err| anyhow!("Could not connect audio graph : {:#?}", err))?;
        oscillator
            .start_with_when(start)
            .and_then(|_| oscillator.stop_with_when(stop))
            .map_err(|err| anyhow!("Could not schedule oscillator : {:#?}", err))
    }
}

impl Feedback for WebAudio {
    fn play(&mut self, cue: Cue) -> Result<()> {
        self.wake();
        for note in score(cue, &mut self.rng) {
            self.tone(&note)?;
        }
        Ok(())
    }

    fn start_music(&mut self, now: f64, delay_ms: f64) -> Result<()> {
        self.wake();
        self.groove = Some(Groove::new(now + delay_ms));
        Ok(())
    }

    fn stop_music(&mut self) -> Result<()> {
        self.groove = None;
        Ok(())
    }

    fn keep_music(&mut self, now: f64) -> Result<()> {
        let notes = match self.groove.as_mut() {
            Some(groove) => groove.queue(now, &mut self.rng),
            None => return Ok(()),
        };
        for note in &notes {
            self.tone(note)?;
        }
        Ok(())
    }
}
