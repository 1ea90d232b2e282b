use crate::config::GameConfig;
use crate::engine::Point;
use crate::grid::{CellId, Grid};
use crate::hit;
use crate::session::{RoundPhase, Session, Tick};
use crate::spawner::{SpawnScheduler, Target, TargetId};
use crate::timer::{TaskKey, TaskScheduler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// What happened inside the round, in order. The host turns these into
/// sounds, counters and phrases.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    Started,
    Spawned { target: TargetId, cell: CellId },
    Expired { target: TargetId, cell: CellId },
    Hit { target: TargetId, position: Point, score: u32, coins: u32 },
    Ticked { time_left: u32 },
    Paused,
    Resumed,
    Ended { score: u32, coins: u32 },
    Reset,
    Relaid { cells: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// no round in progress, or paused
    Ignored,
    Miss,
    Hit { target: TargetId, position: Point },
}

/// TABLE
/// ┌──────────────────────── Round ownership ──────────────────────────┐
/// │  Round                                                             │
/// │  ├─ Session        score / coins / clock / phase                   │
/// │  ├─ Grid           cells, occupant ids                             │
/// │  ├─ SpawnScheduler targets (insertion order)                       │
/// │  └─ TaskScheduler  Countdown │ Spawn │ Expire(id)                  │
/// ├────────────────────────────────────────────────────────────────────┤
/// │  start / toggle_pause / reset / resize / click   ◄── input         │
/// │  advance(now)                                    ◄── clock         │
/// │  drain_events()                                  ──► feedback, UI  │
/// └────────────────────────────────────────────────────────────────────┘
pub struct Round<R: Rng = StdRng> {
    config: GameConfig,
    grid: Grid,
    session: Session,
    spawner: SpawnScheduler,
    tasks: TaskScheduler,
    rng: R,
    events: Vec<RoundEvent>,
}

impl Round<StdRng> {
    pub fn for_canvas(config: GameConfig, width: f64, height: f64) -> Self {
        let grid = Grid::layout(width, height, &config);
        Round::new(config, grid, StdRng::from_entropy())
    }
}

impl<R: Rng> Round<R> {
    pub fn new(config: GameConfig, grid: Grid, rng: R) -> Self {
        Round {
            session: Session::new(&config),
            config,
            grid,
            spawner: SpawnScheduler::new(),
            tasks: TaskScheduler::new(),
            rng,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> RoundPhase {
        self.session.phase()
    }

    /// Live targets, oldest first.
    pub fn targets(&self) -> &[Target] {
        self.spawner.targets()
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.spawner.target(id)
    }

    pub fn tasks(&self) -> &TaskScheduler {
        &self.tasks
    }

    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin a round from idle or after the previous one ended.
    pub fn start(&mut self, now: f64) -> bool {
        if self.session.phase().is_active() {
            return false;
        }
        self.clear_round();
        self.session = Session::started(&self.config, now);
        self.tasks
            .schedule(TaskKey::Countdown, now, self.config.tick_ms);
        self.tasks
            .schedule(TaskKey::Spawn, now, self.config.first_spawn_delay_ms);
        self.events.push(RoundEvent::Started);
        true
    }

    pub fn toggle_pause(&mut self, now: f64) -> bool {
        match self.session.phase() {
            RoundPhase::Running => self.pause(now),
            RoundPhase::Paused => self.resume(now),
            RoundPhase::Idle | RoundPhase::Ended => false,
        }
    }

    /// Freeze the round. The countdown and spawn cadence are dropped, target
    /// expiries keep their remainder.
    pub fn pause(&mut self, now: f64) -> bool {
        if !self.session.is_running() {
            return false;
        }
        // expiries due by now still happen before the freeze
        self.advance(now);
        if !self.session.is_running() {
            return false;
        }
        self.session.set_paused(true);
        self.tasks.cancel(TaskKey::Countdown);
        self.tasks.cancel(TaskKey::Spawn);
        self.tasks.suspend_all(now);
        self.spawner.record_remaining(&self.tasks);
        self.events.push(RoundEvent::Paused);
        true
    }

    /// Re-arm expiries from their remainder; countdown and spawn cadence
    /// restart fresh.
    pub fn resume(&mut self, now: f64) -> bool {
        if !self.session.is_paused() {
            return false;
        }
        self.session.set_paused(false);
        self.tasks.resume_all(now);
        self.spawner.forget_remaining();
        self.tasks
            .schedule(TaskKey::Countdown, now, self.config.tick_ms);
        let delay =
            self.config.resume_spawn_delay_ms + self.config.spawn_interval_ms.sample(&mut self.rng);
        self.tasks.schedule(TaskKey::Spawn, now, delay);
        self.events.push(RoundEvent::Resumed);
        true
    }

    /// Back to idle with a fresh session.
    pub fn reset(&mut self) {
        self.clear_round();
        self.session = Session::new(&self.config);
        self.events.push(RoundEvent::Reset);
    }

    /// New canvas size: new cells, and the old targets are gone.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.spawner.clear(&mut self.grid, &mut self.tasks);
        self.grid = Grid::layout(width, height, &self.config);
        self.events.push(RoundEvent::Relaid {
            cells: self.grid.len(),
        });
    }

    /// Place a target on a chosen cell with a chosen dwell.
    pub fn place_target(&mut self, cell: CellId, dwell_ms: f64, now: f64) -> Option<TargetId> {
        if !self.session.is_running() {
            return None;
        }
        let size = self
            .config
            .target_size
            .resolve(self.grid.width(), self.grid.height());
        let id = self
            .spawner
            .place(&mut self.grid, &mut self.tasks, cell, size, dwell_ms, now)?;
        self.events.push(RoundEvent::Spawned { target: id, cell });
        Some(id)
    }

    pub fn click(&mut self, point: Point, now: f64) -> ClickOutcome {
        if !self.session.is_running() {
            return ClickOutcome::Ignored;
        }
        // anything that expired before the click is gone first
        self.advance(now);
        if !self.session.is_running() {
            return ClickOutcome::Ignored;
        }
        let Some(id) = hit::find_hit(self.spawner.targets(), point, self.config.hit_radius_factor)
        else {
            return ClickOutcome::Miss;
        };
        let Some(target) = self
            .spawner
            .consume(id, &mut self.grid, &mut self.tasks)
        else {
            return ClickOutcome::Miss;
        };
        self.session
            .award(self.config.points_per_hit, self.config.coins_per_hit);
        self.events.push(RoundEvent::Hit {
            target: target.id,
            position: target.position,
            score: self.session.score(),
            coins: self.session.coins(),
        });
        ClickOutcome::Hit {
            target: target.id,
            position: target.position,
        }
    }

    /// Run every task due at `now`, oldest deadline first.
    pub fn advance(&mut self, now: f64) {
        while let Some((key, due)) = self.tasks.pop_due(now) {
            if !self.session.is_running() {
                // stale entry from a round that is no longer running
                continue;
            }
            match key {
                TaskKey::Countdown => self.on_tick(due),
                TaskKey::Spawn => self.on_spawn(due),
                TaskKey::Expire(id) => self.on_expire(id),
            }
        }
    }

    fn on_tick(&mut self, due: f64) {
        match self.session.tick() {
            Tick::Counted(time_left) => {
                self.events.push(RoundEvent::Ticked { time_left });
                // next tick counts from this deadline, late polls catch up
                self.tasks
                    .schedule_at(TaskKey::Countdown, due + self.config.tick_ms);
            }
            Tick::Finished => {
                self.events.push(RoundEvent::Ticked { time_left: 0 });
                self.end(due);
            }
            Tick::Ignored => {}
        }
    }

    fn on_spawn(&mut self, due: f64) {
        if let Some(id) = self.spawner.spawn(
            &mut self.grid,
            &mut self.tasks,
            &mut self.rng,
            &self.config,
            due,
        ) {
            if let Some(target) = self.spawner.target(id) {
                self.events.push(RoundEvent::Spawned {
                    target: id,
                    cell: target.cell,
                });
            }
        }
        // a full pond only skips this cycle
        let interval = self.config.spawn_interval_ms.sample(&mut self.rng);
        self.tasks.schedule_at(TaskKey::Spawn, due + interval);
    }

    fn on_expire(&mut self, id: TargetId) {
        if let Some(target) = self.spawner.expire(id, &mut self.grid) {
            self.events.push(RoundEvent::Expired {
                target: target.id,
                cell: target.cell,
            });
        }
    }

    fn end(&mut self, now: f64) {
        if !self.session.finish(now) {
            return;
        }
        self.clear_round();
        self.events.push(RoundEvent::Ended {
            score: self.session.score(),
            coins: self.session.coins(),
        });
    }

    fn clear_round(&mut self) {
        self.spawner.clear(&mut self.grid, &mut self.tasks);
        self.tasks.cancel_all();
    }
}
