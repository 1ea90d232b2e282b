use crate::config::GameConfig;
use crate::engine::Point;
use crate::grid::{CellId, Grid};
use crate::timer::{TaskKey, TaskScheduler};
use rand::seq::SliceRandom;
use rand::Rng;

pub type TargetId = u64;

/// A crocodile on the pond.
/// - owned by [`SpawnScheduler`]
/// - its cell only keeps the id
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub id: TargetId,
    pub cell: CellId,
    pub position: Point,
    pub size: f64,
    pub spawned_at: f64,
    pub dwell_ms: f64,
    remaining_ms: Option<f64>,
    hit: bool,
}

impl Target {
    /// Dwell left at the moment of the last pause. `None` while running.
    pub fn remaining_ms(&self) -> Option<f64> {
        self.remaining_ms
    }

    /// Only ever true on the value [`SpawnScheduler::consume`] hands back;
    /// a target still on the pond has not been hit.
    pub fn is_hit(&self) -> bool {
        self.hit
    }
}

/// Places targets on free cells and takes them off again. Every live target
/// owns exactly one `TaskKey::Expire` entry in the task scheduler.
#[derive(Debug, Default)]
pub struct SpawnScheduler {
    targets: Vec<Target>,
    next_id: TargetId,
}

impl SpawnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live targets, oldest first.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|target| target.id == id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Pick a free cell uniformly and place a target with a random dwell.
    /// `None` when every cell is taken, the caller just skips this cycle.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        grid: &mut Grid,
        tasks: &mut TaskScheduler,
        rng: &mut R,
        config: &GameConfig,
        now: f64,
    ) -> Option<TargetId> {
        let free = grid.free_cells();
        let cell = *free.choose(rng)?;
        let dwell_ms = config.dwell_ms.sample(rng);
        let size = config.target_size.resolve(grid.width(), grid.height());
        self.place(grid, tasks, cell, size, dwell_ms, now)
    }

    /// Place a target on `cell` and arm its expiry.
    pub fn place(
        &mut self,
        grid: &mut Grid,
        tasks: &mut TaskScheduler,
        cell: CellId,
        size: f64,
        dwell_ms: f64,
        now: f64,
    ) -> Option<TargetId> {
        let position = grid.cell(cell)?.center;
        let id = self.next_id;
        if !grid.occupy(cell, id) {
            return None;
        }
        self.next_id += 1;
        self.targets.push(Target {
            id,
            cell,
            position,
            size,
            spawned_at: now,
            dwell_ms,
            remaining_ms: None,
            hit: false,
        });
        tasks.schedule(TaskKey::Expire(id), now, dwell_ms);
        Some(id)
    }

    /// Dwell ran out. Unknown ids are stale and ignored.
    pub fn expire(&mut self, id: TargetId, grid: &mut Grid) -> Option<Target> {
        self.remove(id, grid)
    }

    /// Take a target off the pond as hit. A second call for the same id finds
    /// nothing.
    pub fn consume(
        &mut self,
        id: TargetId,
        grid: &mut Grid,
        tasks: &mut TaskScheduler,
    ) -> Option<Target> {
        let mut target = self.remove(id, grid)?;
        tasks.cancel(TaskKey::Expire(id));
        target.hit = true;
        Some(target)
    }

    /// Copy each target's suspended remainder out of the task scheduler.
    pub fn record_remaining(&mut self, tasks: &TaskScheduler) {
        for target in &mut self.targets {
            target.remaining_ms = tasks.remaining(TaskKey::Expire(target.id));
        }
    }

    pub fn forget_remaining(&mut self) {
        for target in &mut self.targets {
            target.remaining_ms = None;
        }
    }

    /// Drop every target, its expiry and its cell.
    pub fn clear(&mut self, grid: &mut Grid, tasks: &mut TaskScheduler) {
        for target in self.targets.drain(..) {
            tasks.cancel(TaskKey::Expire(target.id));
            grid.release(target.cell, target.id);
        }
    }

    fn remove(&mut self, id: TargetId, grid: &mut Grid) -> Option<Target> {
        let index = self.targets.iter().position(|target| target.id == id)?;
        // Vec::remove keeps insertion order for the hit detector
        let target = self.targets.remove(index);
        grid.release(target.cell, target.id);
        Some(target)
    }
}
