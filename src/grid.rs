use crate::config::GameConfig;
use crate::engine::Point;
use crate::spawner::TargetId;

pub type CellId = usize;

/// A fixed slot on the pond. Holds at most one target, referenced by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub center: Point,
    pub size: f64,
    occupant: Option<TargetId>,
}

impl Cell {
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn occupant(&self) -> Option<TargetId> {
        self.occupant
    }
}

/// ┌──────────── Cell numbering (cols = 4) ────────────┐
/// │  0 │  1 │  2 │  3 │                               │
/// │  4 │  5 │  6 │  7 │   center = (col + ½, row + ½) * size
/// │  8 │  9 │ .. │    │                               │
/// └────────────────────────────────────────────────────┘
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: f64,
    height: f64,
    cell_size: f64,
    cells: Vec<Cell>,
}

impl Grid {
    /// Tile a `width` x `height` canvas. Same input, same grid.
    pub fn layout(width: f64, height: f64, config: &GameConfig) -> Self {
        let cell_size = config.cell_size.resolve(width, height);
        let cols = (width / cell_size).floor().max(0.0) as usize;
        let rows = (height / cell_size).floor().max(0.0) as usize;
        let count = (cols * rows).min(config.max_cells);
        Self::tiled(width, height, cell_size, cols, count)
    }

    /// `count` cells of `cell_size`, row-major over `cols` columns.
    pub fn tiled(width: f64, height: f64, cell_size: f64, cols: usize, count: usize) -> Self {
        let cells = if cols == 0 {
            Vec::new()
        } else {
            (0..count)
                .map(|id| {
                    let col = (id % cols) as f64;
                    let row = (id / cols) as f64;
                    Cell {
                        id,
                        center: Point {
                            x: col * cell_size + cell_size / 2.0,
                            y: row * cell_size + cell_size / 2.0,
                        },
                        size: cell_size,
                        occupant: None,
                    }
                })
                .collect()
        };
        Grid {
            width,
            height,
            cell_size,
            cells,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Materialized candidate list for a uniform pick.
    pub fn free_cells(&self) -> Vec<CellId> {
        self.cells
            .iter()
            .filter(|cell| !cell.is_occupied())
            .map(|cell| cell.id)
            .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_occupied()).count()
    }

    /// Place `target` on an empty cell. Refuses taken or unknown cells.
    pub fn occupy(&mut self, id: CellId, target: TargetId) -> bool {
        match self.cells.get_mut(id) {
            Some(cell) if cell.occupant.is_none() => {
                cell.occupant = Some(target);
                true
            }
            _ => false,
        }
    }

    /// Free the cell only if `target` is the one sitting there.
    pub fn release(&mut self, id: CellId, target: TargetId) -> bool {
        match self.cells.get_mut(id) {
            Some(cell) if cell.occupant == Some(target) => {
                cell.occupant = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.occupant = None;
        }
    }
}
