// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Grid-bucket index over projected point positions.
//!
//! Views rebuild the index from their own screen positions after a data or
//! transform change and then use it for hit-testing. The index is a private
//! cache: it never owns curve data and is never shared as a source of truth.
//!
//! # Cell size
//!
//! Positions are bucketed into square cells laid over the bounding box of
//! the entries. A radius query visits only the cells overlapping the query
//! square, so the cost is roughly `(2r / cell + 1)^2` buckets times their
//! occupancy. [`DEFAULT_CELL_SIZE`] is 32 screen pixels: about four times a
//! typical hit radius, which keeps a hit-test to one to four cells while
//! dense tracks (a point every few pixels) stay at a few dozen entries per
//! bucket. The grid is capped at [`MAX_CELLS`] cells; sparse, widely spread
//! entries get a coarser effective cell size instead of a huge grid.

use super::geometry::{distance, ViewTransform};
use crate::models::Trajectory;

/// Default bucket edge length, in screen pixels.
pub const DEFAULT_CELL_SIZE: f64 = 32.0;

/// Upper bound on the number of grid cells.
pub const MAX_CELLS: usize = 1 << 16;

/// One projected point.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub curve: String,
    pub frame: i32,
    pub x: f64,
    pub y: f64,
}

/// Result of a nearest-point query.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub curve: String,
    pub frame: i32,
    pub distance: f64,
}

/// Bucket occupancy after a rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndexStats {
    pub entries: usize,
    pub cells: usize,
    pub occupied_cells: usize,
    pub max_bucket: usize,
    /// Mean entries per occupied cell.
    pub mean_bucket: f64,
}

/// Flat-array 2D grid for nearest-point lookups.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    /// Cell size actually used by the current grid, after the cell cap.
    effective_cell_size: f64,
    origin_x: f64,
    origin_y: f64,
    cols: usize,
    rows: usize,
    /// Each cell stores indices into `entries`.
    cells: Vec<Vec<usize>>,
    entries: Vec<IndexEntry>,
    fresh: bool,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialIndex {
    /// Create an empty, not-yet-built index.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            log::warn!("Invalid spatial index cell size {}, using default", cell_size);
            DEFAULT_CELL_SIZE
        };
        Self {
            cell_size,
            effective_cell_size: cell_size,
            origin_x: 0.0,
            origin_y: 0.0,
            cols: 0,
            rows: 0,
            cells: Vec::new(),
            entries: Vec::new(),
            fresh: false,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn effective_cell_size(&self) -> f64 {
        self.effective_cell_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the contents match the last rebuild request.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Mark the index stale without clearing it.
    pub fn invalidate(&mut self) {
        self.fresh = false;
    }

    /// Replace all contents. Entries with non-finite coordinates are dropped.
    pub fn rebuild(&mut self, entries: Vec<IndexEntry>) {
        let total = entries.len();
        self.entries = entries
            .into_iter()
            .filter(|e| e.x.is_finite() && e.y.is_finite())
            .collect();
        if self.entries.len() < total {
            log::debug!("Dropped {} non-finite entries", total - self.entries.len());
        }

        let (min_x, min_y, max_x, max_y) = self.entries.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(ax, ay, bx, by), e| (ax.min(e.x), ay.min(e.y), bx.max(e.x), by.max(e.y)),
        );

        if self.entries.is_empty() {
            self.cols = 0;
            self.rows = 0;
            self.cells.clear();
        } else {
            let width = max_x - min_x;
            let height = max_y - min_y;
            let mut cell = self.cell_size;
            while cell_count(width, height, cell) > MAX_CELLS {
                cell *= 2.0;
            }
            let (cols, rows) = grid_dims(width, height, cell);

            self.effective_cell_size = cell;
            self.origin_x = min_x;
            self.origin_y = min_y;
            self.cols = cols;
            self.rows = rows;
            self.cells = vec![Vec::new(); cols * rows];
            for (i, entry) in self.entries.iter().enumerate() {
                let (col, row) = self.cell_of(entry.x, entry.y);
                self.cells[row * cols + col].push(i);
            }
        }

        self.fresh = true;
    }

    /// Map a position to (col, row), clamped to the grid.
    fn cell_of(&self, x: f64, y: f64) -> (usize, usize) {
        let col = ((x - self.origin_x) / self.effective_cell_size).floor().max(0.0) as usize;
        let row = ((y - self.origin_y) / self.effective_cell_size).floor().max(0.0) as usize;
        (col.min(self.cols - 1), row.min(self.rows - 1))
    }

    /// Indices of entries in cells overlapping the given box.
    fn candidates(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> impl Iterator<Item = usize> + '_ {
        let (col_lo, row_lo) = self.cell_of(min_x, min_y);
        let (col_hi, row_hi) = self.cell_of(max_x, max_y);
        (row_lo..=row_hi)
            .flat_map(move |row| (col_lo..=col_hi).map(move |col| row * self.cols + col))
            .flat_map(move |cell| self.cells[cell].iter().copied())
    }

    fn usable(&self) -> bool {
        if !self.fresh {
            log::warn!("Spatial index queried while stale");
            return false;
        }
        !self.entries.is_empty()
    }

    /// Closest entry within `radius` of `(x, y)`.
    ///
    /// Ties go to the entry given first to [`rebuild`](Self::rebuild). A
    /// stale index answers nothing.
    pub fn query(&self, x: f64, y: f64, radius: f64) -> Option<Hit> {
        if !self.usable() || !x.is_finite() || !y.is_finite() || !(radius >= 0.0) {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for i in self.candidates(x - radius, y - radius, x + radius, y + radius) {
            let entry = &self.entries[i];
            let d = distance(x, y, entry.x, entry.y);
            if d > radius {
                continue;
            }
            match best {
                Some((best_i, best_d)) if d > best_d || (d == best_d && i > best_i) => {}
                _ => best = Some((i, d)),
            }
        }

        best.map(|(i, d)| Hit {
            curve: self.entries[i].curve.clone(),
            frame: self.entries[i].frame,
            distance: d,
        })
    }

    /// Every entry inside the rectangle, in rebuild order.
    pub fn query_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<(String, i32)> {
        if !self.usable() || min_x > max_x || min_y > max_y {
            return Vec::new();
        }

        let mut found: Vec<usize> = self
            .candidates(min_x, min_y, max_x, max_y)
            .filter(|&i| {
                let e = &self.entries[i];
                (min_x..=max_x).contains(&e.x) && (min_y..=max_y).contains(&e.y)
            })
            .collect();
        found.sort_unstable();
        found
            .into_iter()
            .map(|i| (self.entries[i].curve.clone(), self.entries[i].frame))
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        let occupied: Vec<usize> = self.cells.iter().map(Vec::len).filter(|&n| n > 0).collect();
        IndexStats {
            entries: self.entries.len(),
            cells: self.cells.len(),
            occupied_cells: occupied.len(),
            max_bucket: occupied.iter().copied().max().unwrap_or(0),
            mean_bucket: if occupied.is_empty() {
                0.0
            } else {
                self.entries.len() as f64 / occupied.len() as f64
            },
        }
    }
}

fn grid_dims(width: f64, height: f64, cell: f64) -> (usize, usize) {
    let cols = ((width / cell).floor() as usize).saturating_add(1);
    let rows = ((height / cell).floor() as usize).saturating_add(1);
    (cols, rows)
}

fn cell_count(width: f64, height: f64, cell: f64) -> usize {
    let (cols, rows) = grid_dims(width, height, cell);
    cols.saturating_mul(rows)
}

/// Project every point of the given curves to screen space.
pub fn entries_from_curves<'a>(
    curves: impl IntoIterator<Item = (&'a str, &'a Trajectory)>,
    transform: &ViewTransform,
) -> Vec<IndexEntry> {
    curves
        .into_iter()
        .flat_map(|(name, trajectory)| {
            trajectory.sorted().into_iter().map(move |p| {
                let (x, y) = transform.to_screen(p.x, p.y);
                IndexEntry {
                    curve: name.to_string(),
                    frame: p.frame,
                    x,
                    y,
                }
            })
        })
        .collect()
}
