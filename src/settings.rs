// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor settings.
//!
//! Tunables for hit-testing and gap filling, read from a YAML or JSON file.
//! Missing fields fall back to their defaults.

use crate::engine::gap_fill::{FillMode, GapOptions};
use crate::io::serialization;
use crate::util::spatial_index::{SpatialIndex, DEFAULT_CELL_SIZE};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Spatial index bucket size, in screen pixels.
    pub cell_size: f64,
    /// Maximum distance for a hit-test, in screen pixels.
    pub hit_radius: f64,
    /// Let gap detection run across ENDFRAMEs.
    pub bridge_endframes: bool,
    /// Strategy used when several curves are selected.
    pub multi_curve_fill: FillMode,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            hit_radius: 8.0,
            bridge_endframes: false,
            multi_curve_fill: FillMode::CopyWithOffset,
        }
    }
}

impl EditorSettings {
    /// Load settings from `path`, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let settings: Self = serialization::read_file(path)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn gap_options(&self) -> GapOptions {
        GapOptions {
            bridge_endframes: self.bridge_endframes,
        }
    }

    /// Interpolation for a single curve, the configured strategy otherwise.
    pub fn fill_mode(&self, source_count: usize) -> FillMode {
        if source_count == 0 {
            FillMode::Interpolate
        } else {
            self.multi_curve_fill
        }
    }

    pub fn spatial_index(&self) -> SpatialIndex {
        SpatialIndex::new(self.cell_size)
    }
}
