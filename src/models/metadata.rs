// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-curve display metadata.

use serde::{Deserialize, Serialize};

/// RGBA color. The core never interprets it; renderers do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurveColor(pub [u8; 4]);

impl Default for CurveColor {
    fn default() -> Self {
        Self([255, 255, 255, 255])
    }
}

/// Visibility and color of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveMetadata {
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub color: CurveColor,
}

fn default_visible() -> bool {
    true
}

impl Default for CurveMetadata {
    fn default() -> Self {
        Self {
            visible: true,
            color: CurveColor::default(),
        }
    }
}
