// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Which curves are shown, derived from the curve-level selection.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Every visible curve.
    AllVisible,
    /// The curve-level selection.
    Selected,
    /// Only the active curve.
    ActiveOnly,
}

impl DisplayMode {
    /// Show-all wins over a non-empty selection, which wins over the active
    /// curve alone.
    pub fn resolve(show_all: bool, has_selection: bool) -> Self {
        if show_all {
            Self::AllVisible
        } else if has_selection {
            Self::Selected
        } else {
            Self::ActiveOnly
        }
    }
}
