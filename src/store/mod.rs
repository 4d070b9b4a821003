// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Curve state management.
//!
//! [`CurveStore`] is the single owner of the curve set, per-curve point
//! selection, curve-level selection, the active curve and the current frame.
//! Readers get copies or shared borrows, never a handle into the store's
//! containers. Every mutation emits a [`Signal`]; mutations inside a batch
//! are coalesced into one notification per category.
//!
//! The store is confined to the thread that created it. Every accessor and
//! mutator checks this and panics on violation.

pub mod display;
pub mod owner;
pub mod signals;

pub use display::DisplayMode;
pub use owner::OwnerThread;
pub use signals::{ListenerId, Notifier, Signal};

use crate::models::{CurveColor, CurveMetadata, CurvePatch, CurveRecord, Point, ProjectData, RevertPatch, Trajectory};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
struct CurveEntry {
    trajectory: Trajectory,
    metadata: CurveMetadata,
}

/// Owner of all curve data and editing state.
#[derive(Debug)]
pub struct CurveStore {
    owner: OwnerThread,
    /// Curves in load order.
    curves: IndexMap<String, CurveEntry>,
    /// Selected frames within each curve.
    point_selection: HashMap<String, BTreeSet<i32>>,
    /// Curves chosen for multi-curve display.
    selected_curves: BTreeSet<String>,
    show_all: bool,
    active_curve: Option<String>,
    current_frame: i32,
    image_sequence_length: Option<i32>,
    notifier: Notifier,
}

impl CurveStore {
    /// Create an empty store owned by the calling thread.
    pub fn new() -> Self {
        Self {
            owner: OwnerThread::current(),
            curves: IndexMap::new(),
            point_selection: HashMap::new(),
            selected_curves: BTreeSet::new(),
            show_all: false,
            active_curve: None,
            current_frame: 1,
            image_sequence_length: None,
            notifier: Notifier::new(),
        }
    }

    pub fn owner(&self) -> OwnerThread {
        self.owner
    }

    #[track_caller]
    fn check(&self, operation: &str) {
        self.owner.assert_current(operation);
    }

    // ------------------------------------------------------------------
    // Notification and batching
    // ------------------------------------------------------------------

    /// Register a listener for one change category.
    pub fn subscribe<F>(&mut self, signal: Signal, listener: F) -> ListenerId
    where
        F: FnMut(Signal) + Send + 'static,
    {
        self.check("subscribe");
        self.notifier.subscribe(signal, Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.check("unsubscribe");
        self.notifier.unsubscribe(id)
    }

    /// Open a batch. Batches nest.
    pub fn begin_batch(&mut self) {
        self.check("begin_batch");
        self.notifier.begin();
    }

    /// Close a batch. When the outermost batch closes, each category with
    /// pending changes fires exactly once.
    #[track_caller]
    pub fn end_batch(&mut self) {
        self.check("end_batch");
        self.notifier.end();
    }

    pub fn batch_depth(&self) -> usize {
        self.check("batch_depth");
        self.notifier.depth()
    }

    /// Run `f` inside a batch.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_batch();
        let result = f(self);
        self.end_batch();
        result
    }

    // ------------------------------------------------------------------
    // Curves
    // ------------------------------------------------------------------

    pub fn curve_names(&self) -> Vec<String> {
        self.check("curve_names");
        self.curves.keys().cloned().collect()
    }

    pub fn curve_count(&self) -> usize {
        self.check("curve_count");
        self.curves.len()
    }

    pub fn contains_curve(&self, name: &str) -> bool {
        self.check("contains_curve");
        self.curves.contains_key(name)
    }

    /// Copy of a curve's trajectory.
    pub fn get_curve(&self, name: &str) -> Option<Trajectory> {
        self.check("get_curve");
        self.curves.get(name).map(|entry| entry.trajectory.clone())
    }

    /// Read-only view of a curve's trajectory.
    pub fn curve(&self, name: &str) -> Option<&Trajectory> {
        self.check("curve");
        self.curves.get(name).map(|entry| &entry.trajectory)
    }

    /// Read-only views of every curve, in load order.
    pub fn curves(&self) -> impl Iterator<Item = (&str, &Trajectory)> {
        self.check("curves");
        self.curves
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.trajectory))
    }

    /// Create or overwrite a curve. A curve created in an empty store becomes
    /// the active curve when none is set; otherwise the pointer only moves
    /// through [`set_active_curve`](Self::set_active_curve).
    pub fn set_curve(&mut self, name: &str, trajectory: Trajectory) {
        self.check("set_curve");
        let first_curve = self.curves.is_empty();
        self.batch(|store| {
            match store.curves.get_mut(name) {
                Some(entry) if entry.trajectory == trajectory => return,
                Some(entry) => entry.trajectory = trajectory,
                None => {
                    log::debug!("Created curve '{}' ({} points)", name, trajectory.len());
                    store.curves.insert(
                        name.to_string(),
                        CurveEntry {
                            trajectory,
                            metadata: CurveMetadata::default(),
                        },
                    );
                }
            }
            store.notifier.emit(Signal::Curves);

            if first_curve && store.active_curve.is_none() {
                store.active_curve = Some(name.to_string());
                store.notifier.emit(Signal::ActiveCurve);
            }
            store.prune_selection(name);
            store.reclamp_frame();
        });
    }

    /// Create or overwrite a curve together with its metadata.
    pub fn set_curve_with_metadata(&mut self, name: &str, trajectory: Trajectory, metadata: CurveMetadata) {
        self.check("set_curve_with_metadata");
        self.batch(|store| {
            store.set_curve(name, trajectory);
            store.set_metadata(name, metadata);
        });
    }

    /// Remove a curve along with its selection state. Deleting the active
    /// curve clears the active-curve pointer.
    pub fn delete_curve(&mut self, name: &str) {
        self.check("delete_curve");
        if !self.curves.contains_key(name) {
            log::warn!("delete_curve: no curve named '{}'", name);
            return;
        }

        self.batch(|store| {
            store.curves.shift_remove(name);
            store.notifier.emit(Signal::Curves);
            log::debug!("Deleted curve '{}'", name);

            if store.point_selection.remove(name).is_some_and(|s| !s.is_empty()) {
                store.notifier.emit(Signal::Selection);
            }
            if store.selected_curves.remove(name) {
                store.notifier.emit(Signal::Selection);
            }
            if store.active_curve.as_deref() == Some(name) {
                store.active_curve = None;
                store.notifier.emit(Signal::ActiveCurve);
            }
            store.reclamp_frame();
        });
    }

    /// Remove every curve and all selection state.
    pub fn clear(&mut self) {
        self.check("clear");
        let names = self.curve_names();
        self.batch(|store| {
            for name in &names {
                store.delete_curve(name);
            }
            if store.show_all {
                store.show_all = false;
                store.notifier.emit(Signal::Selection);
            }
        });
    }

    /// Replace the point at its frame. Returns the point it replaced.
    pub fn set_point(&mut self, name: &str, point: Point) -> Option<Point> {
        self.check("set_point");
        let Some(entry) = self.curves.get_mut(name) else {
            log::warn!("set_point: no curve named '{}'", name);
            return None;
        };
        if entry.trajectory.get(point.frame) == Some(&point) {
            return Some(point);
        }

        let previous = entry.trajectory.insert(point);
        self.batch(|store| {
            store.notifier.emit(Signal::Curves);
            store.reclamp_frame();
        });
        previous
    }

    /// Remove the point at `frame`, dropping it from the point selection.
    pub fn remove_point(&mut self, name: &str, frame: i32) -> Option<Point> {
        self.check("remove_point");
        let Some(entry) = self.curves.get_mut(name) else {
            log::warn!("remove_point: no curve named '{}'", name);
            return None;
        };

        let removed = entry.trajectory.remove(frame)?;
        self.batch(|store| {
            store.notifier.emit(Signal::Curves);
            store.prune_selection(name);
            store.reclamp_frame();
        });
        Some(removed)
    }

    /// Apply a patch to the curve it names, returning the prior state.
    pub fn apply_patch(&mut self, patch: &CurvePatch) -> Option<RevertPatch> {
        self.check("apply_patch");
        let Some(entry) = self.curves.get_mut(&patch.curve) else {
            log::warn!("apply_patch: no curve named '{}'", patch.curve);
            return None;
        };

        let revert = entry.trajectory.apply_patch(patch);
        if !patch.is_empty() {
            self.batch(|store| {
                store.notifier.emit(Signal::Curves);
                store.reclamp_frame();
            });
        }
        Some(revert)
    }

    /// Undo a patch previously applied with [`apply_patch`](Self::apply_patch).
    pub fn revert_patch(&mut self, name: &str, revert: &RevertPatch) {
        self.check("revert_patch");
        let Some(entry) = self.curves.get_mut(name) else {
            log::warn!("revert_patch: no curve named '{}'", name);
            return;
        };

        entry.trajectory.revert(revert);
        self.batch(|store| {
            store.notifier.emit(Signal::Curves);
            store.prune_selection(name);
            store.reclamp_frame();
        });
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn metadata(&self, name: &str) -> Option<CurveMetadata> {
        self.check("metadata");
        self.curves.get(name).map(|entry| entry.metadata)
    }

    pub fn set_metadata(&mut self, name: &str, metadata: CurveMetadata) {
        self.check("set_metadata");
        let Some(entry) = self.curves.get_mut(name) else {
            log::warn!("set_metadata: no curve named '{}'", name);
            return;
        };
        if entry.metadata != metadata {
            entry.metadata = metadata;
            self.notifier.emit(Signal::Visibility);
        }
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) {
        self.check("set_visible");
        if let Some(metadata) = self.metadata(name) {
            self.set_metadata(name, CurveMetadata { visible, ..metadata });
        } else {
            log::warn!("set_visible: no curve named '{}'", name);
        }
    }

    pub fn set_color(&mut self, name: &str, color: CurveColor) {
        self.check("set_color");
        if let Some(metadata) = self.metadata(name) {
            self.set_metadata(name, CurveMetadata { color, ..metadata });
        } else {
            log::warn!("set_color: no curve named '{}'", name);
        }
    }

    // ------------------------------------------------------------------
    // Point selection
    // ------------------------------------------------------------------

    /// Selected frames of a curve. Unknown curves have an empty selection.
    pub fn get_selection(&self, name: &str) -> BTreeSet<i32> {
        self.check("get_selection");
        self.point_selection.get(name).cloned().unwrap_or_default()
    }

    /// Replace a curve's selected frames. Frames the curve has no point at
    /// are ignored.
    pub fn set_selection(&mut self, name: &str, frames: impl IntoIterator<Item = i32>) {
        self.check("set_selection");
        let Some(entry) = self.curves.get(name) else {
            log::warn!("set_selection: no curve named '{}'", name);
            return;
        };

        let frames: BTreeSet<i32> = frames
            .into_iter()
            .filter(|f| entry.trajectory.contains_frame(*f))
            .collect();
        let current = self.point_selection.get(name);
        if current.map_or(frames.is_empty(), |c| *c == frames) {
            return;
        }

        if frames.is_empty() {
            self.point_selection.remove(name);
        } else {
            self.point_selection.insert(name.to_string(), frames);
        }
        self.notifier.emit(Signal::Selection);
    }

    pub fn clear_selection(&mut self, name: &str) {
        self.check("clear_selection");
        if self.point_selection.remove(name).is_some() {
            self.notifier.emit(Signal::Selection);
        }
    }

    /// Drop selected frames that no longer exist in the curve.
    fn prune_selection(&mut self, name: &str) {
        let Some(selection) = self.point_selection.get_mut(name) else {
            return;
        };
        let Some(entry) = self.curves.get(name) else {
            return;
        };

        let before = selection.len();
        selection.retain(|f| entry.trajectory.contains_frame(*f));
        if selection.len() != before {
            if selection.is_empty() {
                self.point_selection.remove(name);
            }
            self.notifier.emit(Signal::Selection);
        }
    }

    // ------------------------------------------------------------------
    // Curve-level selection and display mode
    // ------------------------------------------------------------------

    pub fn selected_curves(&self) -> BTreeSet<String> {
        self.check("selected_curves");
        self.selected_curves.clone()
    }

    /// Replace the curve-level selection. Unknown names are ignored.
    pub fn set_selected_curves<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check("set_selected_curves");
        let mut selected = BTreeSet::new();
        for name in names.into_iter().map(Into::into) {
            if self.curves.contains_key(&name) {
                selected.insert(name);
            } else {
                log::warn!("set_selected_curves: no curve named '{}'", name);
            }
        }

        if selected != self.selected_curves {
            self.selected_curves = selected;
            self.notifier.emit(Signal::Selection);
        }
    }

    pub fn show_all(&self) -> bool {
        self.check("show_all");
        self.show_all
    }

    pub fn set_show_all(&mut self, show_all: bool) {
        self.check("set_show_all");
        if self.show_all != show_all {
            self.show_all = show_all;
            self.notifier.emit(Signal::Selection);
        }
    }

    /// Derived from the show-all flag and the curve-level selection on every
    /// call.
    pub fn display_mode(&self) -> DisplayMode {
        self.check("display_mode");
        DisplayMode::resolve(self.show_all, !self.selected_curves.is_empty())
    }

    /// Names of the curves to draw under the current display mode, in load
    /// order. Hidden curves are never included.
    pub fn visible_curves(&self) -> Vec<String> {
        self.check("visible_curves");
        let mode = self.display_mode();
        self.curves
            .iter()
            .filter(|(_, entry)| entry.metadata.visible)
            .filter(|(name, _)| match mode {
                DisplayMode::AllVisible => true,
                DisplayMode::Selected => self.selected_curves.contains(*name),
                DisplayMode::ActiveOnly => self.active_curve.as_ref() == Some(*name),
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    // ------------------------------------------------------------------
    // Active curve
    // ------------------------------------------------------------------

    pub fn active_curve(&self) -> Option<String> {
        self.check("active_curve");
        self.active_curve.clone()
    }

    /// Point the active curve at `name`, or clear it with `None`.
    pub fn set_active_curve(&mut self, name: Option<&str>) {
        self.check("set_active_curve");
        if let Some(name) = name {
            if !self.curves.contains_key(name) {
                log::warn!("set_active_curve: no curve named '{}'", name);
                return;
            }
        }
        if self.active_curve.as_deref() != name {
            self.active_curve = name.map(str::to_string);
            self.notifier.emit(Signal::ActiveCurve);
        }
    }

    // ------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------

    /// Number of frames the current frame ranges over. The image sequence
    /// length governs when set, otherwise the last frame of any curve.
    pub fn total_frames(&self) -> i32 {
        self.check("total_frames");
        self.image_sequence_length
            .unwrap_or_else(|| {
                self.curves
                    .values()
                    .filter_map(|entry| entry.trajectory.frame_range())
                    .map(|(_, last)| last)
                    .max()
                    .unwrap_or(1)
            })
            .max(1)
    }

    pub fn image_sequence_length(&self) -> Option<i32> {
        self.check("image_sequence_length");
        self.image_sequence_length
    }

    pub fn set_image_sequence_length(&mut self, length: Option<i32>) {
        self.check("set_image_sequence_length");
        let length = match length {
            Some(n) if n < 1 => {
                log::warn!("Ignoring image sequence length {}", n);
                None
            }
            other => other,
        };
        self.image_sequence_length = length;
        self.reclamp_frame();
    }

    pub fn current_frame(&self) -> i32 {
        self.check("current_frame");
        self.current_frame
    }

    /// Move the current frame, clamped to `[1, total_frames]`.
    pub fn set_frame(&mut self, frame: i32) {
        self.check("set_frame");
        let clamped = frame.clamp(1, self.total_frames());
        if clamped != frame {
            log::debug!("Frame {} clamped to {}", frame, clamped);
        }
        if clamped != self.current_frame {
            self.current_frame = clamped;
            self.notifier.emit(Signal::Frame);
        }
    }

    fn reclamp_frame(&mut self) {
        let frame = self.current_frame;
        self.set_frame(frame);
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    /// Replace the curve set with a loaded project, as one batch.
    pub fn load_project(&mut self, project: &ProjectData) {
        self.check("load_project");
        self.batch(|store| {
            store.clear();
            store.set_image_sequence_length(project.image_sequence_length);
            for record in &project.curves {
                store.set_curve_with_metadata(&record.name, record.trajectory(), record.metadata);
            }
        });
        log::info!(
            "Loaded {} curves ({} points)",
            project.curves.len(),
            project.point_count()
        );
    }

    /// Snapshot of the curve set as project data.
    pub fn project(&self) -> ProjectData {
        self.check("project");
        ProjectData {
            image_sequence_length: self.image_sequence_length,
            curves: self
                .curves
                .iter()
                .map(|(name, entry)| CurveRecord::new(name.as_str(), &entry.trajectory, entry.metadata))
                .collect(),
        }
    }
}

impl Default for CurveStore {
    fn default() -> Self {
        Self::new()
    }
}
