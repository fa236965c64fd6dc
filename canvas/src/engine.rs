use std::mem;

use tracing::{debug, info, warn};

use crate::camera::{Camera, Point};
use crate::card::{Card, CardError, CardId, CardPayload, CardStore};
use crate::consts::{DECIMATION_THRESHOLD_SQ_PX, ERASER_RADIUS, HISTORY_DEPTH, MAX_SCALE, MIN_SCALE};
use crate::hit;
use crate::history::{History, HistoryEntry};
use crate::input::{InputError, InputState, PointerAction, PointerEvent, Tool, ToolType, UiState};
use crate::stroke::{Erasure, InkPoint, Layer, StrokeId, StrokeStore};
use crate::viewport::Viewport;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Something visible changed; repaint.
    RenderNeeded,
    /// The pan/zoom transform changed.
    ViewportChanged(Camera),
    /// A stroke was committed to a layer.
    StrokeCommitted { id: StrokeId, layer: Layer },
    /// The eraser removed strokes.
    StrokesErased { count: usize },
    /// Document content changed and should be persisted.
    NeedsSave,
}

/// Tunables for an engine instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Squared screen-space distance (px²) below which ink points are decimated.
    pub decimation_sq_px: f64,
    /// Eraser hit-test radius in canvas units.
    pub eraser_radius: f64,
    /// Maximum number of undo entries.
    pub history_depth: usize,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decimation_sq_px: DECIMATION_THRESHOLD_SQ_PX,
            eraser_radius: ERASER_RADIUS,
            history_depth: HISTORY_DEPTH,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

/// One card mutation requested by a generation response.
#[derive(Debug, Clone, PartialEq)]
pub enum CardOp {
    /// Add a new card on top.
    Place(Card),
    /// Replace the payload (and so the type) of the card carrying `asset_id`.
    Modify { asset_id: String, payload: CardPayload, source_asset_ids: Option<Vec<String>> },
    /// Remove every card carrying `asset_id`.
    Delete { asset_id: String },
}

/// Outcome of [`EngineCore::apply_generation`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub placed: usize,
    pub modified: usize,
    pub deleted: usize,
    /// Asset ids referenced by modify/delete ops that matched no card.
    pub missing: Vec<String>,
    /// Consumed magic strokes that were removed.
    pub magic_removed: usize,
}

impl ApplyReport {
    /// Whether any card or stroke changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.placed + self.modified + self.deleted + self.magic_removed > 0
    }
}

/// Canvas context: owns every store and the input state machine.
///
/// All mutations go through methods on this type; readers get shared borrows.
/// Hosts that are multi-threaded must serialize calls (e.g. behind one mutex).
pub struct EngineCore {
    strokes: StrokeStore,
    cards: CardStore,
    history: History,
    viewport: Viewport,
    pub ui: UiState,
    input: InputState,
    eraser_radius: f64,
    revision: u64,
    dirty: bool,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            strokes: StrokeStore::with_decimation(config.decimation_sq_px),
            cards: CardStore::new(),
            history: History::new(config.history_depth),
            viewport: Viewport::default().with_scale_limits(config.min_scale, config.max_scale),
            ui: UiState::default(),
            input: InputState::Idle,
            eraser_radius: config.eraser_radius,
            revision: 0,
            dirty: false,
        }
    }

    // --- Tool / viewport ---

    /// Set the active tool. Takes effect at the next pen-down.
    pub fn set_tool(&mut self, tool: Tool) {
        self.ui.tool = tool;
    }

    /// Update the drawing surface size after a layout change.
    pub fn set_viewport_size(&mut self, width_px: f64, height_px: f64) -> Vec<Action> {
        self.viewport.set_size(width_px, height_px);
        vec![Action::ViewportChanged(self.viewport.camera()), Action::RenderNeeded]
    }

    // --- Pointer input ---

    /// Feed one pointer event through the gesture state machine.
    ///
    /// Malformed sequences never fail: the active gesture is aborted and the
    /// machine returns to idle.
    pub fn on_pointer(&mut self, event: &PointerEvent) -> Vec<Action> {
        match self.dispatch(event) {
            Ok(actions) => actions,
            Err(err) => {
                warn!(error = %err, state = self.input.name(), "input: malformed pointer sequence, resetting");
                self.abort_gesture()
            }
        }
    }

    fn dispatch(&mut self, event: &PointerEvent) -> Result<Vec<Action>, InputError> {
        match event.action {
            PointerAction::Down => {
                if event.tool.is_pen() {
                    Ok(self.pen_down(event))
                } else if matches!(self.input, InputState::Idle) {
                    self.input = InputState::Panning { last_screen: event.position };
                    Ok(Vec::new())
                } else {
                    Err(InputError::UnexpectedDown(self.input.name()))
                }
            }
            PointerAction::PointerDown => {
                if event.tool.is_pen() {
                    return Ok(self.pen_down(event));
                }
                self.finger_added(event)
            }
            PointerAction::Move => self.pointer_move(event),
            PointerAction::PointerUp => Ok(self.pointer_lifted(event)),
            PointerAction::Up | PointerAction::Cancel => Ok(self.finish_gesture()),
        }
    }

    /// Pens preempt any finger gesture and start drawing or erasing.
    fn pen_down(&mut self, event: &PointerEvent) -> Vec<Action> {
        let mut actions = self.finish_gesture();
        let at = self.viewport.camera().screen_to_canvas(event.position);
        match self.ui.tool.ink_mode() {
            Some(mode) if event.tool != ToolType::Eraser => {
                self.strokes
                    .start_stroke(InkPoint::new(at.x, at.y, event.pressure), mode);
                self.input = InputState::Drawing;
                actions.push(Action::RenderNeeded);
            }
            _ => {
                let removed = self.strokes.erase_near(at, self.eraser_radius);
                actions.extend(self.erased_actions(&removed));
                self.input = InputState::Erasing { removed };
            }
        }
        actions
    }

    fn finger_added(&mut self, event: &PointerEvent) -> Result<Vec<Action>, InputError> {
        let (a, b) = event
            .pinch_pair()
            .ok_or(InputError::PinchPointerMissing(event.pointer_count()))?;
        match self.input {
            InputState::Idle => Err(InputError::NoActiveGesture),
            InputState::Pinching { .. } => {
                self.input = InputState::pinch(a, b);
                Ok(Vec::new())
            }
            InputState::Drawing | InputState::Erasing { .. } | InputState::Panning { .. } => {
                let actions = self.finish_gesture();
                debug!("input: second finger down, entering pinch");
                self.input = InputState::pinch(a, b);
                Ok(actions)
            }
        }
    }

    fn pointer_move(&mut self, event: &PointerEvent) -> Result<Vec<Action>, InputError> {
        match &mut self.input {
            InputState::Idle => Ok(Vec::new()),
            InputState::Drawing => {
                let camera = self.viewport.camera();
                let at = camera.screen_to_canvas(event.position);
                let recorded = self
                    .strokes
                    .append_point(InkPoint::new(at.x, at.y, event.pressure), camera.scale);
                Ok(if recorded { vec![Action::RenderNeeded] } else { Vec::new() })
            }
            InputState::Erasing { removed } => {
                let at = self.viewport.camera().screen_to_canvas(event.position);
                let step = self.strokes.erase_near(at, self.eraser_radius);
                let count = step.len();
                removed.extend(step);
                if count == 0 {
                    return Ok(Vec::new());
                }
                self.bump();
                Ok(vec![Action::StrokesErased { count }, Action::RenderNeeded])
            }
            InputState::Panning { last_screen } => {
                let dx = event.position.x - last_screen.x;
                let dy = event.position.y - last_screen.y;
                *last_screen = event.position;
                self.viewport.pan_by(dx, dy);
                Ok(self.viewport_actions())
            }
            InputState::Pinching { last_distance, last_center } => {
                let (a, b) = event
                    .pinch_pair()
                    .ok_or(InputError::PinchPointerMissing(event.pointer_count()))?;
                let distance = a.dist(b);
                let center = a.midpoint(b);
                let factor = if *last_distance > 0.0 && distance > 0.0 { distance / *last_distance } else { 1.0 };
                let prev_center = *last_center;
                *last_distance = distance;
                *last_center = center;
                if self.viewport.zoom_about(prev_center, center, factor) {
                    Ok(self.viewport_actions())
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    fn pointer_lifted(&mut self, event: &PointerEvent) -> Vec<Action> {
        if !matches!(self.input, InputState::Pinching { .. }) {
            return Vec::new();
        }
        self.input = match event.pointers.as_slice() {
            [] => InputState::Idle,
            [remaining] => InputState::Panning { last_screen: *remaining },
            [a, b, ..] => InputState::pinch(*a, *b),
        };
        Vec::new()
    }

    /// End the active gesture, committing its result, and return to idle.
    fn finish_gesture(&mut self) -> Vec<Action> {
        match mem::take(&mut self.input) {
            InputState::Drawing => match self.strokes.commit_stroke() {
                Some(stroke) => {
                    let id = stroke.id;
                    let layer = stroke.layer();
                    self.history.push(HistoryEntry::AddStroke { layer, stroke });
                    self.bump();
                    vec![Action::StrokeCommitted { id, layer }, Action::RenderNeeded, Action::NeedsSave]
                }
                None => vec![Action::RenderNeeded],
            },
            InputState::Erasing { removed } => self.record_erasure(removed),
            InputState::Idle | InputState::Panning { .. } | InputState::Pinching { .. } => Vec::new(),
        }
    }

    /// Drop the active gesture. Erasures already applied are still recorded.
    fn abort_gesture(&mut self) -> Vec<Action> {
        match mem::take(&mut self.input) {
            InputState::Drawing => {
                self.strokes.cancel_stroke();
                vec![Action::RenderNeeded]
            }
            InputState::Erasing { removed } => self.record_erasure(removed),
            InputState::Idle | InputState::Panning { .. } | InputState::Pinching { .. } => Vec::new(),
        }
    }

    fn record_erasure(&mut self, removed: Erasure) -> Vec<Action> {
        if removed.is_empty() {
            return Vec::new();
        }
        debug!(count = removed.len(), "input: erase gesture recorded");
        let Erasure { removed_permanent, removed_magic } = removed;
        self.history
            .push(HistoryEntry::EraseStrokes { removed_permanent, removed_magic });
        vec![Action::NeedsSave]
    }

    fn erased_actions(&mut self, removed: &Erasure) -> Vec<Action> {
        if removed.is_empty() {
            return Vec::new();
        }
        self.bump();
        vec![Action::StrokesErased { count: removed.len() }, Action::RenderNeeded]
    }

    fn viewport_actions(&self) -> Vec<Action> {
        vec![Action::ViewportChanged(self.viewport.camera()), Action::RenderNeeded]
    }

    // --- History ---

    /// Revert the most recent mutation. Empty when there is nothing to undo.
    pub fn undo(&mut self) -> Vec<Action> {
        if self.history.undo(&mut self.strokes, &mut self.cards) {
            self.bump();
            vec![Action::RenderNeeded, Action::NeedsSave]
        } else {
            Vec::new()
        }
    }

    /// Re-apply the most recently undone mutation. Empty when there is nothing to redo.
    pub fn redo(&mut self) -> Vec<Action> {
        if self.history.redo(&mut self.strokes, &mut self.cards) {
            self.bump();
            vec![Action::RenderNeeded, Action::NeedsSave]
        } else {
            Vec::new()
        }
    }

    // --- Cards (user edits) ---

    /// Place a user-created card (paste / attach) on top.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::DegenerateRect`] if the card's rect has no area.
    pub fn add_card(&mut self, card: Card) -> Result<Vec<Action>, CardError> {
        ensure_card_rect(&card)?;
        self.cards.push(card.clone());
        self.history.push(HistoryEntry::AddCard(card));
        self.bump();
        Ok(vec![Action::RenderNeeded, Action::NeedsSave])
    }

    /// Put a card from a saved document on top. Not recorded in history and
    /// does not mark the document dirty.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::DegenerateRect`] if the card's rect has no area.
    pub fn load_card(&mut self, card: Card) -> Result<(), CardError> {
        ensure_card_rect(&card)?;
        self.cards.push(card);
        self.revision += 1;
        Ok(())
    }

    /// Delete a card.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::NotFound`] if no card has this id.
    pub fn delete_card(&mut self, id: &CardId) -> Result<Vec<Action>, CardError> {
        let removed = self.cards.remove(id).ok_or(CardError::NotFound(*id))?;
        self.history.push(HistoryEntry::RemoveCard(removed));
        self.bump();
        Ok(vec![Action::RenderNeeded, Action::NeedsSave])
    }

    /// Commit a finished drag: translate a card by `(dx, dy)` canvas units.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::NotFound`] if no card has this id.
    pub fn move_card(&mut self, id: &CardId, dx: f64, dy: f64) -> Result<Vec<Action>, CardError> {
        let from = self.cards.get(id).ok_or(CardError::NotFound(*id))?.rect;
        let to = from.translated(dx, dy);
        if !to.is_valid() {
            return Err(CardError::DegenerateRect(to));
        }
        self.cards.set_rect(id, to);
        self.history.push(HistoryEntry::MoveCard { id: *id, from, to });
        self.bump();
        Ok(vec![Action::RenderNeeded, Action::NeedsSave])
    }

    /// Apply card ops in order, recording them as one undo step.
    ///
    /// Modify/delete ops whose asset id matches nothing are dropped and
    /// reported in [`ApplyReport::missing`]; the remaining ops still apply.
    pub fn apply_card_ops(&mut self, ops: Vec<CardOp>) -> ApplyReport {
        self.apply_generation(ops, &[])
    }

    /// Apply a generation response and remove the magic strokes it was built
    /// from, recording both as one undo step.
    ///
    /// Undoing the step removes the placed cards and brings the consumed ink
    /// back; magic strokes not listed in `consumed_magic` are left alone.
    pub fn apply_generation(&mut self, ops: Vec<CardOp>, consumed_magic: &[StrokeId]) -> ApplyReport {
        let mut report = ApplyReport::default();
        let mut entries = self.card_op_entries(ops, &mut report);
        let removed_magic = self.strokes.remove_magic(consumed_magic);
        report.magic_removed = removed_magic.len();
        if !removed_magic.is_empty() {
            entries.push(HistoryEntry::EraseStrokes { removed_permanent: Vec::new(), removed_magic });
        }
        if let Some(entry) = group_entries(entries) {
            self.history.push(entry);
            self.bump();
        }
        info!(
            placed = report.placed,
            modified = report.modified,
            deleted = report.deleted,
            missing = report.missing.len(),
            magic_removed = report.magic_removed,
            "generation: card ops applied"
        );
        report
    }

    fn card_op_entries(&mut self, ops: Vec<CardOp>, report: &mut ApplyReport) -> Vec<HistoryEntry> {
        let mut entries = Vec::new();
        for op in ops {
            match op {
                CardOp::Place(card) => {
                    if !card.rect.is_valid() {
                        warn!(asset_id = %card.asset_id, "generation: skipping card with degenerate rect");
                        continue;
                    }
                    self.cards.push(card.clone());
                    entries.push(HistoryEntry::AddCard(card));
                    report.placed += 1;
                }
                CardOp::Modify { asset_id, payload, source_asset_ids } => {
                    let Some(before) = self.cards.find_by_asset_id(&asset_id).cloned() else {
                        warn!(%asset_id, "generation: modify target not found, dropping");
                        report.missing.push(asset_id);
                        continue;
                    };
                    let mut after = before.clone();
                    after.payload = payload;
                    if let Some(sources) = source_asset_ids {
                        after.source_asset_ids = sources;
                    }
                    self.cards.replace(after.clone());
                    entries.push(HistoryEntry::ModifyCard { before, after });
                    report.modified += 1;
                }
                CardOp::Delete { asset_id } => {
                    let removed = self.cards.remove_by_asset_id(&asset_id);
                    if removed.is_empty() {
                        warn!(%asset_id, "generation: delete target not found, dropping");
                        report.missing.push(asset_id);
                        continue;
                    }
                    report.deleted += removed.len();
                    entries.extend(removed.into_iter().map(HistoryEntry::RemoveCard));
                }
            }
        }
        entries
    }

    // --- Magic ink ---

    /// Remove all magic ink as one undo step. Returns how many strokes were removed.
    pub fn clear_magic_layer(&mut self) -> usize {
        let removed_magic = self.strokes.clear_magic_layer();
        let count = removed_magic.len();
        if count > 0 {
            self.history
                .push(HistoryEntry::EraseStrokes { removed_permanent: Vec::new(), removed_magic });
            self.bump();
        }
        count
    }

    // --- Persistence signal ---

    /// Whether content changed since the last [`EngineCore::mark_saved`].
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Acknowledge that the host persisted the current state.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn bump(&mut self) {
        self.revision += 1;
        self.dirty = true;
    }

    // --- Queries ---

    #[must_use]
    pub fn strokes(&self) -> &StrokeStore {
        &self.strokes
    }

    #[must_use]
    pub fn cards(&self) -> &CardStore {
        &self.cards
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The current camera state.
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.viewport.camera()
    }

    #[must_use]
    pub fn input_state(&self) -> &InputState {
        &self.input
    }

    /// Monotonic counter bumped on every content mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Topmost card under a screen-space point, for starting a drag.
    #[must_use]
    pub fn card_at(&self, screen_pt: Point) -> Option<&Card> {
        hit::card_at(&self.cards, self.camera().screen_to_canvas(screen_pt))
    }

    /// Strokes the eraser would remove at a screen-space point (hover preview).
    #[must_use]
    pub fn strokes_under_eraser(&self, screen_pt: Point) -> Vec<StrokeId> {
        hit::strokes_near(&self.strokes, self.camera().screen_to_canvas(screen_pt), self.eraser_radius)
    }
}

fn ensure_card_rect(card: &Card) -> Result<(), CardError> {
    if card.rect.is_valid() { Ok(()) } else { Err(CardError::DegenerateRect(card.rect)) }
}

/// Collapse the entries from one generation response into a single undo step.
fn group_entries(mut entries: Vec<HistoryEntry>) -> Option<HistoryEntry> {
    if entries.len() <= 1 {
        return entries.pop();
    }
    if entries.iter().all(|e| matches!(e, HistoryEntry::AddCard(_))) {
        let cards = entries
            .into_iter()
            .filter_map(|e| match e {
                HistoryEntry::AddCard(card) => Some(card),
                _ => None,
            })
            .collect();
        return Some(HistoryEntry::AddCards(cards));
    }
    Some(HistoryEntry::Batch(entries))
}
