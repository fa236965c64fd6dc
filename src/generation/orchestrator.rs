//! Generation orchestrator: magic ink in, cards out.
//!
//! DESIGN
//! ======
//! `play` runs in three phases. Prepare and apply lock the engine briefly and
//! do only synchronous work; the snapshot and the transport call run with the
//! lock released so the canvas stays responsive while a request is in flight.
//! The response is applied against the rectangle captured at prepare time, so
//! panning during generation does not shift the placed cards.
//!
//! Anything that fails before apply leaves the stores untouched. During apply,
//! each action stands alone: a bad one is skipped and reported, the rest land
//! as a single undo step together with the removal of the magic ink that was
//! sent. A card scope only sends (and consumes) the magic ink over that card.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use canvas::card::CardId;
use canvas::engine::{Action, CardOp, EngineCore};
use canvas::geometry::{GeometryError, Rect};
use canvas::stroke::{Stroke, StrokeId};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::config::DEFAULT_SNAPSHOT_TIMEOUT_MS;
use super::error::GenerationError;
use super::protocol::{
    ActionError, AssetDescriptor, GenerationRequest, GenerationResponse, ViewportSize, decode_action,
};
use super::snapshot::{SnapshotProvider, SnapshotRegion};
use super::transport::GenerationTransport;

// =============================================================================
// TYPES
// =============================================================================

/// What a generation looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The visible canvas and every card intersecting it.
    Canvas,
    /// A single expanded card, sent in edit mode.
    Card(CardId),
}

/// A response action that was not applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedAction {
    /// Position in the response's action list.
    pub index: usize,
    pub error: ActionError,
}

/// Outcome of a successful [`Orchestrator::play`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayReport {
    pub generation_id: Option<String>,
    pub placed: usize,
    pub modified: usize,
    pub deleted: usize,
    /// Modify/delete targets that matched no card.
    pub missing: Vec<String>,
    pub skipped: Vec<SkippedAction>,
    /// Magic strokes removed after the response was applied.
    pub magic_cleared: usize,
    /// Host actions, `NeedsSave` included when anything changed.
    pub actions: Vec<Action>,
}

struct Prepared {
    region: SnapshotRegion,
    assets: Vec<AssetDescriptor>,
    edit_mode: bool,
    sent_magic: Vec<StrokeId>,
}

/// Clears the in-flight flag when dropped, including on cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

pub struct Orchestrator {
    transport: Arc<dyn GenerationTransport>,
    snapshots: Arc<dyn SnapshotProvider>,
    snapshot_timeout: Duration,
    in_flight: AtomicBool,
}

impl Orchestrator {
    #[must_use]
    pub fn new(transport: Arc<dyn GenerationTransport>, snapshots: Arc<dyn SnapshotProvider>) -> Self {
        Self {
            transport,
            snapshots,
            snapshot_timeout: Duration::from_millis(DEFAULT_SNAPSHOT_TIMEOUT_MS),
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_snapshot_timeout(mut self, timeout: Duration) -> Self {
        self.snapshot_timeout = timeout;
        self
    }

    /// Whether a `play` call is currently running.
    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Send the magic ink in `scope` to the generation service and apply the result.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::AlreadyGenerating`] if another call is in flight (not queued).
    /// - [`GenerationError::NoMagicInk`] if there is no magic ink in scope; nothing
    ///   is sent. A card scope only counts strokes overlapping the card.
    /// - [`GenerationError::UnknownCard`] if a card scope names a missing card.
    /// - [`GenerationError::SnapshotFailed`], [`GenerationError::Network`],
    ///   [`GenerationError::Server`], [`GenerationError::Decoding`] for
    ///   failures before apply; the stores are left untouched.
    pub async fn play(&self, engine: &Mutex<EngineCore>, scope: Scope) -> Result<PlayReport, GenerationError> {
        let _in_flight = InFlight::acquire(&self.in_flight).ok_or(GenerationError::AlreadyGenerating)?;

        let prepared = {
            let core = engine.lock().await;
            prepare(&core, scope)?
        };
        info!(
            ?scope,
            assets = prepared.assets.len(),
            magic_strokes = prepared.sent_magic.len(),
            edit_mode = prepared.edit_mode,
            "generation: request prepared"
        );

        let png = self.capture(&prepared.region).await?;
        let request = GenerationRequest::new(&png, prepared.region.size, prepared.assets, prepared.edit_mode);
        let response = self.transport.generate(&request).await.map_err(|e| {
            warn!(error = %e, "generation: transport failed");
            GenerationError::from(e)
        })?;

        let (ops, skipped) = decode_actions(&response, &prepared.region.rect);

        let applied = engine.lock().await.apply_generation(ops, &prepared.sent_magic);
        let magic_cleared = applied.magic_removed;

        let actions = if applied.changed() { vec![Action::RenderNeeded, Action::NeedsSave] } else { Vec::new() };
        info!(
            generation_id = response.generation_id.as_deref().unwrap_or("-"),
            placed = applied.placed,
            modified = applied.modified,
            deleted = applied.deleted,
            skipped = skipped.len(),
            magic_cleared,
            "generation: applied response"
        );

        Ok(PlayReport {
            generation_id: response.generation_id,
            placed: applied.placed,
            modified: applied.modified,
            deleted: applied.deleted,
            missing: applied.missing,
            skipped,
            magic_cleared,
            actions,
        })
    }

    async fn capture(&self, region: &SnapshotRegion) -> Result<Vec<u8>, GenerationError> {
        match tokio::time::timeout(self.snapshot_timeout, self.snapshots.capture(region)).await {
            Ok(Ok(png)) => Ok(png),
            Ok(Err(e)) => {
                warn!(error = %e, "generation: snapshot failed");
                Err(GenerationError::SnapshotFailed(e.to_string()))
            }
            Err(_) => {
                let ms = self.snapshot_timeout.as_millis();
                warn!(timeout_ms = %ms, "generation: snapshot timed out");
                Err(GenerationError::SnapshotFailed(format!("timed out after {ms} ms")))
            }
        }
    }
}

// =============================================================================
// PHASES
// =============================================================================

fn prepare(core: &EngineCore, scope: Scope) -> Result<Prepared, GenerationError> {
    match scope {
        Scope::Canvas => {
            let sent_magic = magic_ids(core, |_| true)?;
            let visible = core.viewport().visible_rect();
            ensure_area(&visible)?;
            let (width_px, height_px) = core.viewport().size_px();
            let mut assets = Vec::new();
            for card in core.cards().intersecting(&visible) {
                if let Some(asset) = AssetDescriptor::from_card(card, &visible)? {
                    assets.push(asset);
                }
            }
            Ok(Prepared {
                region: SnapshotRegion { rect: visible, size: ViewportSize::from_px(width_px, height_px) },
                assets,
                edit_mode: false,
                sent_magic,
            })
        }
        Scope::Card(id) => {
            let card = core.cards().get(&id).ok_or(GenerationError::UnknownCard(id))?;
            let rect = card.rect;
            ensure_area(&rect)?;
            let sent_magic = magic_ids(core, |s| s.overlaps(&rect))?;
            let scale = core.viewport().scale();
            let assets = AssetDescriptor::from_card(card, &rect)?.into_iter().collect();
            Ok(Prepared {
                region: SnapshotRegion { rect, size: ViewportSize::from_px(rect.w * scale, rect.h * scale) },
                assets,
                edit_mode: true,
                sent_magic,
            })
        }
    }
}

/// Ids of the magic strokes a generation consumes.
fn magic_ids(core: &EngineCore, relevant: impl Fn(&Stroke) -> bool) -> Result<Vec<StrokeId>, GenerationError> {
    let ids: Vec<StrokeId> = core.strokes().magic().iter().filter(|s| relevant(*s)).map(|s| s.id).collect();
    if ids.is_empty() { Err(GenerationError::NoMagicInk) } else { Ok(ids) }
}

fn ensure_area(rect: &Rect) -> Result<(), GeometryError> {
    if rect.is_valid() { Ok(()) } else { Err(GeometryError::DegenerateViewport { width: rect.w, height: rect.h }) }
}

fn decode_actions(response: &GenerationResponse, visible: &Rect) -> (Vec<CardOp>, Vec<SkippedAction>) {
    let generation_id = response.generation_id.as_deref();
    let mut ops = Vec::with_capacity(response.actions.len());
    let mut skipped = Vec::new();
    for (index, raw) in response.actions.iter().enumerate() {
        match decode_action(raw, index, visible, generation_id) {
            Ok(op) => ops.push(op),
            Err(error) => {
                if let ActionError::UnknownType(kind) = &error {
                    debug!(index, action_type = %kind, "generation: ignoring unknown action");
                } else {
                    warn!(index, %error, "generation: skipping action");
                }
                skipped.push(SkippedAction { index, error });
            }
        }
    }
    (ops, skipped)
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
