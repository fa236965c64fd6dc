//! Undo/redo command log over stroke and card mutations.
//!
//! Every mutation is recorded as a [`HistoryEntry`] that carries enough data
//! to apply it forward and backward. Entries that remove items remember the
//! index each item was removed from, so undo re-inserts them exactly where
//! they were and an undo/redo pair leaves both stores bit-identical.
//!
//! History is linear: recording a new entry clears the redo stack.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use tracing::debug;

use crate::card::{Card, CardId, CardStore};
use crate::consts::HISTORY_DEPTH;
use crate::geometry::Rect;
use crate::stroke::{Layer, Stroke, StrokeStore};

/// An item removed from an ordered collection together with its former index.
#[derive(Debug, Clone, PartialEq)]
pub struct Removed<T> {
    pub index: usize,
    pub item: T,
}

/// A reversible mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    /// A stroke was committed to `layer`.
    AddStroke { layer: Layer, stroke: Stroke },
    /// Strokes were removed by the eraser (in removal order per layer).
    EraseStrokes { removed_permanent: Vec<Removed<Stroke>>, removed_magic: Vec<Removed<Stroke>> },
    /// A single card was added on top.
    AddCard(Card),
    /// Several cards were added on top, in order.
    AddCards(Vec<Card>),
    /// A card was removed.
    RemoveCard(Removed<Card>),
    /// A card was dragged from `from` to `to`.
    MoveCard { id: CardId, from: Rect, to: Rect },
    /// A card's content was replaced.
    ModifyCard { before: Card, after: Card },
    /// Several entries applied in order and undone in reverse, as one step.
    Batch(Vec<HistoryEntry>),
}

impl HistoryEntry {
    /// Apply the mutation forward.
    fn apply(&self, strokes: &mut StrokeStore, cards: &mut CardStore) {
        match self {
            Self::AddStroke { layer, stroke } => strokes.push(*layer, stroke.clone()),
            Self::EraseStrokes { removed_permanent, removed_magic } => {
                for r in removed_permanent {
                    strokes.remove(Layer::Permanent, &r.item.id);
                }
                for r in removed_magic {
                    strokes.remove(Layer::Magic, &r.item.id);
                }
            }
            Self::AddCard(card) => cards.push(card.clone()),
            Self::AddCards(added) => {
                for card in added {
                    cards.push(card.clone());
                }
            }
            Self::RemoveCard(r) => {
                cards.remove(&r.item.id);
            }
            Self::MoveCard { id, to, .. } => {
                cards.set_rect(id, *to);
            }
            Self::ModifyCard { after, .. } => {
                cards.replace(after.clone());
            }
            Self::Batch(entries) => {
                for entry in entries {
                    entry.apply(strokes, cards);
                }
            }
        }
    }

    /// Apply the inverse of the mutation.
    fn revert(&self, strokes: &mut StrokeStore, cards: &mut CardStore) {
        match self {
            Self::AddStroke { layer, stroke } => {
                strokes.remove(*layer, &stroke.id);
            }
            Self::EraseStrokes { removed_permanent, removed_magic } => {
                for r in removed_permanent.iter().rev() {
                    strokes.insert_at(Layer::Permanent, r.index, r.item.clone());
                }
                for r in removed_magic.iter().rev() {
                    strokes.insert_at(Layer::Magic, r.index, r.item.clone());
                }
            }
            Self::AddCard(card) => {
                cards.remove(&card.id);
            }
            Self::AddCards(added) => {
                for card in added.iter().rev() {
                    cards.remove(&card.id);
                }
            }
            Self::RemoveCard(r) => cards.insert_at(r.index, r.item.clone()),
            Self::MoveCard { id, from, .. } => {
                cards.set_rect(id, *from);
            }
            Self::ModifyCard { before, .. } => {
                cards.replace(before.clone());
            }
            Self::Batch(entries) => {
                for entry in entries.iter().rev() {
                    entry.revert(strokes, cards);
                }
            }
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::AddStroke { .. } => "add stroke",
            Self::EraseStrokes { .. } => "erase strokes",
            Self::AddCard(_) => "add card",
            Self::AddCards(_) => "add cards",
            Self::RemoveCard(_) => "remove card",
            Self::MoveCard { .. } => "move card",
            Self::ModifyCard { .. } => "modify card",
            Self::Batch(_) => "batch",
        }
    }
}

/// Linear undo/redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HISTORY_DEPTH)
    }
}

impl History {
    /// Create an empty history keeping at most `max_depth` undo entries.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { undo_stack: Vec::new(), redo_stack: Vec::new(), max_depth: max_depth.max(1) }
    }

    /// Record an already-applied mutation. Clears the redo stack.
    pub fn push(&mut self, entry: HistoryEntry) {
        debug!(entry = entry.label(), depth = self.undo_stack.len() + 1, "history: push");
        self.undo_stack.push(entry);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Revert the most recent entry. Returns `false` if there is nothing to undo.
    pub fn undo(&mut self, strokes: &mut StrokeStore, cards: &mut CardStore) -> bool {
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };
        debug!(entry = entry.label(), "history: undo");
        entry.revert(strokes, cards);
        self.redo_stack.push(entry);
        true
    }

    /// Re-apply the most recently undone entry. Returns `false` if there is nothing to redo.
    pub fn redo(&mut self, strokes: &mut StrokeStore, cards: &mut CardStore) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        debug!(entry = entry.label(), "history: redo");
        entry.apply(strokes, cards);
        self.undo_stack.push(entry);
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The most recent undoable entry.
    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.undo_stack.last()
    }

    /// Forget all entries.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
