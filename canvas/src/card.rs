//! Content cards and the card store.
//!
//! A card is a movable block of content placed on the canvas. Its type is the
//! variant of its [`CardPayload`], so a card can never carry a payload that
//! does not match its type. Cards are kept in draw order; the store is the only
//! place they are mutated.

#[cfg(test)]
#[path = "card_test.rs"]
mod card_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Rect;
use crate::history::Removed;

/// Unique identifier for a card.
pub type CardId = Uuid;

/// Errors from card construction and user edits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CardError {
    /// Width or height is not strictly positive (or a coordinate is not finite).
    #[error("degenerate card rect: {0:?}")]
    DegenerateRect(Rect),
    /// No card with this id is on the canvas.
    #[error("card not found: {0}")]
    NotFound(CardId),
}

/// Card type tag, mirroring the payload variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Text,
    Image,
    Web,
    Video,
    Audio,
}

/// Where an image card's pixels come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// A fetched or generated image URL.
    Url(String),
    /// A prompt the image will be rendered from.
    Prompt(String),
}

/// Type-specific card content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CardPayload {
    Text(String),
    Image(ImageSource),
    /// HTML document rendered in a web view.
    Web(String),
    /// Video URL.
    Video(String),
    /// Audio URL.
    Audio(String),
}

impl CardPayload {
    #[must_use]
    pub fn kind(&self) -> CardKind {
        match self {
            Self::Text(_) => CardKind::Text,
            Self::Image(_) => CardKind::Image,
            Self::Web(_) => CardKind::Web,
            Self::Video(_) => CardKind::Video,
            Self::Audio(_) => CardKind::Audio,
        }
    }

    /// Whether there is anything to show. Blank strings are not renderable.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        let body = match self {
            Self::Text(s) | Self::Web(s) | Self::Video(s) | Self::Audio(s) => s,
            Self::Image(ImageSource::Url(s) | ImageSource::Prompt(s)) => s,
        };
        !body.trim().is_empty()
    }
}

/// A card placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// Position and size in canvas space.
    pub rect: Rect,
    pub payload: CardPayload,
    /// Stable id used to cross-reference cards in generation requests and responses.
    pub asset_id: String,
    /// Asset ids this card was derived from.
    #[serde(default)]
    pub source_asset_ids: Vec<String>,
    /// Groups cards produced by the same generation.
    #[serde(default)]
    pub generation_id: Option<String>,
}

impl Card {
    /// Build a user-created card with fresh ids.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::DegenerateRect`] if `rect` has no area.
    pub fn new(rect: Rect, payload: CardPayload) -> Result<Self, CardError> {
        if !rect.is_valid() {
            return Err(CardError::DegenerateRect(rect));
        }
        let id = Uuid::new_v4();
        Ok(Self {
            id,
            rect,
            payload,
            asset_id: id.to_string(),
            source_asset_ids: Vec::new(),
            generation_id: None,
        })
    }

    #[must_use]
    pub fn kind(&self) -> CardKind {
        self.payload.kind()
    }
}

/// In-memory, ordered store of cards. Index order is draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardStore {
    cards: Vec<Card>,
}

impl CardStore {
    #[must_use]
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    /// Append a card on top of the others.
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Insert a card at `index` (clamped to the store length).
    pub fn insert_at(&mut self, index: usize, card: Card) {
        let index = index.min(self.cards.len());
        self.cards.insert(index, card);
    }

    /// Remove a card by id, returning it with the index it occupied.
    pub fn remove(&mut self, id: &CardId) -> Option<Removed<Card>> {
        let index = self.cards.iter().position(|c| &c.id == id)?;
        Some(Removed { index, item: self.cards.remove(index) })
    }

    /// Remove every card with the given asset id, in store order.
    pub fn remove_by_asset_id(&mut self, asset_id: &str) -> Vec<Removed<Card>> {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.cards.len() {
            if self.cards[i].asset_id == asset_id {
                removed.push(Removed { index: i, item: self.cards.remove(i) });
            } else {
                i += 1;
            }
        }
        removed
    }

    /// Overwrite the stored card that has `card.id`. Returns the previous value.
    pub fn replace(&mut self, card: Card) -> Option<Card> {
        let slot = self.cards.iter_mut().find(|c| c.id == card.id)?;
        Some(std::mem::replace(slot, card))
    }

    /// Move a card to `rect`. Returns the previous rect.
    pub fn set_rect(&mut self, id: &CardId, rect: Rect) -> Option<Rect> {
        let card = self.cards.iter_mut().find(|c| &c.id == id)?;
        Some(std::mem::replace(&mut card.rect, rect))
    }

    // --- Queries ---

    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|c| &c.id == id)
    }

    /// First card (in draw order) carrying `asset_id`.
    #[must_use]
    pub fn find_by_asset_id(&self, asset_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.asset_id == asset_id)
    }

    /// Cards whose rect overlaps `area`, in draw order.
    pub fn intersecting<'a>(&'a self, area: &'a Rect) -> impl Iterator<Item = &'a Card> + 'a {
        self.cards.iter().filter(move |c| c.rect.intersects(area))
    }

    /// All cards in draw order.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
