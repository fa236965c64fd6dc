//! Generation wire protocol: request/response JSON and action decoding.
//!
//! Requests describe the visible region as a PNG snapshot plus one asset
//! descriptor per card, with boxes normalized to the visible rectangle.
//! Responses carry a list of actions that decode into [`CardOp`]s against the
//! same rectangle. Each action is decoded on its own so one malformed entry
//! never discards the rest of the response.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use canvas::card::{Card, CardError, CardPayload, ImageSource};
use canvas::engine::CardOp;
use canvas::geometry::{
    GeometryError, NormalizedBox, Rect, canvas_rect_to_normalized_box, normalized_box_to_canvas_rect,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

// =============================================================================
// REQUEST
// =============================================================================

/// Pixel size of the snapshot the request describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub w_px: u32,
    pub h_px: u32,
}

impl ViewportSize {
    /// Round a floating-point surface size to whole pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_px(width: f64, height: f64) -> Self {
        let px = |v: f64| if v.is_finite() { v.round().clamp(0.0, f64::from(u32::MAX)) as u32 } else { 0 };
        Self { w_px: px(width), h_px: px(height) }
    }
}

/// Asset `type` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Text,
    Html,
    Audio,
    Video,
}

/// One card as the generation service sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub content: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "box")]
    pub bbox: Option<NormalizedBox>,
    pub metadata: Option<BTreeMap<String, String>>,
}

impl AssetDescriptor {
    /// Describe `card` relative to `visible`. Cards with nothing to show yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateViewport`] if `visible` has no area.
    pub fn from_card(card: &Card, visible: &Rect) -> Result<Option<Self>, GeometryError> {
        if !card.payload.is_renderable() {
            return Ok(None);
        }
        let bbox = canvas_rect_to_normalized_box(&card.rect, visible)?;
        let (asset_type, content, url) = match &card.payload {
            CardPayload::Text(text) => (AssetType::Text, Some(text.clone()), None),
            CardPayload::Image(ImageSource::Url(url)) => (AssetType::Image, None, Some(url.clone())),
            CardPayload::Image(ImageSource::Prompt(prompt)) => (AssetType::Image, Some(prompt.clone()), None),
            CardPayload::Web(html) => (AssetType::Html, Some(html.clone()), None),
            CardPayload::Video(url) => (AssetType::Video, None, Some(url.clone())),
            CardPayload::Audio(url) => (AssetType::Audio, None, Some(url.clone())),
        };
        let metadata = card
            .generation_id
            .as_ref()
            .map(|id| BTreeMap::from([("generation_id".to_string(), id.clone())]));
        Ok(Some(Self { id: card.asset_id.clone(), asset_type, content, url, bbox: Some(bbox), metadata }))
    }
}

/// Body POSTed to the generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// `data:image/png;base64,...` URL of the snapshot.
    pub image_base64: String,
    pub viewport: ViewportSize,
    pub assets: Option<Vec<AssetDescriptor>>,
    pub edit_mode: Option<bool>,
}

impl GenerationRequest {
    /// Assemble a request from raw PNG bytes. An empty asset list is sent as `null`.
    #[must_use]
    pub fn new(png: &[u8], viewport: ViewportSize, assets: Vec<AssetDescriptor>, edit_mode: bool) -> Self {
        Self {
            image_base64: png_data_url(png),
            viewport,
            assets: if assets.is_empty() { None } else { Some(assets) },
            edit_mode: Some(edit_mode),
        }
    }
}

#[must_use]
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Body returned by the generation endpoint.
///
/// Actions stay as raw JSON until [`decode_action`] so each is validated independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub generation_id: Option<String>,
    #[serde(default)]
    pub actions: Vec<Value>,
}

/// One response action as sent on the wire. Only the fields its `type` needs are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(rename = "box", default)]
    pub bbox: Option<NormalizedBox>,
    /// Asset id for a placed card, when the service names it.
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub target_asset_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub source_asset_ids: Option<Vec<String>>,
    #[serde(default)]
    pub transform_type: Option<String>,
}

/// Known action types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    PlaceImage,
    PlaceText,
    PlaceWeb,
    PlaceVideo,
    PlaceAudio,
    ModifyAsset,
    DeleteAsset,
}

impl ActionKind {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "place_image" => Some(Self::PlaceImage),
            "place_text" => Some(Self::PlaceText),
            "place_web" => Some(Self::PlaceWeb),
            "place_video" => Some(Self::PlaceVideo),
            "place_audio" => Some(Self::PlaceAudio),
            "modify_asset" => Some(Self::ModifyAsset),
            "delete_asset" => Some(Self::DeleteAsset),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlaceImage => "place_image",
            Self::PlaceText => "place_text",
            Self::PlaceWeb => "place_web",
            Self::PlaceVideo => "place_video",
            Self::PlaceAudio => "place_audio",
            Self::ModifyAsset => "modify_asset",
            Self::DeleteAsset => "delete_asset",
        }
    }
}

/// Why a single response action was not applied.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("malformed action: {0}")]
    Malformed(String),

    #[error("unknown action type '{0}'")]
    UnknownType(String),

    #[error("{action}: missing box")]
    MissingBox { action: &'static str },

    #[error("{action}: {source}")]
    Geometry { action: &'static str, source: GeometryError },

    #[error("{action}: {source}")]
    Card { action: &'static str, source: CardError },

    #[error("{action}: no renderable payload")]
    EmptyPayload { action: &'static str },

    #[error("{action}: missing target_asset_id")]
    MissingTarget { action: &'static str },
}

impl crate::error::ErrorCode for ActionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "E_ACTION_MALFORMED",
            Self::UnknownType(_) => "E_ACTION_UNKNOWN_TYPE",
            Self::MissingBox { .. } => "E_ACTION_MISSING_BOX",
            Self::Geometry { .. } => "E_ACTION_GEOMETRY",
            Self::Card { .. } => "E_ACTION_DEGENERATE_BOX",
            Self::EmptyPayload { .. } => "E_ACTION_EMPTY_PAYLOAD",
            Self::MissingTarget { .. } => "E_ACTION_MISSING_TARGET",
        }
    }
}

/// Decode one raw response action into a card operation.
///
/// Place actions are positioned against `visible`, the rectangle the request
/// normalized its boxes to, and tagged with `generation_id`. A placed card
/// takes the action's `asset_id` when given, else `{generation_id}-{index}`
/// with `index` the action's position in the response, so later actions can
/// target it.
///
/// # Errors
///
/// Returns an [`ActionError`] describing why the action cannot be applied.
pub fn decode_action(
    raw: &Value,
    index: usize,
    visible: &Rect,
    generation_id: Option<&str>,
) -> Result<CardOp, ActionError> {
    let wire = WireAction::deserialize(raw).map_err(|e| ActionError::Malformed(e.to_string()))?;
    let kind = ActionKind::parse(&wire.action_type).ok_or_else(|| ActionError::UnknownType(wire.action_type.clone()))?;
    let action = kind.as_str();
    match kind {
        ActionKind::ModifyAsset => {
            let asset_id = target(&wire, action)?;
            let payload = modify_payload(&wire).ok_or(ActionError::EmptyPayload { action })?;
            debug!(%asset_id, kind = ?payload.kind(), transform = ?wire.transform_type, "generation: modify decoded");
            Ok(CardOp::Modify { asset_id, payload, source_asset_ids: wire.source_asset_ids })
        }
        ActionKind::DeleteAsset => Ok(CardOp::Delete { asset_id: target(&wire, action)? }),
        ActionKind::PlaceImage
        | ActionKind::PlaceText
        | ActionKind::PlaceWeb
        | ActionKind::PlaceVideo
        | ActionKind::PlaceAudio => {
            let payload = place_payload(kind, &wire).ok_or(ActionError::EmptyPayload { action })?;
            let nbox = wire.bbox.ok_or(ActionError::MissingBox { action })?;
            let rect =
                normalized_box_to_canvas_rect(&nbox, visible).map_err(|source| ActionError::Geometry { action, source })?;
            let mut card = Card::new(rect, payload).map_err(|source| ActionError::Card { action, source })?;
            if let Some(asset_id) = placed_asset_id(&wire, index, generation_id) {
                card.asset_id = asset_id;
            }
            card.source_asset_ids = wire.source_asset_ids.unwrap_or_default();
            card.generation_id = generation_id.map(str::to_string);
            Ok(CardOp::Place(card))
        }
    }
}

/// Id a placed card is addressed by. `None` keeps the card's random id.
fn placed_asset_id(wire: &WireAction, index: usize, generation_id: Option<&str>) -> Option<String> {
    non_blank(wire.asset_id.as_ref()).or_else(|| {
        generation_id
            .filter(|g| !g.trim().is_empty())
            .map(|g| format!("{g}-{index}"))
    })
}

fn target(wire: &WireAction, action: &'static str) -> Result<String, ActionError> {
    non_blank(wire.target_asset_id.as_ref()).ok_or(ActionError::MissingTarget { action })
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty()).cloned()
}

fn place_payload(kind: ActionKind, wire: &WireAction) -> Option<CardPayload> {
    match kind {
        ActionKind::PlaceImage => image_payload(wire),
        ActionKind::PlaceText => non_blank(wire.text.as_ref()).map(CardPayload::Text),
        ActionKind::PlaceWeb => non_blank(wire.html.as_ref()).map(CardPayload::Web),
        ActionKind::PlaceVideo => non_blank(wire.video_url.as_ref()).map(CardPayload::Video),
        ActionKind::PlaceAudio => non_blank(wire.audio_url.as_ref()).map(CardPayload::Audio),
        ActionKind::ModifyAsset | ActionKind::DeleteAsset => None,
    }
}

fn image_payload(wire: &WireAction) -> Option<CardPayload> {
    non_blank(wire.image_url.as_ref())
        .map(ImageSource::Url)
        .or_else(|| non_blank(wire.prompt.as_ref()).map(ImageSource::Prompt))
        .map(CardPayload::Image)
}

/// Replacement payload for `modify_asset`: image, then video, audio, text, html.
fn modify_payload(wire: &WireAction) -> Option<CardPayload> {
    image_payload(wire)
        .or_else(|| non_blank(wire.video_url.as_ref()).map(CardPayload::Video))
        .or_else(|| non_blank(wire.audio_url.as_ref()).map(CardPayload::Audio))
        .or_else(|| non_blank(wire.text.as_ref()).map(CardPayload::Text))
        .or_else(|| non_blank(wire.html.as_ref()).map(CardPayload::Web))
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
