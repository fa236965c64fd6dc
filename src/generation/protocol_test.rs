use serde_json::json;

use super::*;
use crate::error::ErrorCode;

fn visible() -> Rect {
    Rect::new(100.0, 200.0, 1000.0, 500.0)
}

fn card(rect: Rect, payload: CardPayload) -> Card {
    Card::new(rect, payload).unwrap()
}

fn decode(raw: Value) -> Result<CardOp, ActionError> {
    decode_action(&raw, 0, &visible(), Some("gen-1"))
}

fn placed(raw: Value) -> Card {
    match decode(raw).unwrap() {
        CardOp::Place(card) => card,
        other => panic!("expected place, got {other:?}"),
    }
}

// =========================================================================
// Asset descriptors
// =========================================================================

#[test]
fn text_card_descriptor() {
    let c = card(Rect::new(200.0, 300.0, 100.0, 50.0), CardPayload::Text("hello".into()));
    let d = AssetDescriptor::from_card(&c, &visible()).unwrap().unwrap();
    assert_eq!(d.id, c.asset_id);
    assert_eq!(d.asset_type, AssetType::Text);
    assert_eq!(d.content.as_deref(), Some("hello"));
    assert_eq!(d.url, None);
    assert_eq!(d.metadata, None);
    let b = d.bbox.unwrap();
    assert!((b.x - 0.1).abs() < 1e-9);
    assert!((b.y - 0.2).abs() < 1e-9);
    assert!((b.w - 0.1).abs() < 1e-9);
    assert!((b.h - 0.1).abs() < 1e-9);
}

#[test]
fn media_cards_send_urls() {
    let rect = Rect::new(100.0, 200.0, 10.0, 10.0);
    let image = card(rect, CardPayload::Image(ImageSource::Url("https://img/1.png".into())));
    let video = card(rect, CardPayload::Video("https://v/1.mp4".into()));
    let audio = card(rect, CardPayload::Audio("https://a/1.mp3".into()));
    for (c, ty) in [(image, AssetType::Image), (video, AssetType::Video), (audio, AssetType::Audio)] {
        let d = AssetDescriptor::from_card(&c, &visible()).unwrap().unwrap();
        assert_eq!(d.asset_type, ty);
        assert!(d.url.is_some());
        assert_eq!(d.content, None);
    }
}

#[test]
fn prompt_image_and_web_send_content() {
    let rect = Rect::new(100.0, 200.0, 10.0, 10.0);
    let prompt = card(rect, CardPayload::Image(ImageSource::Prompt("a red fox".into())));
    let d = AssetDescriptor::from_card(&prompt, &visible()).unwrap().unwrap();
    assert_eq!(d.asset_type, AssetType::Image);
    assert_eq!(d.content.as_deref(), Some("a red fox"));
    assert_eq!(d.url, None);

    let web = card(rect, CardPayload::Web("<b>hi</b>".into()));
    let d = AssetDescriptor::from_card(&web, &visible()).unwrap().unwrap();
    assert_eq!(d.asset_type, AssetType::Html);
    assert_eq!(d.content.as_deref(), Some("<b>hi</b>"));
}

#[test]
fn generated_card_carries_generation_id_metadata() {
    let mut c = card(Rect::new(100.0, 200.0, 10.0, 10.0), CardPayload::Text("t".into()));
    c.generation_id = Some("gen-7".into());
    let d = AssetDescriptor::from_card(&c, &visible()).unwrap().unwrap();
    assert_eq!(d.metadata.unwrap().get("generation_id").map(String::as_str), Some("gen-7"));
}

#[test]
fn empty_payload_card_is_skipped() {
    let c = card(Rect::new(0.0, 0.0, 10.0, 10.0), CardPayload::Text("  ".into()));
    assert_eq!(AssetDescriptor::from_card(&c, &visible()).unwrap(), None);
}

#[test]
fn degenerate_visible_rect_errors() {
    let c = card(Rect::new(0.0, 0.0, 10.0, 10.0), CardPayload::Text("x".into()));
    let err = AssetDescriptor::from_card(&c, &Rect::new(0.0, 0.0, 0.0, 100.0)).unwrap_err();
    assert!(matches!(err, GeometryError::DegenerateViewport { .. }));
}

// =========================================================================
// Request serialization
// =========================================================================

#[test]
fn request_uses_wire_field_names() {
    let c = card(Rect::new(100.0, 200.0, 10.0, 10.0), CardPayload::Text("x".into()));
    let asset = AssetDescriptor::from_card(&c, &visible()).unwrap().unwrap();
    let req = GenerationRequest::new(b"\x89PNG", ViewportSize { w_px: 800, h_px: 600 }, vec![asset], false);
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["image_base64"], "data:image/png;base64,iVBORw==");
    assert_eq!(json["viewport"], json!({ "w_px": 800, "h_px": 600 }));
    assert_eq!(json["edit_mode"], false);
    let asset = &json["assets"][0];
    assert_eq!(asset["type"], "text");
    assert_eq!(asset["content"], "x");
    assert!(asset["url"].is_null());
    assert!(asset["box"].is_object());
}

#[test]
fn empty_asset_list_is_null() {
    let req = GenerationRequest::new(b"png", ViewportSize { w_px: 1, h_px: 1 }, Vec::new(), true);
    let json = serde_json::to_value(&req).unwrap();
    assert!(json["assets"].is_null());
    assert_eq!(json["edit_mode"], true);
}

#[test]
fn viewport_size_rounds_pixels() {
    assert_eq!(ViewportSize::from_px(799.6, 600.2), ViewportSize { w_px: 800, h_px: 600 });
    assert_eq!(ViewportSize::from_px(-5.0, f64::NAN), ViewportSize { w_px: 0, h_px: 0 });
}

// =========================================================================
// Response parsing
// =========================================================================

#[test]
fn response_defaults_missing_fields() {
    let resp: GenerationResponse = serde_json::from_value(json!({})).unwrap();
    assert_eq!(resp.generation_id, None);
    assert!(resp.actions.is_empty());
}

// =========================================================================
// decode_action: place_*
// =========================================================================

#[test]
fn place_text_decodes_box_against_visible_rect() {
    let c = placed(json!({
        "type": "place_text",
        "box": { "x": 0.1, "y": 0.1, "w": 0.2, "h": 0.1 },
        "text": "hello"
    }));
    assert_eq!(c.payload, CardPayload::Text("hello".into()));
    assert!((c.rect.x - 200.0).abs() < 1e-9);
    assert!((c.rect.y - 250.0).abs() < 1e-9);
    assert!((c.rect.w - 200.0).abs() < 1e-9);
    assert!((c.rect.h - 50.0).abs() < 1e-9);
    assert_eq!(c.generation_id.as_deref(), Some("gen-1"));
}

#[test]
fn placed_card_id_derives_from_generation_and_index() {
    let raw = json!({ "type": "place_text", "box": { "x": 0.0, "y": 0.0, "w": 0.1, "h": 0.1 }, "text": "t" });
    let Ok(CardOp::Place(card)) = decode_action(&raw, 3, &visible(), Some("gen-7")) else {
        panic!("expected place");
    };
    assert_eq!(card.asset_id, "gen-7-3");
}

#[test]
fn placed_card_id_prefers_explicit_asset_id() {
    let c = placed(json!({
        "type": "place_text",
        "asset_id": "note-1",
        "box": { "x": 0.0, "y": 0.0, "w": 0.1, "h": 0.1 },
        "text": "t"
    }));
    assert_eq!(c.asset_id, "note-1");
}

#[test]
fn placed_card_without_generation_id_keeps_fresh_id() {
    let raw = json!({ "type": "place_text", "box": { "x": 0.0, "y": 0.0, "w": 0.1, "h": 0.1 }, "text": "t" });
    let Ok(CardOp::Place(a)) = decode_action(&raw, 0, &visible(), None) else {
        panic!("expected place");
    };
    let Ok(CardOp::Place(b)) = decode_action(&raw, 0, &visible(), None) else {
        panic!("expected place");
    };
    assert!(!a.asset_id.is_empty());
    assert_ne!(a.asset_id, b.asset_id);
}

#[test]
fn place_image_prefers_url_over_prompt() {
    let c = placed(json!({
        "type": "place_image",
        "box": { "x": 0.0, "y": 0.0, "w": 0.5, "h": 0.5 },
        "image_url": "https://img/2.png",
        "prompt": "ignored",
        "source_asset_ids": ["a", "b"]
    }));
    assert_eq!(c.payload, CardPayload::Image(ImageSource::Url("https://img/2.png".into())));
    assert_eq!(c.source_asset_ids, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn place_image_falls_back_to_prompt() {
    let c = placed(json!({
        "type": "place_image",
        "box": { "x": 0.0, "y": 0.0, "w": 0.5, "h": 0.5 },
        "prompt": "a lighthouse"
    }));
    assert_eq!(c.payload, CardPayload::Image(ImageSource::Prompt("a lighthouse".into())));
}

#[test]
fn place_web_video_audio() {
    let b = json!({ "x": 0.0, "y": 0.0, "w": 0.1, "h": 0.1 });
    let web = placed(json!({ "type": "place_web", "box": b, "html": "<p>x</p>" }));
    assert_eq!(web.kind(), canvas::card::CardKind::Web);
    let video = placed(json!({ "type": "place_video", "box": b, "video_url": "https://v" }));
    assert_eq!(video.payload, CardPayload::Video("https://v".into()));
    let audio = placed(json!({ "type": "place_audio", "box": b, "audio_url": "https://a" }));
    assert_eq!(audio.payload, CardPayload::Audio("https://a".into()));
}

#[test]
fn place_without_box_is_skipped() {
    let err = decode(json!({ "type": "place_text", "text": "hello" })).unwrap_err();
    assert_eq!(err, ActionError::MissingBox { action: "place_text" });
}

#[test]
fn place_with_empty_payload_is_skipped() {
    let err = decode(json!({
        "type": "place_text",
        "box": { "x": 0.0, "y": 0.0, "w": 0.1, "h": 0.1 },
        "text": "   "
    }))
    .unwrap_err();
    assert_eq!(err, ActionError::EmptyPayload { action: "place_text" });
    assert_eq!(err.error_code(), "E_ACTION_EMPTY_PAYLOAD");
}

#[test]
fn place_with_degenerate_box_is_skipped() {
    let err = decode(json!({
        "type": "place_video",
        "box": { "x": 0.0, "y": 0.0, "w": 0.0, "h": 0.1 },
        "video_url": "https://v"
    }))
    .unwrap_err();
    assert!(matches!(err, ActionError::Card { action: "place_video", .. }));
}

#[test]
fn place_against_degenerate_viewport_is_skipped() {
    let raw = json!({ "type": "place_text", "box": { "x": 0.0, "y": 0.0, "w": 0.1, "h": 0.1 }, "text": "t" });
    let err = decode_action(&raw, 0, &Rect::new(0.0, 0.0, 0.0, 0.0), None).unwrap_err();
    assert!(matches!(err, ActionError::Geometry { .. }));
}

// =========================================================================
// decode_action: modify / delete
// =========================================================================

#[test]
fn modify_payload_priority() {
    let op = decode(json!({
        "type": "modify_asset",
        "target_asset_id": "a1",
        "text": "t",
        "html": "<p>",
        "audio_url": "https://a",
        "video_url": "https://v",
        "transform_type": "restyle"
    }))
    .unwrap();
    assert_eq!(
        op,
        CardOp::Modify { asset_id: "a1".into(), payload: CardPayload::Video("https://v".into()), source_asset_ids: None }
    );

    let op = decode(json!({ "type": "modify_asset", "target_asset_id": "a1", "text": "t", "html": "<p>" })).unwrap();
    assert!(matches!(op, CardOp::Modify { payload: CardPayload::Text(_), .. }));

    let op = decode(json!({
        "type": "modify_asset",
        "target_asset_id": "a1",
        "image_url": "https://img",
        "video_url": "https://v"
    }))
    .unwrap();
    assert!(matches!(op, CardOp::Modify { payload: CardPayload::Image(ImageSource::Url(_)), .. }));
}

#[test]
fn modify_requires_target_and_payload() {
    let err = decode(json!({ "type": "modify_asset", "text": "t" })).unwrap_err();
    assert_eq!(err, ActionError::MissingTarget { action: "modify_asset" });
    let err = decode(json!({ "type": "modify_asset", "target_asset_id": "a1" })).unwrap_err();
    assert_eq!(err, ActionError::EmptyPayload { action: "modify_asset" });
}

#[test]
fn delete_decodes_target() {
    let op = decode(json!({ "type": "delete_asset", "target_asset_id": "a9" })).unwrap();
    assert_eq!(op, CardOp::Delete { asset_id: "a9".into() });
    assert!(decode(json!({ "type": "delete_asset", "target_asset_id": "" })).is_err());
}

// =========================================================================
// decode_action: bad input
// =========================================================================

#[test]
fn unknown_type_is_reported() {
    let err = decode(json!({ "type": "summon_dragon" })).unwrap_err();
    assert_eq!(err, ActionError::UnknownType("summon_dragon".into()));
}

#[test]
fn malformed_action_is_reported() {
    let err = decode(json!({ "type": "place_text", "box": "not a box" })).unwrap_err();
    assert!(matches!(err, ActionError::Malformed(_)));
    assert!(matches!(decode(json!(42)).unwrap_err(), ActionError::Malformed(_)));
}
