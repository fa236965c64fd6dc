use canvas::card::CardPayload;
use serde_json::json;

use super::*;

fn session_json() -> serde_json::Value {
    json!({
        "viewport": { "width_px": 800, "height_px": 600 },
        "cards": [{
            "id": "6f1c1d5e-2a56-4a8e-9b1a-6f7ad3a0c001",
            "rect": { "x": 10, "y": 10, "w": 100, "h": 40 },
            "payload": { "type": "text", "value": "todo" },
            "asset_id": "note-1"
        }],
        "steps": [
            { "op": "pointer", "action": "down", "tool": "stylus", "position": { "x": 0, "y": 0 } },
            { "op": "pointer", "action": "move", "tool": "stylus", "position": { "x": 40, "y": 0 } },
            { "op": "pointer", "action": "up", "tool": "stylus", "position": { "x": 40, "y": 0 } },
            { "op": "tool", "tool": "magic" },
            { "op": "pointer", "action": "down", "tool": "stylus", "position": { "x": 0, "y": 100 } },
            { "op": "pointer", "action": "move", "tool": "stylus", "position": { "x": 40, "y": 120 } },
            { "op": "pointer", "action": "up", "tool": "stylus", "position": { "x": 40, "y": 120 } }
        ]
    })
}

fn session() -> Session {
    Session::parse(&session_json().to_string()).unwrap()
}

#[test]
fn parse_reads_all_sections() {
    let s = session();
    assert_eq!(s.viewport, SessionViewport { width_px: 800.0, height_px: 600.0 });
    assert_eq!(s.cards.len(), 1);
    assert_eq!(s.cards[0].payload, CardPayload::Text("todo".into()));
    assert!(s.cards[0].source_asset_ids.is_empty());
    assert_eq!(s.steps.len(), 7);
    assert_eq!(s.steps[3], SessionStep::Tool { tool: Tool::Magic });
}

#[test]
fn empty_object_is_a_valid_session() {
    let s = Session::parse("{}").unwrap();
    assert_eq!(s.viewport, SessionViewport::default());
    assert!(s.steps.is_empty());
}

#[test]
fn parse_rejects_unknown_step() {
    let err = Session::parse(r#"{"steps":[{"op":"teleport"}]}"#).unwrap_err();
    assert!(matches!(err, SessionError::Parse(_)));
}

#[test]
fn replay_builds_document() {
    let core = session().replay();
    assert_eq!(core.strokes().permanent().len(), 1);
    assert_eq!(core.strokes().magic().len(), 1);
    assert_eq!(core.cards().len(), 1);
    assert_eq!(core.viewport().size_px(), (800.0, 600.0));
}

#[test]
fn replay_applies_undo_and_redo() {
    let mut s = session();
    s.steps.push(SessionStep::Undo);
    assert!(s.replay().strokes().magic().is_empty());
    s.steps.push(SessionStep::Redo);
    assert_eq!(s.replay().strokes().magic().len(), 1);
}

#[test]
fn replay_skips_degenerate_cards() {
    let mut raw = session_json();
    raw["cards"].as_array_mut().unwrap().push(json!({
        "id": "6f1c1d5e-2a56-4a8e-9b1a-6f7ad3a0c002",
        "rect": { "x": 0, "y": 0, "w": 0, "h": -5 },
        "payload": { "type": "text", "value": "flat" },
        "asset_id": "flat"
    }));
    let core = Session::parse(&raw.to_string()).unwrap().replay();
    assert_eq!(core.cards().len(), 1);
    assert!(core.cards().find_by_asset_id("flat").is_none());
}

#[test]
fn undo_never_removes_starting_cards() {
    let mut s = session();
    s.steps = vec![SessionStep::Undo, SessionStep::Undo, SessionStep::Undo];
    let core = s.replay();
    assert_eq!(core.cards().len(), 1);
    assert!(!core.history().can_undo());
}

#[test]
fn document_export_lists_layers() {
    let core = session().replay();
    let doc = Document::from_engine(&core);
    assert_eq!(doc.permanent.len(), 1);
    assert_eq!(doc.magic.len(), 1);
    assert_eq!(doc.cards[0].asset_id, "note-1");
    assert_eq!(doc.revision, core.revision());
    let json = serde_json::to_value(&doc).unwrap();
    assert!(json["camera"]["scale"].is_number());
    assert_eq!(json["magic"][0]["is_magic"], true);
}

#[test]
fn load_missing_file_is_read_error() {
    let err = Session::load(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(matches!(err, SessionError::Read { .. }));
}
