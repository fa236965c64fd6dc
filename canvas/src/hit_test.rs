use super::*;
use crate::card::CardPayload;
use crate::geometry::Rect;
use crate::stroke::{InkMode, InkPoint};

fn text_card(x: f64, y: f64, w: f64, h: f64, text: &str) -> Card {
    Card::new(Rect::new(x, y, w, h), CardPayload::Text(text.into())).unwrap()
}

fn commit(store: &mut StrokeStore, mode: InkMode, pts: &[(f64, f64)]) -> StrokeId {
    store.start_stroke(InkPoint::new(pts[0].0, pts[0].1, 1.0), mode);
    for &(x, y) in &pts[1..] {
        store.append_point(InkPoint::new(x, y, 1.0), 1.0);
    }
    store.commit_stroke().unwrap().id
}

// =============================================================
// card_at
// =============================================================

#[test]
fn card_at_misses_empty_space() {
    let mut cards = CardStore::new();
    cards.push(text_card(0.0, 0.0, 10.0, 10.0, "a"));
    assert!(card_at(&cards, Point::new(50.0, 50.0)).is_none());
}

#[test]
fn card_at_prefers_topmost() {
    let mut cards = CardStore::new();
    cards.push(text_card(0.0, 0.0, 100.0, 100.0, "bottom"));
    cards.push(text_card(50.0, 50.0, 100.0, 100.0, "top"));
    let hit = card_at(&cards, Point::new(75.0, 75.0)).unwrap();
    assert_eq!(hit.payload, CardPayload::Text("top".into()));
    let hit = card_at(&cards, Point::new(10.0, 10.0)).unwrap();
    assert_eq!(hit.payload, CardPayload::Text("bottom".into()));
}

// =============================================================
// strokes_near
// =============================================================

#[test]
fn strokes_near_checks_both_layers() {
    let mut store = StrokeStore::new();
    let pen = commit(&mut store, InkMode::Pen, &[(0.0, 0.0), (10.0, 0.0)]);
    let magic = commit(&mut store, InkMode::Magic, &[(0.0, 5.0), (10.0, 5.0)]);
    commit(&mut store, InkMode::Pen, &[(500.0, 500.0), (510.0, 500.0)]);

    let ids = strokes_near(&store, Point::new(5.0, 2.0), 8.0);
    assert_eq!(ids, vec![pen, magic]);
}
