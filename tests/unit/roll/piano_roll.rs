use super::*;
use crate::stream::document::Event;

fn note(id: &str, ontime: f64, offtime: f64, pitch: u8) -> PerformedNote {
    PerformedNote {
        id: id.to_string(),
        ontime,
        offtime,
        pitch,
        onvel: 64,
        offvel: 0,
        channel: 0,
    }
}

fn roll() -> PianoRoll {
    PianoRoll {
        events: vec![
            note("a", 0.0, 2.5, 60),
            note("b", 1.0, 1.5, 64),
            note("c", 2.0, 2.25, 67),
        ],
    }
}

#[test]
fn sitch_spells_with_sharps() {
    assert_eq!(note("x", 0.0, 0.0, 60).sitch(), "C4");
    assert_eq!(note("x", 0.0, 0.0, 61).sitch(), "C#4");
    assert_eq!(note("x", 0.0, 0.0, 21).sitch(), "A0");
    assert_eq!(note("x", 0.0, 0.0, 0).sitch(), "C-1");
    assert_eq!(note("x", 0.0, 0.0, 127).sitch(), "G9");
}

#[test]
fn queries_on_a_small_roll() {
    let r = roll();
    assert_eq!(r.len(), 3);
    assert_eq!(r.range(), Some((0.0, 2.0)));
    assert_eq!(r.nearest(1.4).map(|n| n.id.as_str()), Some("b"));
    assert_eq!(r.nearest(0.5).map(|n| n.id.as_str()), Some("a"));
    assert_eq!(r.total_duration(), Some(2.5));
    assert_eq!(r.events[1].duration(), 0.5);
}

#[test]
fn empty_roll_has_no_answers() {
    let r = PianoRoll::default();
    assert!(r.is_empty());
    assert_eq!(r.range(), None);
    assert_eq!(r.nearest(1.0), None);
    assert_eq!(r.total_duration(), None);
}

#[test]
fn from_document_encodes_then_projects() {
    let doc = Document::new(
        1,
        480,
        vec![vec![
            Event::set_tempo(0, 500_000),
            Event::note_on(0, 69, 100),
            Event::note_off(480, 69),
        ]],
    );
    let r = PianoRoll::from_document(&doc, &ProjectOptions::default()).unwrap();
    assert_eq!(r.len(), 1);
    assert_eq!(r.events[0].sitch(), "A4");
    assert_eq!(r.events[0].ontime, 0.0);
    assert!((r.events[0].offtime - 0.5).abs() < 1e-9);
}
