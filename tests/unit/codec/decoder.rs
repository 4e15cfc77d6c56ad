use super::*;
use crate::codec::encoder::{EncodeOptions, GraphEncoder};
use crate::stream::document::{EventBody, TextKind};

fn raw(subtype: &str, tick: i64) -> Entity {
    let category = if subtype.starts_with("note") {
        "channel"
    } else {
        "meta"
    };
    let mut e = Entity::typed(vocab::event_type_tag(category));
    e.add_type(vocab::event_type_tag(subtype));
    e.with(vocab::ABSOLUTE_TICK, Value::Int(tick))
}

fn reference(id: &str) -> Value {
    Value::Ref(id.to_string())
}

fn piece_with_track(graph: &mut Graph, events: &[&str]) {
    let mut track = Entity::typed(vocab::TRACK);
    for id in events {
        track.add(vocab::HAS_EVENT, reference(id));
    }
    graph.insert("track", track);
    graph.insert(
        "piece",
        Entity::typed(vocab::PIECE)
            .with(vocab::RESOLUTION, Value::Int(96))
            .with(vocab::HAS_TRACK, reference("track")),
    );
}

#[test]
fn missing_root_is_an_error() {
    let err = GraphDecoder::decode(&Graph::new(), "urn:nope").unwrap_err();
    assert!(matches!(err, MidiLdError::MissingRoot(ref id) if id == "urn:nope"));
}

#[test]
fn single_note_scenario_roundtrips() {
    let doc = Document::new(
        1,
        480,
        vec![vec![Event::note_on(0, 60, 100), Event::note_off(480, 60)]],
    );
    let enc = GraphEncoder::encode(&doc, &EncodeOptions::default());
    let back = GraphDecoder::decode(&enc.graph, &enc.piece).unwrap();

    assert_eq!(back, doc);
    let deltas: Vec<u64> = back.tracks[0].iter().map(|e| e.delta_time).collect();
    assert_eq!(deltas, vec![0, 480]);
}

#[test]
fn mixed_document_roundtrips_exactly() {
    let mut smpte = Event::new(
        0,
        EventBody::Other {
            category: Category::Meta,
            subtype: "smpteOffset".to_string(),
        },
    );
    smpte
        .extra
        .insert("hours".to_string(), FieldValue::Int(1));

    let doc = Document::new(
        1,
        960,
        vec![
            vec![
                smpte,
                Event::new(
                    0,
                    EventBody::Text {
                        kind: TextKind::Text,
                        text: "Prelude".to_string(),
                    },
                ),
                Event::set_tempo(0, 600_000),
                Event::new(0, EventBody::KeySignature { key: -3, scale: 1 }),
                Event::end_of_track(0),
            ],
            vec![
                Event::note_off(0, 40),
                Event::note_on(0, 60, 90),
                Event::note_on(0, 60, 91),
                Event::note_on(5, 64, 70),
                Event::new(
                    0,
                    EventBody::NoteOff {
                        channel: 0,
                        note_number: 64,
                        velocity: 33,
                    },
                ),
                Event::note_off(10, 60),
                Event::note_off(0, 60),
                Event::note_on(0, 72, 50),
                Event::end_of_track(7),
            ],
        ],
    );

    let enc = GraphEncoder::encode(&doc, &EncodeOptions::default());
    let back = GraphDecoder::decode(&enc.graph, &enc.piece).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn pitch_maps_to_note_number_only_for_note_events() {
    let mut g = Graph::new();
    g.insert("port", raw("portPrefix", 0).with(vocab::PITCH, Value::Int(3)));
    g.insert(
        "on",
        raw("noteOn", 0)
            .with(vocab::CHANNEL, Value::Int(0))
            .with(vocab::PITCH, Value::Int(60))
            .with(vocab::VELOCITY, Value::Int(90)),
    );
    piece_with_track(&mut g, &["port", "on"]);

    let doc = GraphDecoder::decode(&g, "piece").unwrap();
    let port = &doc.tracks[0][0];
    assert_eq!(port.subtype(), "portPrefix");
    assert_eq!(port.extra.get("pitch"), Some(&FieldValue::Int(3)));
    assert!(!port.extra.contains_key("noteNumber"));
    assert_eq!(doc.tracks[0][1], Event::note_on(0, 60, 90));
}

#[test]
fn other_events_keep_pitch_and_note_number_fields() {
    let other = |delta: u64, subtype: &str, fields: &[(&str, i64)]| {
        let mut e = Event::new(
            delta,
            EventBody::Other {
                category: Category::Meta,
                subtype: subtype.to_string(),
            },
        );
        for (k, v) in fields {
            e.extra.insert(k.to_string(), FieldValue::Int(*v));
        }
        e
    };
    let doc = Document::new(
        1,
        480,
        vec![vec![
            other(0, "midiChannelPrefix", &[("channel", 9)]),
            Event::note_on(0, 60, 100),
            other(12, "cueSheet", &[("pitch", 3), ("noteNumber", 4)]),
            Event::note_off(0, 60),
            Event::end_of_track(0),
        ]],
    );

    let enc = GraphEncoder::encode(&doc, &EncodeOptions::default());
    let back = GraphDecoder::decode(&enc.graph, &enc.piece).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn events_are_sorted_by_tick_with_relation_order_on_ties() {
    let mut g = Graph::new();
    g.insert("late", raw("endOfTrack", 200));
    g.insert("a", raw("marker", 50).with(vocab::midi("text"), Value::Text("a".to_string())));
    g.insert("b", raw("marker", 50).with(vocab::midi("text"), Value::Text("b".to_string())));
    g.insert("first", raw("setTempo", 0));
    piece_with_track(&mut g, &["late", "a", "missing", "b", "first"]);

    let doc = GraphDecoder::decode(&g, "piece").unwrap();
    let track = &doc.tracks[0];
    let shape: Vec<(&str, u64)> = track.iter().map(|e| (e.subtype(), e.delta_time)).collect();
    assert_eq!(
        shape,
        vec![
            ("setTempo", 0),
            ("marker", 50),
            ("marker", 0),
            ("endOfTrack", 150)
        ]
    );
    assert!(matches!(&track[1].body, EventBody::Text { text, .. } if text == "a"));
    assert_eq!(doc.header.ticks_per_beat, 96);
    assert_eq!(doc.header.format_type, 1);
    assert_eq!(doc.header.track_count, 1);
}

#[test]
fn note_expansion_forces_note_subtypes_and_dedupes() {
    let mut g = Graph::new();
    // Onset tagged only as a channel event: the note supplies the subtype.
    g.insert(
        "on",
        Entity::typed(vocab::event_type_tag("channel"))
            .with(vocab::ABSOLUTE_TICK, Value::Int(0))
            .with(vocab::PITCH, Value::Int(67))
            .with(vocab::VELOCITY, Value::Int(88)),
    );
    g.insert(
        "off",
        raw("noteOff", 96)
            .with(vocab::PITCH, Value::Int(67))
            .with(vocab::VELOCITY, Value::Int(12)),
    );
    g.insert(
        "note",
        Entity::typed(vocab::MER_NOTE_EVENT)
            .with(vocab::HAS_ONSET, reference("on"))
            .with(vocab::HAS_OFFSET, reference("off")),
    );
    piece_with_track(&mut g, &["note", "on", "off"]);

    let doc = GraphDecoder::decode(&g, "piece").unwrap();
    assert_eq!(
        doc.tracks[0],
        vec![
            Event::note_on(0, 67, 88),
            Event::new(
                96,
                EventBody::NoteOff {
                    channel: 0,
                    note_number: 67,
                    velocity: 12,
                }
            ),
        ]
    );
}

#[test]
fn span_notes_expand_to_synthetic_pairs() {
    let mut g = Graph::new();
    g.insert(
        "span",
        Entity::typed(vocab::NOTE_EVENT)
            .with(vocab::PITCH, Value::Int(62))
            .with(vocab::VELOCITY, Value::Int(70))
            .with(vocab::CHANNEL, Value::Int(3))
            .with(vocab::BEGIN_OF_THE_BEGIN, Value::Int(90))
            .with(vocab::END_OF_THE_BEGIN, Value::Int(110))
            .with(vocab::BEGIN_OF_THE_END, Value::Int(470))
            .with(vocab::END_OF_THE_END, Value::Int(490)),
    );
    piece_with_track(&mut g, &["span", "span"]);

    let doc = GraphDecoder::decode(&g, "piece").unwrap();
    assert_eq!(
        doc.tracks[0],
        vec![
            Event::new(
                100,
                EventBody::NoteOn {
                    channel: 3,
                    note_number: 62,
                    velocity: 70,
                }
            ),
            Event::new(
                380,
                EventBody::NoteOff {
                    channel: 3,
                    note_number: 62,
                    velocity: 0,
                }
            ),
        ]
    );
}

#[test]
fn legacy_type_fields_and_foreign_keys() {
    let mut g = Graph::new();
    g.insert(
        "legacy",
        Entity::default()
            .with(vocab::ABSOLUTE_TICK, Value::Int(4))
            .with(vocab::TYPE_FIELD, Value::Text("meta".to_string()))
            .with(vocab::SUBTYPE_FIELD, Value::Text("endOfTrack".to_string()))
            .with("http://example.org/provenance", Value::Int(9))
            .with(vocab::midi("seeAlso"), reference("elsewhere")),
    );
    g.insert("untyped", Entity::default().with(vocab::ABSOLUTE_TICK, Value::Int(1)));
    piece_with_track(&mut g, &["untyped", "legacy"]);

    let doc = GraphDecoder::decode(&g, "piece").unwrap();
    assert_eq!(doc.tracks[0], vec![Event::end_of_track(4)]);
}

#[test]
fn dangling_tracks_are_skipped() {
    let mut g = Graph::new();
    g.insert(
        "piece",
        Entity::typed(vocab::PIECE)
            .with(vocab::HAS_TRACK, reference("gone"))
            .with(vocab::HAS_TRACK, reference("t")),
    );
    g.insert("t", Entity::typed(vocab::TRACK));

    let doc = GraphDecoder::decode(&g, "piece").unwrap();
    assert_eq!(doc.tracks.len(), 1);
    assert_eq!(doc.header.track_count, 1);
    assert_eq!(doc.header.ticks_per_beat, 480);
}
