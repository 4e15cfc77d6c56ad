use super::*;

#[test]
fn wire_form_matches_event_stream_shape() {
    let ev = Event::note_on(12, 60, 100);
    let v = serde_json::to_value(&ev).unwrap();
    assert_eq!(
        v,
        serde_json::json!({
            "deltaTime": 12,
            "type": "channel",
            "subtype": "noteOn",
            "channel": 0,
            "noteNumber": 60,
            "velocity": 100,
        })
    );
}

#[test]
fn json_roundtrip_keeps_extra_fields() {
    let s = r#"{"deltaTime":0,"type":"channel","subtype":"controller","channel":1,
        "controllerType":64,"value":127,"running":1}"#;
    let ev: Event = serde_json::from_str(s).unwrap();
    assert_eq!(
        ev.body,
        EventBody::Controller {
            channel: 1,
            controller_type: 64,
            value: 127
        }
    );
    assert_eq!(ev.extra.get("running"), Some(&FieldValue::Int(1)));

    let back: Event = serde_json::from_value(serde_json::to_value(&ev).unwrap()).unwrap();
    assert_eq!(back, ev);
}

#[test]
fn unknown_subtype_keeps_category_and_fields() {
    let s = r#"{"deltaTime":3,"type":"meta","subtype":"smpteOffset","hour":1,"frame":20}"#;
    let ev: Event = serde_json::from_str(s).unwrap();
    assert_eq!(ev.category(), Category::Meta);
    assert_eq!(ev.subtype(), "smpteOffset");
    assert_eq!(ev.fields().len(), 2);
}

#[test]
fn unknown_subtype_without_category_is_rejected() {
    let s = r#"{"deltaTime":3,"subtype":"mystery"}"#;
    assert!(serde_json::from_str::<Event>(s).is_err());
}

#[test]
fn missing_subtype_is_rejected() {
    assert!(serde_json::from_str::<Event>(r#"{"deltaTime":3,"type":"meta"}"#).is_err());
}

#[test]
fn missing_or_out_of_range_fields_degrade_to_zero() {
    let mut fields = Fields::new();
    fields.insert("noteNumber".to_string(), FieldValue::Int(300));
    let ev = Event::from_parts(0, None, "noteOff", fields).unwrap();
    assert_eq!(
        ev.body,
        EventBody::NoteOff {
            channel: 0,
            note_number: 0,
            velocity: 0
        }
    );

    let ev = Event::from_parts(0, None, "setTempo", Fields::new()).unwrap();
    assert_eq!(
        ev.body,
        EventBody::SetTempo {
            microseconds_per_beat: 0
        }
    );
}

#[test]
fn text_events_share_one_variant() {
    let mut fields = Fields::new();
    fields.insert("text".to_string(), FieldValue::Text("Piano".to_string()));
    let ev = Event::from_parts(0, None, "trackName", fields).unwrap();
    assert_eq!(ev.category(), Category::Meta);
    assert_eq!(ev.subtype(), "trackName");
    assert_eq!(
        ev.fields().get("text"),
        Some(&FieldValue::Text("Piano".to_string()))
    );
}

#[test]
fn key_signature_keeps_negative_keys() {
    let ev = Event::new(
        0,
        EventBody::KeySignature {
            key: -3,
            scale: 1,
        },
    );
    let back: Event = serde_json::from_value(serde_json::to_value(&ev).unwrap()).unwrap();
    assert_eq!(back, ev);
}

#[test]
fn absolute_ticks_accumulate_per_track() {
    let track = vec![
        Event::note_on(10, 60, 90),
        Event::note_off(5, 60),
        Event::end_of_track(0),
    ];
    let ticks: Vec<u64> = absolute_ticks(&track).map(|(t, _)| t).collect();
    assert_eq!(ticks, vec![10, 15, 15]);
}

#[test]
fn metadata_collects_plain_text_only() {
    let text = |kind, s: &str| {
        Event::new(
            0,
            EventBody::Text {
                kind,
                text: s.to_string(),
            },
        )
    };
    let doc = Document::new(
        1,
        480,
        vec![
            vec![text(TextKind::TrackName, "Piano"), text(TextKind::Text, "take 2")],
            vec![text(TextKind::Text, "pedal on")],
        ],
    );
    assert_eq!(doc.metadata(), vec!["take 2", "pedal on"]);
    assert_eq!(doc.header.track_count, 2);
}
