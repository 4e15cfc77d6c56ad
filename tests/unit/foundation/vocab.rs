use super::*;

#[test]
fn event_tags_capitalize_and_suffix() {
    assert_eq!(event_type_tag("noteOn"), NOTE_EVENT.replace("Note", "NoteOn"));
    assert_eq!(
        event_type_tag("channel"),
        "http://purl.org/midi-ld/midi#ChannelEvent"
    );
    assert_eq!(
        event_type_tag("setTempo"),
        "http://purl.org/midi-ld/midi#SetTempoEvent"
    );
}

#[test]
fn event_tags_invert() {
    for name in ["noteOn", "noteOff", "meta", "endOfTrack", "keySignature"] {
        assert_eq!(event_type_name(&event_type_tag(name)).as_deref(), Some(name));
    }
}

#[test]
fn foreign_or_non_event_tags_have_no_name() {
    assert_eq!(event_type_name(PIECE), None);
    assert_eq!(event_type_name(MER_NOTE_EVENT), None);
    assert_eq!(event_type_name(&midi("Event")), None);
}

#[test]
fn local_names_only_for_midi_namespace() {
    assert_eq!(midi_local_name(PITCH), Some("pitch"));
    assert_eq!(midi_local_name(HAS_ONSET), None);
    assert_eq!(midi_local_name(MIDI_NS), None);
}
