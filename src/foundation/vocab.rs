//! Property and type URLs of the MIDI-LD vocabulary and its companions.
//!
//! Three namespaces are in play:
//!
//! - `midi:` (`http://purl.org/midi-ld/midi#`) for pieces, tracks, events and their fields,
//! - `mer:` (`https://measuring-early-records.org/`) for note pairing,
//! - `crm:` (CIDOC-CRM) for time-span annotations and the generic `P2_has_type` relation.

/// `midi:` namespace prefix.
pub const MIDI_NS: &str = "http://purl.org/midi-ld/midi#";
/// `mer:` namespace prefix.
pub const MER_NS: &str = "https://measuring-early-records.org/";
/// `crm:` namespace prefix.
pub const CRM_NS: &str = "http://www.cidoc-crm.org/cidoc-crm/";

macro_rules! midi_term {
    ($name:literal) => {
        concat!("http://purl.org/midi-ld/midi#", $name)
    };
}

macro_rules! mer_term {
    ($name:literal) => {
        concat!("https://measuring-early-records.org/", $name)
    };
}

macro_rules! crm_term {
    ($name:literal) => {
        concat!("http://www.cidoc-crm.org/cidoc-crm/", $name)
    };
}

/// Type of the root entity.
pub const PIECE: &str = midi_term!("Piece");
/// Type of a track entity.
pub const TRACK: &str = midi_term!("Track");
/// Canonical type of a Unified Note Entity.
pub const NOTE_EVENT: &str = midi_term!("NoteEvent");
/// Alternative unified-note type seen in projection code.
pub const MER_NOTE_EVENT: &str = mer_term!("NoteEvent");
/// Subtype tag of tempo changes.
pub const SET_TEMPO_EVENT: &str = midi_term!("SetTempoEvent");

/// Ordered Piece → Track relation.
pub const HAS_TRACK: &str = midi_term!("hasTrack");
/// Ordered Track → Event relation.
pub const HAS_EVENT: &str = midi_term!("hasEvent");
/// Note → onset Raw Event.
pub const HAS_ONSET: &str = mer_term!("has_onset");
/// Note → offset Raw Event.
pub const HAS_OFFSET: &str = mer_term!("has_offset");

/// Absolute tick of a Raw Event.
pub const ABSOLUTE_TICK: &str = midi_term!("absoluteTick");
/// Key number of note events (`noteNumber` in the event stream).
pub const PITCH: &str = midi_term!("pitch");
/// Note velocity.
pub const VELOCITY: &str = midi_term!("velocity");
/// MIDI channel.
pub const CHANNEL: &str = midi_term!("channel");
/// Controller number of controller events.
pub const CONTROLLER_TYPE: &str = midi_term!("controllerType");
/// Generic value field (controller value, program, pitch bend).
pub const VALUE: &str = midi_term!("value");
/// Tempo of `setTempo` events.
pub const MICROSECONDS_PER_BEAT: &str = midi_term!("microsecondsPerBeat");
/// Ticks per quarter note, stored on the piece.
pub const RESOLUTION: &str = midi_term!("resolution");
/// SMF format id, stored on the piece.
pub const FORMAT: &str = midi_term!("format");
/// Legacy category field some producers copy verbatim.
pub const TYPE_FIELD: &str = midi_term!("type");
/// Legacy subtype field some producers copy verbatim.
pub const SUBTYPE_FIELD: &str = midi_term!("subtype");

/// Generic "has type" relation.
pub const HAS_TYPE: &str = crm_term!("P2_has_type");
/// Earliest possible onset.
pub const BEGIN_OF_THE_BEGIN: &str = crm_term!("P82a_begin_of_the_begin");
/// Latest possible onset.
pub const END_OF_THE_BEGIN: &str = crm_term!("P81a_end_of_the_begin");
/// Earliest possible offset.
pub const BEGIN_OF_THE_END: &str = crm_term!("P81b_begin_of_the_end");
/// Latest possible offset.
pub const END_OF_THE_END: &str = crm_term!("P82b_end_of_the_end");

/// Expand a local name into the `midi:` namespace.
pub fn midi(name: &str) -> String {
    format!("{MIDI_NS}{name}")
}

/// Local part of a `midi:` URL, or `None` for foreign namespaces.
pub fn midi_local_name(url: &str) -> Option<&str> {
    url.strip_prefix(MIDI_NS).filter(|name| !name.is_empty())
}

/// Type tag for an event category or subtype: `noteOn` → `midi:NoteOnEvent`.
pub fn event_type_tag(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => midi(&format!("{}{}Event", first.to_uppercase(), chars.as_str())),
        None => midi("Event"),
    }
}

/// Inverse of [`event_type_tag`]: `midi:NoteOnEvent` → `noteOn`.
pub fn event_type_name(tag: &str) -> Option<String> {
    let stem = midi_local_name(tag)?.strip_suffix("Event")?;
    let mut chars = stem.chars();
    let first = chars.next()?;
    Some(format!("{}{}", first.to_lowercase(), chars.as_str()))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/vocab.rs"]
mod tests;
