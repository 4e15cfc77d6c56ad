use std::collections::BTreeMap;

use crate::foundation::error::{MidiLdError, MidiLdResult};

/// Scalar value of an event field.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Integer field (note numbers, velocities, tempo, ...).
    Int(i64),
    /// String field (text meta events).
    Text(String),
}

/// Generic field map keyed by event-stream field name (`noteNumber`, `velocity`, ...).
pub type Fields = BTreeMap<String, FieldValue>;

/// Wire key of the delta time.
pub const DELTA_TIME_KEY: &str = "deltaTime";
/// Wire key of the event category.
pub const TYPE_KEY: &str = "type";
/// Wire key of the event subtype.
pub const SUBTYPE_KEY: &str = "subtype";

/// Coarse event category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    /// Channel voice message.
    Channel,
    /// Meta event.
    Meta,
}

impl Category {
    /// Wire name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Meta => "meta",
        }
    }

    /// Parse a wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "channel" => Some(Self::Channel),
            "meta" => Some(Self::Meta),
            _ => None,
        }
    }
}

/// Text-carrying meta event flavors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Free text.
    Text,
    /// Copyright notice.
    CopyrightNotice,
    /// Sequence or track name.
    TrackName,
    /// Instrument name.
    InstrumentName,
    /// Lyrics.
    Lyrics,
    /// Marker.
    Marker,
    /// Cue point.
    CuePoint,
}

impl TextKind {
    const ALL: [Self; 7] = [
        Self::Text,
        Self::CopyrightNotice,
        Self::TrackName,
        Self::InstrumentName,
        Self::Lyrics,
        Self::Marker,
        Self::CuePoint,
    ];

    /// Event-stream subtype name.
    pub fn subtype(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::CopyrightNotice => "copyrightNotice",
            Self::TrackName => "trackName",
            Self::InstrumentName => "instrumentName",
            Self::Lyrics => "lyrics",
            Self::Marker => "marker",
            Self::CuePoint => "cuePoint",
        }
    }

    fn from_subtype(subtype: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.subtype() == subtype)
    }
}

/// Typed payload of an event, one variant per known subtype.
///
/// Subtypes outside the closed set land in [`EventBody::Other`] and keep all of their fields in
/// [`Event::extra`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventBody {
    /// Note start.
    NoteOn {
        /// MIDI channel (0-15).
        channel: u8,
        /// Key number.
        note_number: u8,
        /// Attack velocity.
        velocity: u8,
    },
    /// Note end.
    NoteOff {
        /// MIDI channel (0-15).
        channel: u8,
        /// Key number.
        note_number: u8,
        /// Release velocity.
        velocity: u8,
    },
    /// Polyphonic key pressure.
    NoteAftertouch {
        /// MIDI channel (0-15).
        channel: u8,
        /// Key number.
        note_number: u8,
        /// Pressure amount.
        amount: u8,
    },
    /// Control change.
    Controller {
        /// MIDI channel (0-15).
        channel: u8,
        /// Controller number (64 = sustain pedal).
        controller_type: u8,
        /// Controller value.
        value: u8,
    },
    /// Program change.
    ProgramChange {
        /// MIDI channel (0-15).
        channel: u8,
        /// Program number.
        value: u8,
    },
    /// Channel pressure.
    ChannelAftertouch {
        /// MIDI channel (0-15).
        channel: u8,
        /// Pressure amount.
        amount: u8,
    },
    /// Pitch wheel, raw 14-bit value (8192 = center).
    PitchBend {
        /// MIDI channel (0-15).
        channel: u8,
        /// Raw bend value.
        value: u16,
    },
    /// Tempo change.
    SetTempo {
        /// Length of a quarter note in microseconds.
        microseconds_per_beat: u32,
    },
    /// End of track marker.
    EndOfTrack,
    /// Any text-carrying meta event.
    Text {
        /// Which text event this is.
        kind: TextKind,
        /// Text payload.
        text: String,
    },
    /// Time signature.
    TimeSignature {
        /// Beats per bar.
        numerator: u8,
        /// Beat unit (4 = quarter).
        denominator: u8,
        /// MIDI clocks per metronome click.
        metronome: u8,
        /// Notated 32nd notes per quarter.
        thirtyseconds: u8,
    },
    /// Key signature.
    KeySignature {
        /// Sharps (positive) or flats (negative).
        key: i8,
        /// 0 = major, 1 = minor.
        scale: u8,
    },
    /// Subtype outside the closed set.
    Other {
        /// Coarse category.
        category: Category,
        /// Subtype name as found in the source.
        subtype: String,
    },
}

/// One time-stamped event of a track.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Fields", into = "Fields")]
pub struct Event {
    /// Ticks since the previous event of the same track.
    pub delta_time: u64,
    /// Typed payload.
    pub body: EventBody,
    /// Fields not covered by the typed payload, copied verbatim.
    pub extra: Fields,
}

impl Event {
    /// Event without extra fields.
    pub fn new(delta_time: u64, body: EventBody) -> Self {
        Self {
            delta_time,
            body,
            extra: Fields::new(),
        }
    }

    /// Note-on on channel 0.
    pub fn note_on(delta_time: u64, note_number: u8, velocity: u8) -> Self {
        Self::new(
            delta_time,
            EventBody::NoteOn {
                channel: 0,
                note_number,
                velocity,
            },
        )
    }

    /// Note-off on channel 0 with zero release velocity.
    pub fn note_off(delta_time: u64, note_number: u8) -> Self {
        Self::new(
            delta_time,
            EventBody::NoteOff {
                channel: 0,
                note_number,
                velocity: 0,
            },
        )
    }

    /// Tempo change.
    pub fn set_tempo(delta_time: u64, microseconds_per_beat: u32) -> Self {
        Self::new(
            delta_time,
            EventBody::SetTempo {
                microseconds_per_beat,
            },
        )
    }

    /// End of track marker.
    pub fn end_of_track(delta_time: u64) -> Self {
        Self::new(delta_time, EventBody::EndOfTrack)
    }

    /// Coarse category of the event.
    pub fn category(&self) -> Category {
        match &self.body {
            EventBody::NoteOn { .. }
            | EventBody::NoteOff { .. }
            | EventBody::NoteAftertouch { .. }
            | EventBody::Controller { .. }
            | EventBody::ProgramChange { .. }
            | EventBody::ChannelAftertouch { .. }
            | EventBody::PitchBend { .. } => Category::Channel,
            EventBody::SetTempo { .. }
            | EventBody::EndOfTrack
            | EventBody::Text { .. }
            | EventBody::TimeSignature { .. }
            | EventBody::KeySignature { .. } => Category::Meta,
            EventBody::Other { category, .. } => *category,
        }
    }

    /// Event-stream subtype name (`noteOn`, `setTempo`, ...).
    pub fn subtype(&self) -> &str {
        match &self.body {
            EventBody::NoteOn { .. } => "noteOn",
            EventBody::NoteOff { .. } => "noteOff",
            EventBody::NoteAftertouch { .. } => "noteAftertouch",
            EventBody::Controller { .. } => "controller",
            EventBody::ProgramChange { .. } => "programChange",
            EventBody::ChannelAftertouch { .. } => "channelAftertouch",
            EventBody::PitchBend { .. } => "pitchBend",
            EventBody::SetTempo { .. } => "setTempo",
            EventBody::EndOfTrack => "endOfTrack",
            EventBody::Text { kind, .. } => kind.subtype(),
            EventBody::TimeSignature { .. } => "timeSignature",
            EventBody::KeySignature { .. } => "keySignature",
            EventBody::Other { subtype, .. } => subtype,
        }
    }

    /// Key number of note-level events.
    pub fn note_number(&self) -> Option<u8> {
        match self.body {
            EventBody::NoteOn { note_number, .. }
            | EventBody::NoteOff { note_number, .. }
            | EventBody::NoteAftertouch { note_number, .. } => Some(note_number),
            _ => None,
        }
    }

    /// Every payload field (typed and extra) under its event-stream name.
    ///
    /// `deltaTime`, `type` and `subtype` are not part of the result.
    pub fn fields(&self) -> Fields {
        let mut out = self.extra.clone();
        let ints: Vec<(&str, i64)> = match &self.body {
            EventBody::NoteOn {
                channel,
                note_number,
                velocity,
            }
            | EventBody::NoteOff {
                channel,
                note_number,
                velocity,
            } => vec![
                ("channel", i64::from(*channel)),
                ("noteNumber", i64::from(*note_number)),
                ("velocity", i64::from(*velocity)),
            ],
            EventBody::NoteAftertouch {
                channel,
                note_number,
                amount,
            } => vec![
                ("channel", i64::from(*channel)),
                ("noteNumber", i64::from(*note_number)),
                ("amount", i64::from(*amount)),
            ],
            EventBody::Controller {
                channel,
                controller_type,
                value,
            } => vec![
                ("channel", i64::from(*channel)),
                ("controllerType", i64::from(*controller_type)),
                ("value", i64::from(*value)),
            ],
            EventBody::ProgramChange { channel, value } => vec![
                ("channel", i64::from(*channel)),
                ("value", i64::from(*value)),
            ],
            EventBody::ChannelAftertouch { channel, amount } => vec![
                ("channel", i64::from(*channel)),
                ("amount", i64::from(*amount)),
            ],
            EventBody::PitchBend { channel, value } => vec![
                ("channel", i64::from(*channel)),
                ("value", i64::from(*value)),
            ],
            EventBody::SetTempo {
                microseconds_per_beat,
            } => vec![("microsecondsPerBeat", i64::from(*microseconds_per_beat))],
            EventBody::TimeSignature {
                numerator,
                denominator,
                metronome,
                thirtyseconds,
            } => vec![
                ("numerator", i64::from(*numerator)),
                ("denominator", i64::from(*denominator)),
                ("metronome", i64::from(*metronome)),
                ("thirtyseconds", i64::from(*thirtyseconds)),
            ],
            EventBody::KeySignature { key, scale } => {
                vec![("key", i64::from(*key)), ("scale", i64::from(*scale))]
            }
            EventBody::Text { text, .. } => {
                out.insert("text".to_string(), FieldValue::Text(text.clone()));
                Vec::new()
            }
            EventBody::EndOfTrack | EventBody::Other { .. } => Vec::new(),
        };
        for (key, value) in ints {
            out.insert(key.to_string(), FieldValue::Int(value));
        }
        out
    }

    /// Rebuild an event from its subtype and a generic field map.
    ///
    /// Typed fields are taken out of `fields`; whatever remains becomes [`Event::extra`]. Missing
    /// typed fields default to zero. `category` is only consulted for unknown subtypes, which
    /// cannot be rebuilt without it.
    pub fn from_parts(
        delta_time: u64,
        category: Option<Category>,
        subtype: &str,
        fields: Fields,
    ) -> MidiLdResult<Self> {
        let mut r = FieldReader { subtype, fields };
        let body = match subtype {
            "noteOn" => EventBody::NoteOn {
                channel: r.int("channel"),
                note_number: r.int("noteNumber"),
                velocity: r.int("velocity"),
            },
            "noteOff" => EventBody::NoteOff {
                channel: r.int("channel"),
                note_number: r.int("noteNumber"),
                velocity: r.int("velocity"),
            },
            "noteAftertouch" => EventBody::NoteAftertouch {
                channel: r.int("channel"),
                note_number: r.int("noteNumber"),
                amount: r.int("amount"),
            },
            "controller" => EventBody::Controller {
                channel: r.int("channel"),
                controller_type: r.int("controllerType"),
                value: r.int("value"),
            },
            "programChange" => EventBody::ProgramChange {
                channel: r.int("channel"),
                value: r.int("value"),
            },
            "channelAftertouch" => EventBody::ChannelAftertouch {
                channel: r.int("channel"),
                amount: r.int("amount"),
            },
            "pitchBend" => EventBody::PitchBend {
                channel: r.int("channel"),
                value: r.int("value"),
            },
            "setTempo" => EventBody::SetTempo {
                microseconds_per_beat: r.int("microsecondsPerBeat"),
            },
            "endOfTrack" => EventBody::EndOfTrack,
            "timeSignature" => EventBody::TimeSignature {
                numerator: r.int("numerator"),
                denominator: r.int("denominator"),
                metronome: r.int("metronome"),
                thirtyseconds: r.int("thirtyseconds"),
            },
            "keySignature" => EventBody::KeySignature {
                key: r.int("key"),
                scale: r.int("scale"),
            },
            other => match TextKind::from_subtype(other) {
                Some(kind) => EventBody::Text {
                    kind,
                    text: r.text("text"),
                },
                None => {
                    let Some(category) = category else {
                        return Err(MidiLdError::malformed_event(format!(
                            "unknown subtype '{other}' without a category"
                        )));
                    };
                    EventBody::Other {
                        category,
                        subtype: other.to_string(),
                    }
                }
            },
        };

        Ok(Self {
            delta_time,
            body,
            extra: r.fields,
        })
    }
}

struct FieldReader<'a> {
    subtype: &'a str,
    fields: Fields,
}

impl FieldReader<'_> {
    fn int<T>(&mut self, key: &str) -> T
    where
        T: TryFrom<i64> + Default,
    {
        match self.fields.remove(key) {
            Some(FieldValue::Int(v)) => T::try_from(v).unwrap_or_else(|_| {
                tracing::warn!(subtype = self.subtype, key, value = v, "field out of range");
                T::default()
            }),
            Some(FieldValue::Text(s)) => {
                tracing::warn!(subtype = self.subtype, key, value = %s, "expected integer field");
                T::default()
            }
            None => T::default(),
        }
    }

    fn text(&mut self, key: &str) -> String {
        match self.fields.remove(key) {
            Some(FieldValue::Text(s)) => s,
            Some(FieldValue::Int(v)) => v.to_string(),
            None => String::new(),
        }
    }
}

impl TryFrom<Fields> for Event {
    type Error = MidiLdError;

    fn try_from(mut fields: Fields) -> Result<Self, Self::Error> {
        let delta_time = match fields.remove(DELTA_TIME_KEY) {
            Some(FieldValue::Int(v)) => u64::try_from(v)
                .map_err(|_| MidiLdError::malformed_event(format!("negative deltaTime {v}")))?,
            Some(FieldValue::Text(_)) => {
                return Err(MidiLdError::malformed_event("deltaTime must be an integer"));
            }
            None => 0,
        };
        let category = match fields.remove(TYPE_KEY) {
            Some(FieldValue::Text(s)) => Category::parse(&s),
            _ => None,
        };
        let subtype = match fields.remove(SUBTYPE_KEY) {
            Some(FieldValue::Text(s)) => s,
            _ => return Err(MidiLdError::malformed_event("event without subtype")),
        };
        Self::from_parts(delta_time, category, &subtype, fields)
    }
}

impl From<Event> for Fields {
    fn from(event: Event) -> Self {
        let mut fields = event.fields();
        fields.insert(
            DELTA_TIME_KEY.to_string(),
            FieldValue::Int(i64::try_from(event.delta_time).unwrap_or(i64::MAX)),
        );
        fields.insert(
            TYPE_KEY.to_string(),
            FieldValue::Text(event.category().as_str().to_string()),
        );
        fields.insert(
            SUBTYPE_KEY.to_string(),
            FieldValue::Text(event.subtype().to_string()),
        );
        fields
    }
}

/// Document header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// SMF format (0, 1 or 2).
    pub format_type: u16,
    /// Declared number of tracks.
    pub track_count: u16,
    /// Ticks per quarter note.
    pub ticks_per_beat: u16,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            format_type: 1,
            track_count: 0,
            ticks_per_beat: 480,
        }
    }
}

/// Event-stream document: header plus ordered tracks of delta-timed events.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    /// Format, track count and resolution.
    pub header: Header,
    /// Tracks in file order; each track in chronological order.
    pub tracks: Vec<Vec<Event>>,
}

impl Document {
    /// Document from tracks, with `track_count` filled in.
    pub fn new(format_type: u16, ticks_per_beat: u16, tracks: Vec<Vec<Event>>) -> Self {
        Self {
            header: Header {
                format_type,
                track_count: u16::try_from(tracks.len()).unwrap_or(u16::MAX),
                ticks_per_beat,
            },
            tracks,
        }
    }

    /// Texts of all plain `text` meta events, in track order.
    pub fn metadata(&self) -> Vec<&str> {
        self.tracks
            .iter()
            .flatten()
            .filter_map(|e| match &e.body {
                EventBody::Text {
                    kind: TextKind::Text,
                    text,
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Pair every event of a track with its absolute tick.
pub fn absolute_ticks(track: &[Event]) -> impl Iterator<Item = (u64, &Event)> {
    track.iter().scan(0u64, |tick, event| {
        *tick = tick.saturating_add(event.delta_time);
        Some((*tick, event))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/stream/document.rs"]
mod tests;
