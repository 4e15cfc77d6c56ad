use midly::num::{u4, u7, u14, u15, u24, u28};
use midly::{
    Format, Fps, MetaMessage, MidiMessage, Smf, SmpteTime, Timing, TrackEvent, TrackEventKind,
};

use crate::foundation::error::{MidiLdError, MidiLdResult};
use crate::stream::document::{
    Category, Document, Event, EventBody, FieldValue, Fields, TextKind,
};

const MAX_DELTA: u64 = (1 << 28) - 1;
const MAX_TEMPO: u32 = (1 << 24) - 1;

impl Document {
    /// Parse a Standard MIDI File.
    ///
    /// Note-on messages with zero velocity become `noteOff` events. SMPTE offset, port prefix,
    /// channel prefix, sequence number, program name and device name become
    /// [`EventBody::Other`] meta events with their values in `extra`. SysEx, escape,
    /// sequencer-specific and unknown meta messages are dropped; their delta time is carried into
    /// the next kept event so absolute positions stay intact.
    pub fn from_smf_bytes(bytes: &[u8]) -> MidiLdResult<Self> {
        let smf = Smf::parse(bytes).map_err(|e| MidiLdError::smf(e.to_string()))?;

        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(..) => {
                return Err(MidiLdError::smf("timecode timing is not supported"));
            }
        };
        let format_type = match smf.header.format {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
            Format::Sequential => 2,
        };

        let tracks = smf.tracks.iter().map(|t| import_track(t)).collect();
        Ok(Self::new(format_type, ticks_per_beat, tracks))
    }

    /// Serialize into Standard MIDI File bytes.
    ///
    /// Events of unknown subtypes, and `Other` meta events whose fields do not form a valid
    /// message, cannot be expressed in SMF and are dropped, carrying their delta time forward.
    pub fn to_smf_bytes(&self) -> MidiLdResult<Vec<u8>> {
        let format = match self.header.format_type {
            0 => Format::SingleTrack,
            2 => Format::Sequential,
            _ => Format::Parallel,
        };
        if self.header.ticks_per_beat == 0 || self.header.ticks_per_beat > 0x7FFF {
            return Err(MidiLdError::smf(format!(
                "ticks per beat {} is not representable",
                self.header.ticks_per_beat
            )));
        }
        let timing = Timing::Metrical(u15::new(self.header.ticks_per_beat));

        let mut smf = Smf::new(midly::Header::new(format, timing));
        for track in &self.tracks {
            smf.tracks.push(export_track(track)?);
        }

        let mut out = Vec::new();
        smf.write_std(&mut out)
            .map_err(|e| MidiLdError::smf(e.to_string()))?;
        Ok(out)
    }
}

fn import_track(track: &[TrackEvent<'_>]) -> Vec<Event> {
    let mut out = Vec::with_capacity(track.len());
    let mut carry = 0u64;
    for ev in track {
        let delta_time = carry + u64::from(ev.delta.as_int());
        match import_kind(ev.kind) {
            Some((body, extra)) => {
                out.push(Event {
                    delta_time,
                    body,
                    extra,
                });
                carry = 0;
            }
            None => carry = delta_time,
        }
    }
    out
}

fn import_kind(kind: TrackEventKind<'_>) -> Option<(EventBody, Fields)> {
    match kind {
        TrackEventKind::Midi { channel, message } => {
            Some((import_message(channel.as_int(), message), Fields::new()))
        }
        TrackEventKind::Meta(meta) => import_meta(meta),
        TrackEventKind::SysEx(data) | TrackEventKind::Escape(data) => {
            tracing::debug!(len = data.len(), "dropping sysex/escape message");
            None
        }
    }
}

fn import_message(channel: u8, message: MidiMessage) -> EventBody {
    match message {
        MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => EventBody::NoteOff {
            channel,
            note_number: key.as_int(),
            velocity: 0,
        },
        MidiMessage::NoteOn { key, vel } => EventBody::NoteOn {
            channel,
            note_number: key.as_int(),
            velocity: vel.as_int(),
        },
        MidiMessage::NoteOff { key, vel } => EventBody::NoteOff {
            channel,
            note_number: key.as_int(),
            velocity: vel.as_int(),
        },
        MidiMessage::Aftertouch { key, vel } => EventBody::NoteAftertouch {
            channel,
            note_number: key.as_int(),
            amount: vel.as_int(),
        },
        MidiMessage::Controller { controller, value } => EventBody::Controller {
            channel,
            controller_type: controller.as_int(),
            value: value.as_int(),
        },
        MidiMessage::ProgramChange { program } => EventBody::ProgramChange {
            channel,
            value: program.as_int(),
        },
        MidiMessage::ChannelAftertouch { vel } => EventBody::ChannelAftertouch {
            channel,
            amount: vel.as_int(),
        },
        MidiMessage::PitchBend { bend } => EventBody::PitchBend {
            channel,
            value: bend.0.as_int(),
        },
    }
}

fn int(v: impl Into<i64>) -> FieldValue {
    FieldValue::Int(v.into())
}

fn lossy(bytes: &[u8]) -> FieldValue {
    FieldValue::Text(String::from_utf8_lossy(bytes).into_owned())
}

fn other_meta(
    subtype: &str,
    fields: impl IntoIterator<Item = (&'static str, FieldValue)>,
) -> Option<(EventBody, Fields)> {
    let body = EventBody::Other {
        category: Category::Meta,
        subtype: subtype.to_string(),
    };
    let extra = fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    Some((body, extra))
}

fn import_meta(meta: MetaMessage<'_>) -> Option<(EventBody, Fields)> {
    let text = |kind: TextKind, bytes: &[u8]| EventBody::Text {
        kind,
        text: String::from_utf8_lossy(bytes).into_owned(),
    };
    let body = match meta {
        MetaMessage::Tempo(tempo) => EventBody::SetTempo {
            microseconds_per_beat: tempo.as_int(),
        },
        MetaMessage::EndOfTrack => EventBody::EndOfTrack,
        MetaMessage::Text(b) => text(TextKind::Text, b),
        MetaMessage::Copyright(b) => text(TextKind::CopyrightNotice, b),
        MetaMessage::TrackName(b) => text(TextKind::TrackName, b),
        MetaMessage::InstrumentName(b) => text(TextKind::InstrumentName, b),
        MetaMessage::Lyric(b) => text(TextKind::Lyrics, b),
        MetaMessage::Marker(b) => text(TextKind::Marker, b),
        MetaMessage::CuePoint(b) => text(TextKind::CuePoint, b),
        MetaMessage::TimeSignature(numerator, denominator_pow, metronome, thirtyseconds) => {
            EventBody::TimeSignature {
                numerator,
                denominator: 1u8.checked_shl(u32::from(denominator_pow)).unwrap_or(0),
                metronome,
                thirtyseconds,
            }
        }
        MetaMessage::KeySignature(key, minor) => EventBody::KeySignature {
            key,
            scale: u8::from(minor),
        },
        MetaMessage::SmpteOffset(t) => {
            return other_meta(
                "smpteOffset",
                [
                    ("frameRate", int(t.fps().as_int())),
                    ("hour", int(t.hour())),
                    ("min", int(t.minute())),
                    ("sec", int(t.second())),
                    ("frame", int(t.frame())),
                    ("subFrame", int(t.subframe())),
                ],
            );
        }
        MetaMessage::MidiPort(port) => {
            return other_meta("portPrefix", [("port", int(port.as_int()))]);
        }
        MetaMessage::MidiChannel(channel) => {
            return other_meta("midiChannelPrefix", [("channel", int(channel.as_int()))]);
        }
        MetaMessage::TrackNumber(number) => {
            return other_meta("sequenceNumber", number.map(|n| ("number", int(n))));
        }
        MetaMessage::ProgramName(b) => return other_meta("programName", [("text", lossy(b))]),
        MetaMessage::DeviceName(b) => return other_meta("deviceName", [("text", lossy(b))]),
        other => {
            tracing::debug!(meta = ?other, "dropping unsupported meta message");
            return None;
        }
    };
    Some((body, Fields::new()))
}

fn export_track(track: &[Event]) -> MidiLdResult<Vec<TrackEvent<'_>>> {
    let mut out = Vec::with_capacity(track.len());
    let mut carry = 0u64;
    for event in track {
        let delta = carry.saturating_add(event.delta_time);
        let Some(kind) = export_kind(event) else {
            tracing::debug!(subtype = event.subtype(), "event has no SMF encoding");
            carry = delta;
            continue;
        };
        if delta > MAX_DELTA {
            return Err(MidiLdError::smf(format!(
                "delta time {delta} exceeds the 28-bit SMF limit"
            )));
        }
        out.push(TrackEvent {
            delta: u28::new(delta as u32),
            kind,
        });
        carry = 0;
    }
    Ok(out)
}

fn seven(v: u8) -> u7 {
    u7::new(v.min(0x7F))
}

fn export_kind(event: &Event) -> Option<TrackEventKind<'_>> {
    let midi = |channel: u8, message: MidiMessage| TrackEventKind::Midi {
        channel: u4::new(channel.min(0x0F)),
        message,
    };
    let kind = match &event.body {
        EventBody::NoteOn {
            channel,
            note_number,
            velocity,
        } => midi(
            *channel,
            MidiMessage::NoteOn {
                key: seven(*note_number),
                vel: seven(*velocity),
            },
        ),
        EventBody::NoteOff {
            channel,
            note_number,
            velocity,
        } => midi(
            *channel,
            MidiMessage::NoteOff {
                key: seven(*note_number),
                vel: seven(*velocity),
            },
        ),
        EventBody::NoteAftertouch {
            channel,
            note_number,
            amount,
        } => midi(
            *channel,
            MidiMessage::Aftertouch {
                key: seven(*note_number),
                vel: seven(*amount),
            },
        ),
        EventBody::Controller {
            channel,
            controller_type,
            value,
        } => midi(
            *channel,
            MidiMessage::Controller {
                controller: seven(*controller_type),
                value: seven(*value),
            },
        ),
        EventBody::ProgramChange { channel, value } => midi(
            *channel,
            MidiMessage::ProgramChange {
                program: seven(*value),
            },
        ),
        EventBody::ChannelAftertouch { channel, amount } => midi(
            *channel,
            MidiMessage::ChannelAftertouch {
                vel: seven(*amount),
            },
        ),
        EventBody::PitchBend { channel, value } => midi(
            *channel,
            MidiMessage::PitchBend {
                bend: midly::PitchBend(u14::new((*value).min(0x3FFF))),
            },
        ),
        EventBody::SetTempo {
            microseconds_per_beat,
        } => TrackEventKind::Meta(MetaMessage::Tempo(u24::new(
            (*microseconds_per_beat).min(MAX_TEMPO),
        ))),
        EventBody::EndOfTrack => TrackEventKind::Meta(MetaMessage::EndOfTrack),
        EventBody::Text { kind, text } => {
            let b = text.as_bytes();
            TrackEventKind::Meta(match kind {
                TextKind::Text => MetaMessage::Text(b),
                TextKind::CopyrightNotice => MetaMessage::Copyright(b),
                TextKind::TrackName => MetaMessage::TrackName(b),
                TextKind::InstrumentName => MetaMessage::InstrumentName(b),
                TextKind::Lyrics => MetaMessage::Lyric(b),
                TextKind::Marker => MetaMessage::Marker(b),
                TextKind::CuePoint => MetaMessage::CuePoint(b),
            })
        }
        EventBody::TimeSignature {
            numerator,
            denominator,
            metronome,
            thirtyseconds,
        } => {
            let pow = if *denominator == 0 {
                2
            } else {
                denominator.trailing_zeros() as u8
            };
            TrackEventKind::Meta(MetaMessage::TimeSignature(
                *numerator,
                pow,
                *metronome,
                *thirtyseconds,
            ))
        }
        EventBody::KeySignature { key, scale } => {
            TrackEventKind::Meta(MetaMessage::KeySignature(*key, *scale != 0))
        }
        EventBody::Other {
            category: Category::Meta,
            subtype,
        } => TrackEventKind::Meta(export_meta(subtype, &event.extra)?),
        EventBody::Other { .. } => return None,
    };
    Some(kind)
}

fn export_meta<'a>(subtype: &str, extra: &'a Fields) -> Option<MetaMessage<'a>> {
    let field = |key: &str| match extra.get(key) {
        Some(FieldValue::Int(v)) => Some(*v),
        _ => None,
    };
    let byte = |key: &str| field(key).and_then(|v| u8::try_from(v).ok());

    let meta = match subtype {
        "smpteOffset" => {
            let fps = Fps::from_int(byte("frameRate")?)?;
            MetaMessage::SmpteOffset(SmpteTime::new(
                byte("hour").unwrap_or(0),
                byte("min").unwrap_or(0),
                byte("sec").unwrap_or(0),
                byte("frame").unwrap_or(0),
                byte("subFrame").unwrap_or(0),
                fps,
            )?)
        }
        "portPrefix" => MetaMessage::MidiPort(u7::new(field("port")?.clamp(0, 0x7F) as u8)),
        "midiChannelPrefix" => {
            MetaMessage::MidiChannel(u4::new(field("channel")?.clamp(0, 0x0F) as u8))
        }
        "sequenceNumber" => {
            MetaMessage::TrackNumber(field("number").and_then(|n| u16::try_from(n).ok()))
        }
        "programName" => MetaMessage::ProgramName(text(extra)),
        "deviceName" => MetaMessage::DeviceName(text(extra)),
        _ => return None,
    };
    Some(meta)
}

fn text(extra: &Fields) -> &[u8] {
    match extra.get("text") {
        Some(FieldValue::Text(s)) => s.as_bytes(),
        _ => &[],
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stream/smf.rs"]
mod tests;
