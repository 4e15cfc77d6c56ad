use std::collections::BTreeSet;

use crate::{
    foundation::{
        error::{MidiLdError, MidiLdResult},
        vocab,
    },
    graph::{
        model::{Entity, Graph, Value},
        view::{RawEvent, TrackEntry},
    },
    stream::document::{Category, Document, Event, FieldValue, Fields, Header},
};

/// Stateless decoder from entity graph back to event stream.
pub struct GraphDecoder;

impl GraphDecoder {
    #[tracing::instrument(skip(graph))]
    /// Rebuild the document rooted at `piece_id`.
    ///
    /// Unified Note Entities expand to their onset and offset Raw Events; a Raw Event reachable
    /// both directly and through a note is emitted once. Events are ordered by absolute tick,
    /// ties keeping their `hasEvent` order, and delta times are recomputed from that order.
    pub fn decode(graph: &Graph, piece_id: &str) -> MidiLdResult<Document> {
        let piece = graph
            .get(piece_id)
            .ok_or_else(|| MidiLdError::missing_root(piece_id))?;

        let mut tracks = Vec::new();
        for track_id in piece.references(vocab::HAS_TRACK) {
            let Some(track) = graph.get(track_id) else {
                tracing::warn!(track = track_id, "track reference does not resolve");
                continue;
            };
            tracks.push(decode_track(graph, track));
        }

        let defaults = Header::default();
        let format_type = header_field(piece, vocab::FORMAT).unwrap_or(defaults.format_type);
        let ticks_per_beat =
            header_field(piece, vocab::RESOLUTION).unwrap_or(defaults.ticks_per_beat);
        Ok(Document::new(format_type, ticks_per_beat, tracks))
    }
}

fn header_field(piece: &Entity, key: &str) -> Option<u16> {
    piece.int(key).and_then(|v| u16::try_from(v).ok())
}

// One event-to-be, placed at its absolute tick.
struct Placed<'g> {
    tick: u64,
    id: &'g str,
    entity: &'g Entity,
    subtype: Option<&'static str>,
    drop_velocity: bool,
}

impl<'g> Placed<'g> {
    fn raw(raw: RawEvent<'g>) -> Self {
        Self {
            tick: raw.tick(),
            id: raw.id,
            entity: raw.entity,
            subtype: None,
            drop_velocity: false,
        }
    }

    fn forced(raw: RawEvent<'g>, subtype: &'static str) -> Self {
        Self {
            subtype: Some(subtype),
            ..Self::raw(raw)
        }
    }
}

fn decode_track(graph: &Graph, track: &Entity) -> Vec<Event> {
    let mut seen = BTreeSet::new();
    let mut placed = Vec::new();

    for entry in graph.track_entries(track) {
        match entry {
            TrackEntry::Raw(raw) => {
                if seen.insert(raw.id) {
                    placed.push(Placed::raw(raw));
                }
            }
            TrackEntry::Note { onset, offset, .. } => {
                if seen.insert(onset.id) {
                    placed.push(Placed::forced(onset, "noteOn"));
                }
                if seen.insert(offset.id) {
                    placed.push(Placed::forced(offset, "noteOff"));
                }
            }
            TrackEntry::Span {
                id,
                entity,
                onset_tick,
                offset_tick,
            } => {
                if seen.insert(id) {
                    placed.push(Placed {
                        tick: onset_tick,
                        id,
                        entity,
                        subtype: Some("noteOn"),
                        drop_velocity: false,
                    });
                    placed.push(Placed {
                        tick: offset_tick,
                        id,
                        entity,
                        subtype: Some("noteOff"),
                        drop_velocity: true,
                    });
                }
            }
        }
    }

    // Stable: equal ticks keep relation order.
    placed.sort_by_key(|p| p.tick);

    let mut events = Vec::with_capacity(placed.len());
    let mut previous = 0u64;
    for p in &placed {
        match rebuild(p, p.tick - previous) {
            Ok(event) => {
                events.push(event);
                previous = p.tick;
            }
            Err(err) => tracing::warn!(event_id = p.id, %err, "skipping event"),
        }
    }
    events
}

fn rebuild(p: &Placed<'_>, delta_time: u64) -> MidiLdResult<Event> {
    let mut category = None;
    let mut subtype = p.subtype.map(str::to_string);

    for tag in &p.entity.types {
        if tag == vocab::NOTE_EVENT {
            continue;
        }
        let Some(name) = vocab::event_type_name(tag) else {
            continue;
        };
        match Category::parse(&name) {
            Some(c) => category = Some(c),
            None if subtype.is_none() => subtype = Some(name),
            None => {}
        }
    }
    // Producers that copied the stream fields verbatim.
    if category.is_none() {
        category = p.entity.text(vocab::TYPE_FIELD).and_then(Category::parse);
    }
    if subtype.is_none() {
        subtype = p.entity.text(vocab::SUBTYPE_FIELD).map(str::to_string);
    }
    let subtype = subtype.ok_or_else(|| {
        MidiLdError::malformed_event(format!("entity '{}' has no event type tag", p.id))
    })?;

    let note_level = matches!(subtype.as_str(), "noteOn" | "noteOff" | "noteAftertouch");
    let mut fields = Fields::new();
    for (key, values) in &p.entity.attributes {
        let Some(name) = vocab::midi_local_name(key) else {
            continue;
        };
        if matches!(name, "absoluteTick" | "type" | "subtype") {
            continue;
        }
        let value = match values.first() {
            Some(Value::Int(v)) => FieldValue::Int(*v),
            Some(Value::Text(s)) => FieldValue::Text(s.clone()),
            Some(Value::Ref(_)) | None => continue,
        };
        let name = if note_level && name == "pitch" {
            "noteNumber"
        } else {
            name
        };
        fields.insert(name.to_string(), value);
    }
    if p.drop_velocity {
        fields.insert("velocity".to_string(), FieldValue::Int(0));
    }

    Event::from_parts(delta_time, category, &subtype, fields)
}

#[cfg(test)]
#[path = "../../tests/unit/codec/decoder.rs"]
mod tests;
