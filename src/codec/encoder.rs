use crate::{
    foundation::vocab,
    graph::model::{Entity, Graph, Value},
    stream::document::{Document, Event, EventBody, FieldValue},
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Knobs for [`GraphEncoder::encode`].
pub struct EncodeOptions {
    /// Document URL every entity id is derived from.
    pub base_url: String,
    /// Name of the piece inside the document.
    pub piece_name: String,
    /// Also annotate notes with CRM time-span bounds.
    pub time_spans: bool,
    /// Half-width, in ticks, of the onset and offset intervals written when `time_spans` is set.
    pub imprecision_ticks: u64,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            base_url: "urn:midi-ld:doc".to_string(),
            piece_name: "piece".to_string(),
            time_spans: false,
            imprecision_ticks: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Result of encoding one document.
pub struct Encoded {
    /// Every entity produced for the piece.
    pub graph: Graph,
    /// Id of the Piece entity (the root for decoding and projection).
    pub piece: String,
}

/// Stateless encoder from event stream to entity graph.
pub struct GraphEncoder;

impl GraphEncoder {
    #[tracing::instrument(skip(doc, opts))]
    /// Encode `doc` into a fresh graph.
    ///
    /// Every event becomes a Raw Event entity. Each note-off is paired with the most recent
    /// unpaired note-on of the same pitch in its track, and the pair becomes a Unified Note Entity
    /// listed in the track just before the note-off. Overlapping same-pitch notes therefore only
    /// pair correctly when they close in reverse order of opening.
    pub fn encode(doc: &Document, opts: &EncodeOptions) -> Encoded {
        let ids = IdScheme::new(opts);
        let mut graph = Graph::new();

        let mut piece = Entity::typed(vocab::PIECE)
            .with(
                vocab::RESOLUTION,
                Value::Int(i64::from(doc.header.ticks_per_beat)),
            )
            .with(vocab::FORMAT, Value::Int(i64::from(doc.header.format_type)));

        for (track_index, events) in doc.tracks.iter().enumerate() {
            let track_id = ids.track(track_index);
            let track = encode_track(&mut graph, &ids, track_index, events, opts);
            graph.insert(track_id.clone(), track);
            piece.add(vocab::HAS_TRACK, Value::Ref(track_id));
        }

        let piece_id = ids.piece();
        graph.insert(piece_id.clone(), piece);
        Encoded {
            graph,
            piece: piece_id,
        }
    }
}

struct IdScheme {
    prefix: String,
}

impl IdScheme {
    fn new(opts: &EncodeOptions) -> Self {
        Self {
            prefix: format!(
                "{}#{}",
                opts.base_url.trim_end_matches('#'),
                opts.piece_name
            ),
        }
    }

    fn piece(&self) -> String {
        self.prefix.clone()
    }

    fn track(&self, track: usize) -> String {
        format!("{}-t{track}", self.prefix)
    }

    fn event(&self, track: usize, event: usize) -> String {
        format!("{}-t{track}-e{event}", self.prefix)
    }

    fn note(&self, track: usize, note: usize) -> String {
        format!("{}-t{track}-n{note}", self.prefix)
    }
}

// Opened note waiting for its note-off. Never written to the graph on its own.
struct PendingNote {
    pitch: u8,
    onset_id: String,
    onset_tick: u64,
    note_id: String,
}

fn encode_track(
    graph: &mut Graph,
    ids: &IdScheme,
    track_index: usize,
    events: &[Event],
    opts: &EncodeOptions,
) -> Entity {
    let mut track = Entity::typed(vocab::TRACK);
    let mut pending: Vec<PendingNote> = Vec::new();
    let mut notes_opened = 0usize;
    let mut tick = 0u64;

    for (event_index, event) in events.iter().enumerate() {
        tick = tick.saturating_add(event.delta_time);
        let event_id = ids.event(track_index, event_index);

        match event.body {
            EventBody::NoteOn { note_number, .. } => {
                pending.push(PendingNote {
                    pitch: note_number,
                    onset_id: event_id.clone(),
                    onset_tick: tick,
                    note_id: ids.note(track_index, notes_opened),
                });
                notes_opened += 1;
            }
            EventBody::NoteOff { note_number, .. } => {
                match pending.iter().rposition(|p| p.pitch == note_number) {
                    Some(pos) => {
                        let opened = pending.remove(pos);
                        let note = note_entity(&opened, &event_id, tick, opts);
                        track.add(vocab::HAS_EVENT, Value::Ref(opened.note_id.clone()));
                        graph.insert(opened.note_id, note);
                    }
                    None => tracing::warn!(
                        track = track_index,
                        tick,
                        pitch = note_number,
                        "note-off without a matching note-on"
                    ),
                }
            }
            _ => {}
        }

        graph.insert(event_id.clone(), raw_event(event, tick));
        track.add(vocab::HAS_EVENT, Value::Ref(event_id));
    }

    if !pending.is_empty() {
        tracing::debug!(
            track = track_index,
            unclosed = pending.len(),
            "dropping notes that were never closed"
        );
    }
    track
}

fn raw_event(event: &Event, tick: u64) -> Entity {
    let mut entity = Entity::typed(vocab::event_type_tag(event.category().as_str()));
    entity.add_type(vocab::event_type_tag(event.subtype()));
    entity.add(vocab::ABSOLUTE_TICK, tick_value(tick));

    let note_level = event.note_number().is_some();
    for (key, value) in event.fields() {
        // Note-level events publish their note number as `midi:pitch`.
        let name = match key.as_str() {
            "noteNumber" if note_level => "pitch",
            "pitch" if note_level => {
                tracing::warn!(
                    tick,
                    "dropping extra 'pitch' field that clashes with the note number"
                );
                continue;
            }
            other => other,
        };
        let value = match value {
            FieldValue::Int(v) => Value::Int(v),
            FieldValue::Text(s) => Value::Text(s),
        };
        entity.add(vocab::midi(name), value);
    }
    entity
}

fn note_entity(
    opened: &PendingNote,
    offset_id: &str,
    offset_tick: u64,
    opts: &EncodeOptions,
) -> Entity {
    let mut note = Entity::typed(vocab::NOTE_EVENT)
        .with(vocab::HAS_ONSET, Value::Ref(opened.onset_id.clone()))
        .with(vocab::HAS_OFFSET, Value::Ref(offset_id.to_string()));

    if opts.time_spans {
        let margin = i128::from(opts.imprecision_ticks);
        let bound = |tick: u64, delta: i128| {
            let v = i128::from(tick) + delta;
            Value::Int(i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX }))
        };
        note.add(vocab::HAS_TYPE, Value::Ref(vocab::NOTE_EVENT.to_string()));
        note.add(vocab::BEGIN_OF_THE_BEGIN, bound(opened.onset_tick, -margin));
        note.add(vocab::END_OF_THE_BEGIN, bound(opened.onset_tick, margin));
        note.add(vocab::BEGIN_OF_THE_END, bound(offset_tick, -margin));
        note.add(vocab::END_OF_THE_END, bound(offset_tick, margin));
    }
    note
}

fn tick_value(tick: u64) -> Value {
    Value::Int(i64::try_from(tick).unwrap_or(i64::MAX))
}

#[cfg(test)]
#[path = "../../tests/unit/codec/encoder.rs"]
mod tests;
