use crate::foundation::vocab;
use crate::graph::model::{Entity, Graph};

/// A resolved Raw Event.
#[derive(Clone, Copy, Debug)]
pub struct RawEvent<'g> {
    /// Entity id.
    pub id: &'g str,
    /// The entity itself.
    pub entity: &'g Entity,
}

impl RawEvent<'_> {
    /// Absolute tick; missing or negative ticks read as zero.
    pub fn tick(&self) -> u64 {
        tick_of(self.entity, vocab::ABSOLUTE_TICK).unwrap_or(0)
    }
}

/// One resolved entry of a track's `hasEvent` list.
#[derive(Clone, Copy, Debug)]
pub enum TrackEntry<'g> {
    /// Entity mirroring one event-stream event.
    Raw(RawEvent<'g>),
    /// Unified Note Entity with both of its Raw Events resolved.
    Note {
        /// Note entity id.
        id: &'g str,
        /// The note-on Raw Event.
        onset: RawEvent<'g>,
        /// The note-off Raw Event.
        offset: RawEvent<'g>,
    },
    /// Note entity that carries CRM time-span ticks instead of onset/offset references.
    Span {
        /// Note entity id.
        id: &'g str,
        /// The note entity (pitch, velocity and channel live here).
        entity: &'g Entity,
        /// Onset tick (midpoint of the begin interval).
        onset_tick: u64,
        /// Offset tick (midpoint of the end interval).
        offset_tick: u64,
    },
}

impl TrackEntry<'_> {
    /// Entity id of the entry.
    pub fn id(&self) -> &str {
        match self {
            Self::Raw(raw) => raw.id,
            Self::Note { id, .. } | Self::Span { id, .. } => *id,
        }
    }

    /// Tick the entry sorts by: its own tick, or its onset tick for notes.
    pub fn tick(&self) -> u64 {
        match self {
            Self::Raw(raw) => raw.tick(),
            Self::Note { onset, .. } => onset.tick(),
            Self::Span { onset_tick, .. } => *onset_tick,
        }
    }
}

/// Whether `entity` is tagged as a Unified Note Entity.
///
/// Three conventions are in circulation and all of them are accepted: a `midi:NoteEvent` type
/// tag, a `mer:NoteEvent` type tag, or a `crm:P2_has_type` reference to `midi:NoteEvent`.
pub fn is_note_entity(entity: &Entity) -> bool {
    entity.has_type(vocab::NOTE_EVENT)
        || entity.has_type(vocab::MER_NOTE_EVENT)
        || entity
            .references(vocab::HAS_TYPE)
            .any(|t| t == vocab::NOTE_EVENT)
}

/// Onset and offset ticks of a time-span annotated note.
///
/// Each edge is the midpoint of its CRM interval; if only one bound of an interval is present it
/// is used as-is.
pub fn time_span(entity: &Entity) -> Option<(u64, u64)> {
    let onset = interval_midpoint(
        entity.int(vocab::BEGIN_OF_THE_BEGIN),
        entity.int(vocab::END_OF_THE_BEGIN),
    )?;
    let offset = interval_midpoint(
        entity.int(vocab::BEGIN_OF_THE_END),
        entity.int(vocab::END_OF_THE_END),
    )?;
    Some((onset, offset))
}

fn tick_of(entity: &Entity, key: &str) -> Option<u64> {
    entity.int(key).and_then(|t| u64::try_from(t).ok())
}

// Bounds may dip below zero when an imprecision margin was subtracted at tick 0.
fn interval_midpoint(lo: Option<i64>, hi: Option<i64>) -> Option<u64> {
    let mid = match (lo, hi) {
        (Some(lo), Some(hi)) => (i128::from(lo) + i128::from(hi)) / 2,
        (Some(t), None) | (None, Some(t)) => i128::from(t),
        (None, None) => return None,
    };
    Some(u64::try_from(mid.max(0)).unwrap_or(u64::MAX))
}

impl Graph {
    /// Resolve a track's `hasEvent` list, in relation order.
    ///
    /// Dangling references and note entities whose onset or offset cannot be resolved are
    /// skipped with a warning.
    pub fn track_entries<'g>(&'g self, track: &'g Entity) -> Vec<TrackEntry<'g>> {
        track
            .references(vocab::HAS_EVENT)
            .filter_map(|id| {
                let Some(entity) = self.get(id) else {
                    tracing::warn!(event_id = id, "event reference does not resolve");
                    return None;
                };
                self.classify(id, entity)
            })
            .collect()
    }

    fn classify<'g>(&'g self, id: &'g str, entity: &'g Entity) -> Option<TrackEntry<'g>> {
        if !is_note_entity(entity) {
            return Some(TrackEntry::Raw(RawEvent { id, entity }));
        }

        let onset = entity.reference(vocab::HAS_ONSET);
        let offset = entity.reference(vocab::HAS_OFFSET);
        if let (Some(onset_id), Some(offset_id)) = (onset, offset) {
            match (self.get(onset_id), self.get(offset_id)) {
                (Some(on), Some(off)) => {
                    return Some(TrackEntry::Note {
                        id,
                        onset: RawEvent {
                            id: onset_id,
                            entity: on,
                        },
                        offset: RawEvent {
                            id: offset_id,
                            entity: off,
                        },
                    });
                }
                _ => tracing::warn!(note = id, "note onset or offset does not resolve"),
            }
        }

        if let Some((onset_tick, offset_tick)) = time_span(entity) {
            return Some(TrackEntry::Span {
                id,
                entity,
                onset_tick,
                offset_tick,
            });
        }

        tracing::warn!(note = id, "note entity has neither onset/offset nor time span");
        None
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/view.rs"]
mod tests;
