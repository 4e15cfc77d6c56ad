use crate::{
    foundation::{
        error::{MidiLdError, MidiLdResult},
        vocab,
    },
    graph::{
        model::{Entity, Graph},
        view::TrackEntry,
    },
    roll::{
        piano_roll::{PerformedNote, PianoRoll},
        tempo::{TempoMap, TempoMode, seconds_per_tick},
    },
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Knobs for [`TempoRollProjector::project`].
pub struct ProjectOptions {
    /// Tick → seconds strategy.
    pub tempo: TempoMode,
    /// Resolution used when the piece carries none.
    pub default_resolution: u16,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            tempo: TempoMode::default(),
            default_resolution: 480,
        }
    }
}

/// Stateless projector from entity graph to piano roll.
pub struct TempoRollProjector;

impl TempoRollProjector {
    #[tracing::instrument(skip(graph, opts))]
    /// Project every note of the piece rooted at `piece_id` onto seconds.
    pub fn project(
        graph: &Graph,
        piece_id: &str,
        opts: &ProjectOptions,
    ) -> MidiLdResult<PianoRoll> {
        let piece = graph
            .get(piece_id)
            .ok_or_else(|| MidiLdError::missing_root(piece_id))?;
        let ticks_per_beat = piece
            .int(vocab::RESOLUTION)
            .and_then(|v| u16::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(opts.default_resolution);

        let tracks: Vec<Vec<TrackEntry<'_>>> = piece
            .references(vocab::HAS_TRACK)
            .filter_map(|id| {
                let track = graph.get(id);
                if track.is_none() {
                    tracing::warn!(track = id, "track reference does not resolve");
                }
                track
            })
            .map(|track| {
                let mut entries = graph.track_entries(track);
                entries.sort_by_key(|e| e.tick());
                entries
            })
            .collect();

        let map = match opts.tempo {
            TempoMode::Current => None,
            TempoMode::Integrated => Some(TempoMap::new(
                tracks.iter().flatten().filter_map(|entry| match entry {
                    TrackEntry::Raw(raw) if raw.entity.has_type(vocab::SET_TEMPO_EVENT) => {
                        Some((raw.tick(), tempo_of(raw.entity)))
                    }
                    _ => None,
                }),
                ticks_per_beat,
            )),
        };

        let mut events = Vec::new();
        for entries in &tracks {
            let mut factor = 0.0;
            let seconds = |tick: u64, factor: f64| match &map {
                Some(map) => map.seconds_at(tick),
                None => factor * tick as f64,
            };

            for entry in entries {
                match *entry {
                    TrackEntry::Raw(raw) => {
                        if raw.entity.has_type(vocab::SET_TEMPO_EVENT) {
                            factor = seconds_per_tick(tempo_of(raw.entity), ticks_per_beat);
                        }
                    }
                    TrackEntry::Note { id, onset, offset } => events.push(PerformedNote {
                        id: id.to_string(),
                        ontime: seconds(onset.tick(), factor),
                        offtime: seconds(offset.tick(), factor),
                        pitch: byte(onset.entity, vocab::PITCH),
                        onvel: byte(onset.entity, vocab::VELOCITY),
                        offvel: byte(offset.entity, vocab::VELOCITY),
                        channel: byte(onset.entity, vocab::CHANNEL),
                    }),
                    TrackEntry::Span {
                        id,
                        entity,
                        onset_tick,
                        offset_tick,
                    } => events.push(PerformedNote {
                        id: id.to_string(),
                        ontime: seconds(onset_tick, factor),
                        offtime: seconds(offset_tick, factor),
                        pitch: byte(entity, vocab::PITCH),
                        onvel: byte(entity, vocab::VELOCITY),
                        offvel: byte(entity, vocab::VELOCITY),
                        channel: byte(entity, vocab::CHANNEL),
                    }),
                }
            }
        }

        events.sort_by(|a, b| a.ontime.total_cmp(&b.ontime));
        Ok(PianoRoll { events })
    }
}

fn tempo_of(entity: &Entity) -> i64 {
    entity.int(vocab::MICROSECONDS_PER_BEAT).unwrap_or(0)
}

fn byte(entity: &Entity, key: &str) -> u8 {
    entity
        .int(key)
        .and_then(|v| u8::try_from(v).ok())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/roll/projector.rs"]
mod tests;
