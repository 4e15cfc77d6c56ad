use crate::{
    codec::encoder::{EncodeOptions, GraphEncoder},
    foundation::error::MidiLdResult,
    roll::projector::{ProjectOptions, TempoRollProjector},
    stream::document::Document,
};

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Note placed on the real-time axis.
pub struct PerformedNote {
    /// Id of the entity the note was projected from.
    pub id: String,
    /// Onset in seconds.
    pub ontime: f64,
    /// Offset in seconds.
    pub offtime: f64,
    /// MIDI key number.
    pub pitch: u8,
    /// Attack velocity.
    pub onvel: u8,
    /// Release velocity.
    pub offvel: u8,
    /// MIDI channel.
    pub channel: u8,
}

impl PerformedNote {
    /// Sounding length in seconds.
    pub fn duration(&self) -> f64 {
        self.offtime - self.ontime
    }

    /// Scientific pitch spelling with sharps, `60` → `C4`.
    pub fn sitch(&self) -> String {
        let octave = i32::from(self.pitch / 12) - 1;
        format!("{}{octave}", PITCH_CLASSES[usize::from(self.pitch % 12)])
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Notes of a piece ordered by onset.
pub struct PianoRoll {
    /// Notes, ascending by `ontime`.
    pub events: Vec<PerformedNote>,
}

impl PianoRoll {
    /// Encode `doc` with default options and project it.
    pub fn from_document(doc: &Document, opts: &ProjectOptions) -> MidiLdResult<Self> {
        let encoded = GraphEncoder::encode(doc, &EncodeOptions::default());
        TempoRollProjector::project(&encoded.graph, &encoded.piece, opts)
    }

    /// Number of notes.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the roll has no notes.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// First and last onset.
    pub fn range(&self) -> Option<(f64, f64)> {
        Some((self.events.first()?.ontime, self.events.last()?.ontime))
    }

    /// Note whose onset is closest to `time`; the earlier note wins ties.
    pub fn nearest(&self, time: f64) -> Option<&PerformedNote> {
        self.events.iter().min_by(|a, b| {
            (a.ontime - time)
                .abs()
                .total_cmp(&(b.ontime - time).abs())
        })
    }

    /// Time at which the last note stops sounding.
    pub fn total_duration(&self) -> Option<f64> {
        self.events.iter().map(|n| n.offtime).reduce(f64::max)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/roll/piano_roll.rs"]
mod tests;
