//! midi-ld converts MIDI performances between two shapes.
//!
//! - An **event stream** ([`Document`]): a header plus tracks of delta-timed events, the shape of
//!   a Standard MIDI File.
//! - An **entity graph** ([`Graph`]): URL-identified entities in the MIDI-LD vocabulary. Every
//!   event becomes a Raw Event entity with an absolute tick, and every matched note-on/note-off
//!   pair additionally becomes a Unified Note Entity pointing at both.
//!
//! # Pipeline overview
//!
//! 1. **Encode**: `Document -> Graph` with [`GraphEncoder`]
//! 2. **Decode**: `Graph + piece id -> Document` with [`GraphDecoder`]
//! 3. **Project**: `Graph + piece id -> PianoRoll` (notes in seconds) with [`TempoRollProjector`]
//!
//! Encoding and decoding round-trip: every event comes back at its original absolute tick.
//! Standard MIDI File bytes are read and written through [`Document::from_smf_bytes`] and
//! [`Document::to_smf_bytes`].
//!
//! All operations are synchronous and pure. Broken references in a graph are skipped with a
//! `tracing` warning rather than failing the whole call; only a missing root entity is an error.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(missing_docs_in_private_items)]

mod codec;
mod foundation;
mod graph;
mod roll;
mod stream;

pub use codec::decoder::GraphDecoder;
pub use codec::encoder::{EncodeOptions, Encoded, GraphEncoder};
pub use foundation::error::{MidiLdError, MidiLdResult};
/// Vocabulary URLs and tag helpers.
pub use foundation::vocab;
pub use graph::model::{Entity, Graph, Value};
pub use graph::view::{RawEvent, TrackEntry, is_note_entity, time_span};
pub use roll::piano_roll::{PerformedNote, PianoRoll};
pub use roll::projector::{ProjectOptions, TempoRollProjector};
pub use roll::tempo::{DEFAULT_MICROSECONDS_PER_BEAT, TempoMap, TempoMode, seconds_per_tick};
pub use stream::document::{
    Category, Document, Event, EventBody, FieldValue, Fields, Header, TextKind, absolute_ticks,
};
