pub mod piano_roll;
pub mod projector;
pub mod tempo;
