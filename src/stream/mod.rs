pub mod document;
pub mod smf;
