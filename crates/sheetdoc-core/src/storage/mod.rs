//! Storage formats.

pub mod front_matter;
