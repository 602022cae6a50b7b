//! Document state and logic (UI-agnostic).

mod history;
mod io;
mod ops;
mod state;

pub use history::{Change, Snapshot};
pub use state::Document;
