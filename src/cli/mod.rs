//! Command-line front end: the presentation layer driving `NoteStore`.
mod app;
mod args;

pub use app::*;
pub use args::*;
