//! Human-readable output. The textual report doubles as the machine channel
//! between the reducer and the scanner, so its line shapes are fixed.

pub mod text;

pub use text::{UNDEFINED, render_report};
