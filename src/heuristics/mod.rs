//! Constructive engine and search drivers.
//!
//! `state` holds the immutable snapshot engine (masking and extension);
//! `construction` drives it greedily or from several starts.

pub mod state;
pub mod construction;

pub use state::*;
pub use construction::*;
