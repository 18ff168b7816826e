//! Core types for snsbridge

mod attribute;
mod envelope;
mod message;

pub use attribute::*;
pub use envelope::*;
pub use message::*;
