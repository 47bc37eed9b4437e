//! Singer message output
//!
//! Messages are written as one JSON document per line. Stdout carries
//! nothing else; logging goes to stderr.

mod emitter;
mod message;

pub use emitter::Emitter;
pub use message::Message;
