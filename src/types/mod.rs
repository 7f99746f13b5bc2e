//! Core prompt types.

pub mod message;

pub use message::{Message, MessageRole};
