//! Dataset records and reshaping.
//!
//! All transforms are pure and keep input order.

mod alpaca;
mod conversation;
mod fallback;
mod output;

pub use alpaca::{
    alpaca_to_conversation, conversation_to_alpaca, extract_inputs, records_to_alpaca, AlpacaRecord,
};
pub use conversation::{
    clean_conversation, clean_records, enforce_shape, flatten_groups, merge_consecutive,
    strip_phrases, ConversationRecord, Speaker, Turn,
};
pub use fallback::{EmptyTurnPolicy, FallbackPolicy, FallbackSelection};
pub use output::{read_json, write_json, OutputTarget};
