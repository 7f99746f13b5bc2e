//! Structured output validation.
//!
//! - [`Validator`]: named predicate over a parsed JSON response
//! - [`ValidationOutcome`]: accepted, or rejected with the violated constraint
//! - [`ValidationError`]: what failed and where
//!
//! # Examples
//!
//! ```
//! use novel_datagen::structured::{SchemaValidator, Validator};
//! use serde_json::json;
//!
//! let validator = SchemaValidator::lenient("turn", json!({
//!     "type": "object",
//!     "required": ["from", "value"],
//!     "properties": {"from": {"enum": ["human", "gpt"]}}
//! }));
//!
//! assert!(validator.validate(&json!({"from": "gpt", "value": "hi"})).is_accepted());
//! assert!(!validator.validate(&json!({"from": "bot", "value": "hi"})).is_accepted());
//! ```

pub mod error;
pub mod validator;

pub use error::{ValidationError, ValidationOutcome};
pub use validator::{validator_fn, AcceptAll, FnValidator, SchemaValidator, Validator};
