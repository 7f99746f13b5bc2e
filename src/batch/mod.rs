//! Bounded concurrent request pipeline.
//!
//! Units fan out under a global concurrency ceiling and come back as a [`BatchOutcome`]
//! keyed by original position. A unit that exhausts its retries, or panics, is recorded as
//! a failure at its position; the rest of the batch is unaffected.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Unit`] | Text payload plus position |
//! | [`PromptBuilder`] | Pure `Unit -> ChatRequest` |
//! | [`TaskGroup`] | Semaphore-guarded `submit` / `join_all` |
//! | [`BatchExecutor`] | Runs a per-unit job or request over a unit list |
//! | [`BatchOutcome`] | Position-addressable results |
//!
//! ## Example
//!
//! ```rust
//! use novel_datagen::batch::{units_from, BatchExecutor};
//!
//! # #[tokio::main]
//! # async fn main() -> novel_datagen::Result<()> {
//! let outcome = BatchExecutor::with_concurrency(2)
//!     .run_batch(units_from(["a", "bb", "ccc"]), |unit| async move { Ok(unit.text.len()) })
//!     .await?;
//! assert_eq!(outcome.get(2).and_then(|o| o.completed()), Some(&3));
//! # Ok(())
//! # }
//! ```

mod executor;
mod group;
mod outcome;
mod unit;

pub use executor::{BatchExecutor, DEFAULT_CONCURRENCY_LIMIT};
pub use group::TaskGroup;
pub use outcome::{BatchOutcome, UnitFailure, UnitOutcome};
pub use unit::{units_from, PromptBuilder, Unit};
