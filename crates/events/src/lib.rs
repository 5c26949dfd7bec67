//! Run progress broadcast.
//!
//! The [`progress::ProgressPublisher`] fans terminal run events out to
//! per-project subscribers. Delivery is best-effort: a failed send drops
//! that subscriber, and subscriptions expire if no terminal event arrives
//! within the timeout.

pub mod progress;

pub use progress::{GenerationEvent, ProgressPublisher, RunOutcome, GENERATION_EVENT};
