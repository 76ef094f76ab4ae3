//! Chat notifications.
//!
//! Defines the `Notifier` trait and the signed webhook implementation.
//! Delivery failures are logged by the notifier and never bubble up into
//! the tracking round.

pub mod webhook;

use async_trait::async_trait;

/// Abstraction over a chat sink.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message, splitting it as the sink requires.
    /// Returns the number of parts that were accepted.
    async fn send(&self, message: &str) -> usize;
}

/// Split `message` into parts of at most `max_chars` characters.
///
/// An empty message still yields one (empty) part.
pub fn split_message(message: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = message.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
