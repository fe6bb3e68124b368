mod strategy;

pub use strategy::{retry, RetryDecision, RetryStrategy};
