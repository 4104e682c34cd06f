//! Reload notifications.
//!
//! Lets the dictionary's consumers react when a new snapshot is published.

pub mod subscriber;

pub use subscriber::{SubscriberRegistry, SubscriptionHandle};
