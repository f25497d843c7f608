//! Marker tracking: the tracker contract and the session controller that reacts to it.

/// Selection state machine driven by tracker signals.
pub mod controller;
/// Tracker trait, subscriptions and the scripted tracker.
pub mod tracker;
