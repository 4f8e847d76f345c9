//! Channel-fanout spam detection.
//!
//! Flags accounts that post across many channels within a short window, a
//! common automated-spam pattern: the same account drops near-identical
//! messages into every channel it can see, seconds apart. The detector keeps
//! a per-account sliding window of the last message per channel and, once the
//! distinct-channel count crosses the configured threshold, notifies staff,
//! times the account out, and deletes the stored message in every flagged
//! channel.

pub mod detector;
pub mod error;
pub mod notice;
pub mod settings;
pub mod window;

pub use {
    detector::{FanoutDetector, Outcome},
    error::{Error, Result},
    settings::FanoutSettings,
    window::WindowedMultimap,
};
