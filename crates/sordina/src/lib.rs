#![doc = include_str!("../README.md")]

pub mod config;
mod error;
mod processor;
pub mod stats;

// Public re-exports.
pub use config::{Config, NlpConfig, NlpMode};
pub use error::Error;
pub use processor::{LineEchoProcessor, frame_size};
pub use stats::CancellerStats;

// The per-sample core, for hosts that want sample-at-a-time control.
pub use sordina_lec::{AdaptionMode, EchoCanceller};
