#![doc = include_str!("../README.md")]

pub mod config;

pub(crate) mod comfort_noise;
pub(crate) mod dc_blocker;
pub(crate) mod double_talk;
pub(crate) mod level;

mod canceller;

pub use canceller::{CreateError, EchoCanceller};
pub use config::AdaptionMode;
