#![doc = include_str!("../README.md")]

pub mod bit_ops;
pub mod fir;

pub use bit_ops::top_bit;
pub use fir::Fir16;
