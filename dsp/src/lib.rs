#![cfg_attr(not(test), no_std)]

pub mod iir;
pub use iir::{Coefficients, FilterStage, State};
mod cascade;
pub use cascade::*;
mod decimate;
pub use decimate::*;

#[cfg(test)]
pub mod testing;
