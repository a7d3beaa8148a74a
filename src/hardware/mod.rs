//! Acquisition side: the DMA ADC contract and the conversion-done interrupt
pub mod adc;
pub mod interrupt;

pub use adc::*;
pub use interrupt::InterruptHandler;
