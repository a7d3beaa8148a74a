//! Biosignal acquisition pipeline
//!
//! A DMA-driven ADC samples continuously. Each completed DMA frame raises the
//! conversion-done interrupt, which releases the [processing] task. The task
//! filters every sample through a fixed low-pass cascade, decimates each frame
//! to one value and collects the values into payloads. Completed payloads are
//! handed to the [net] publisher, which posts them as JSON to an HTTP
//! endpoint.
//!
//! ```text
//! ADC/DMA -> InterruptHandler -> ProcessingTask -> PayloadBuffer -> Publisher -> HTTP
//!              (dataReady)        (FilterChain)    (payloadReady)
//! ```
#![cfg_attr(not(test), no_std)]

pub mod hardware;
pub mod metadata;
pub mod net;
pub mod processing;
pub mod settings;
pub mod telemetry;
