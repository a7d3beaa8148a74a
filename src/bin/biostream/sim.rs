//! Simulated DMA ADC
//!
//! Synthesizes a slow physiological waveform with mains pickup and wideband
//! noise and lays it out as DMA conversion results.
use std::f64::consts::PI;

use biostream::{
    hardware::adc::{AcquisitionDriver, ResultFormat},
    settings::AdcSettings,
};
use rand_core::{RngCore, SeedableRng};
use rand_xorshift::XorShiftRng;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Conversion not started")]
    NotStarted,
}

pub struct SimulatedAdc {
    sample_frequency: f64,
    format: ResultFormat,
    channel: u8,
    full_code: f64,
    index: u64,
    rng: XorShiftRng,
    started: bool,
}

impl SimulatedAdc {
    pub fn new(settings: &AdcSettings, seed: u64) -> Self {
        Self {
            sample_frequency: settings.sample_frequency as f64,
            format: settings.format,
            channel: settings.channel,
            full_code: ((1u32 << settings.bit_width) - 1) as f64,
            index: 0,
            rng: XorShiftRng::seed_from_u64(seed),
            started: false,
        }
    }

    /// Next conversion code.
    fn convert(&mut self) -> u16 {
        let t = self.index as f64 / self.sample_frequency;
        self.index += 1;
        let noise = self.rng.next_u32() as f64 / u32::MAX as f64 - 0.5;
        // Relative to full scale
        let level = 0.5
            + 0.2 * (2. * PI * 1.2 * t).sin()
            + 0.05 * (2. * PI * 50. * t).sin()
            + 0.02 * noise;
        (level * self.full_code).clamp(0., self.full_code) as u16
    }
}

impl AcquisitionDriver for SimulatedAdc {
    type Error = SimError;

    fn start(&mut self) -> Result<(), SimError> {
        self.started = true;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SimError> {
        if !self.started {
            return Err(SimError::NotStarted);
        }
        let size = self.format.result_bytes();
        let mut len = 0;
        for result in buf.chunks_exact_mut(size) {
            let code = self.convert();
            match self.format {
                ResultFormat::Type1 => result.copy_from_slice(
                    &(((self.channel as u16) << 12) | code).to_le_bytes(),
                ),
                ResultFormat::Type2 => result.copy_from_slice(
                    &(((self.channel as u32) << 13) | code as u32).to_le_bytes(),
                ),
            }
            len += size;
        }
        Ok(len)
    }
}
