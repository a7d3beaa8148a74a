//! Run-time settings
//!
//! # Design
//! All settings form one [miniconf] tree. Individual values are addressed by
//! their path and set from JSON, e.g. `/processing/decimation` = `200` or
//! `/net/endpoint` = `"192.168.0.10:5000"`.
//!
//! Settings are applied once at startup. The filter cascade topology is fixed,
//! only the stage coefficients are configurable.
use dsp::{Coefficients, Decimation, FilterChain, LOWPASS_40HZ_AT_20KHZ, STAGES};
use heapless::String;
use miniconf::Tree;
use stream::Target;

use crate::{
    hardware::adc::{Attenuation, Decoder, ResultFormat},
    processing::{Config, MAX_FRAME_BYTES},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Sample frequency {0} Hz out of range")]
    SampleFrequency(u32),
    #[error("Bit width {0} out of range")]
    BitWidth(u8),
    #[error("Invalid channel {0}")]
    Channel(u8),
    #[error("Decimation {0} out of range")]
    Decimation(u32),
    #[error("A frame of {bytes} bytes does not hold exactly {decimation} results")]
    FrameSize { bytes: u32, decimation: u32 },
    #[error("Filter stage {0} is unstable")]
    Unstable(usize),
}

#[derive(Clone, Debug, Tree)]
pub struct NetSettings {
    /// Wireless network name.
    #[tree(with=miniconf::leaf)]
    pub ssid: String<32>,

    /// Wireless network passphrase.
    #[tree(with=miniconf::leaf)]
    pub passphrase: String<64>,

    /// Payload endpoint, see [Target#miniconf].
    #[tree(with=miniconf::leaf)]
    pub endpoint: Target,

    /// Request path at the endpoint.
    #[tree(with=miniconf::leaf)]
    pub path: String<64>,

    /// Request timeout in milliseconds.
    pub timeout_ms: u32,
}

impl Default for NetSettings {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            passphrase: String::new(),
            endpoint: Target::default(),
            path: String::try_from("/data").unwrap_or_default(),
            timeout_ms: 5000,
        }
    }
}

#[derive(Clone, Debug, Tree)]
pub struct AdcSettings {
    /// Conversion rate in Hz.
    pub sample_frequency: u32,

    /// Input attenuation.
    ///
    /// # Value
    /// Any of the variants of [Attenuation] enclosed in double quotes.
    #[tree(with=miniconf::leaf)]
    pub attenuation: Attenuation,

    /// Input channel.
    pub channel: u8,

    /// Conversion resolution in bits (9-12).
    pub bit_width: u8,

    /// DMA result layout.
    #[tree(with=miniconf::leaf)]
    pub format: ResultFormat,
}

impl Default for AdcSettings {
    fn default() -> Self {
        Self {
            sample_frequency: 20_000,
            attenuation: Attenuation::Db11,
            channel: 0,
            bit_width: 12,
            format: ResultFormat::Type1,
        }
    }
}

#[derive(Clone, Debug, Tree)]
pub struct ProcessingSettings {
    /// Bytes per DMA frame. Must hold exactly `decimation` results.
    pub frame_bytes: u32,

    /// Conversions per output sample.
    pub decimation: u32,

    /// How a filtered batch is reduced to one output sample.
    ///
    /// # Value
    /// `"Last"` or `"Mean"`
    #[tree(with=miniconf::leaf)]
    pub policy: Decimation,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            frame_bytes: 400,
            decimation: 200,
            policy: Decimation::Last,
        }
    }
}

#[derive(Clone, Debug, Tree)]
pub struct Settings {
    pub net: NetSettings,

    pub adc: AdcSettings,

    pub processing: ProcessingSettings,

    /// Filter cascade stage coefficients, in cascade order.
    ///
    /// # Value
    /// See [Coefficients#miniconf]
    pub filter: [Coefficients; STAGES],

    /// Telemetry output period in seconds.
    pub telemetry_period: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            net: NetSettings::default(),
            adc: AdcSettings::default(),
            processing: ProcessingSettings::default(),
            filter: LOWPASS_40HZ_AT_20KHZ,
            telemetry_period: 10,
        }
    }
}

impl Settings {
    /// Check the settings for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let adc = &self.adc;
        if !(611..=83_333).contains(&adc.sample_frequency) {
            return Err(ConfigError::SampleFrequency(adc.sample_frequency));
        }
        if !(9..=12).contains(&adc.bit_width) {
            return Err(ConfigError::BitWidth(adc.bit_width));
        }
        if adc.channel > 9 {
            return Err(ConfigError::Channel(adc.channel));
        }

        let p = &self.processing;
        let result_bytes = adc.format.result_bytes() as u32;
        if p.decimation == 0 || p.decimation > MAX_FRAME_BYTES as u32 / result_bytes {
            return Err(ConfigError::Decimation(p.decimation));
        }
        if p.frame_bytes != p.decimation * result_bytes {
            return Err(ConfigError::FrameSize {
                bytes: p.frame_bytes,
                decimation: p.decimation,
            });
        }

        if let Some(i) = self.filter.iter().position(|c| !c.is_stable()) {
            return Err(ConfigError::Unstable(i));
        }
        Ok(())
    }

    /// A filter cascade with the configured coefficients and zero state.
    pub fn filter_chain(&self) -> FilterChain {
        FilterChain::new(self.filter)
    }

    pub fn processing_config(&self) -> Config {
        Config {
            decoder: Decoder {
                format: self.adc.format,
                channel: self.adc.channel,
                bit_width: self.adc.bit_width,
            },
            decimation: self.processing.policy,
            frame_bytes: self.processing.frame_bytes as usize,
        }
    }

    /// Output sample rate of the pipeline in Hz.
    pub fn output_rate(&self) -> f32 {
        self.adc.sample_frequency as f32 / self.processing.decimation.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miniconf::json_core;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.validate(), Ok(()));
        assert_eq!(s.output_rate(), 100.);
        assert_eq!(s.net.path, "/data");
        assert!(!s.net.endpoint.is_configured());
        assert_eq!(s.filter_chain(), FilterChain::default());
        let c = s.processing_config();
        assert_eq!(c.frame_bytes, 400);
        assert_eq!(c.decoder.bit_width, 12);
    }

    #[test]
    fn set_by_path() {
        let mut s = Settings::default();
        json_core::set(&mut s, "/processing/decimation", b"100").unwrap();
        json_core::set(&mut s, "/processing/frame_bytes", b"200").unwrap();
        json_core::set(&mut s, "/processing/policy", br#""Mean""#).unwrap();
        json_core::set(&mut s, "/net/endpoint", br#""192.168.1.5:5000""#).unwrap();
        json_core::set(&mut s, "/adc/attenuation", br#""Db6""#).unwrap();
        json_core::set(&mut s, "/filter/0/a2", b"0.98").unwrap();
        assert_eq!(s.processing.decimation, 100);
        assert_eq!(s.processing.policy, Decimation::Mean);
        assert!(s.net.endpoint.is_configured());
        assert_eq!(s.adc.attenuation, Attenuation::Db6);
        assert_eq!(s.filter[0].a2, 0.98);
        assert_eq!(s.validate(), Ok(()));

        assert!(json_core::set(&mut s, "/processing/bogus", b"1").is_err());
        assert!(json_core::set(&mut s, "/adc/channel", b"\"x\"").is_err());
    }

    #[test]
    fn invalid() {
        let mut s = Settings::default();
        s.adc.sample_frequency = 100;
        assert_eq!(s.validate(), Err(ConfigError::SampleFrequency(100)));

        let mut s = Settings::default();
        s.adc.bit_width = 13;
        assert_eq!(s.validate(), Err(ConfigError::BitWidth(13)));

        let mut s = Settings::default();
        s.adc.channel = 10;
        assert_eq!(s.validate(), Err(ConfigError::Channel(10)));

        let mut s = Settings::default();
        s.processing.decimation = 0;
        assert_eq!(s.validate(), Err(ConfigError::Decimation(0)));

        let mut s = Settings::default();
        s.adc.format = ResultFormat::Type2;
        assert_eq!(
            s.validate(),
            Err(ConfigError::FrameSize {
                bytes: 400,
                decimation: 200
            })
        );

        let mut s = Settings::default();
        s.filter[3] = Coefficients::UNITY;
        assert_eq!(s.validate(), Err(ConfigError::Unstable(3)));
    }
}
