//! ADC acquisition interface
//!
//! # Design
//! The ADC runs in continuous conversion mode. A DMA engine moves conversion
//! results into a ring of frames without CPU involvement and raises the
//! conversion-done interrupt whenever a frame completes. The processing task
//! then copies one frame out through [AcquisitionDriver::read].
//!
//! Each conversion result in a frame is a little-endian word carrying the
//! channel it was taken on and the data code. The layout depends on the
//! controller generation, see [ResultFormat]. The [Decoder] turns a frame
//! into the codes of the selected channel.
use arbitrary_int::{u12, u4};
use bitbybit::bitfield;
use serde::{Deserialize, Serialize};

/// Continuous DMA conversion driver.
pub trait AcquisitionDriver {
    type Error: core::fmt::Debug;

    /// Start continuous conversion.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Copy completed conversion results into `buf`.
    ///
    /// # Note
    /// This never blocks. It returns immediately with whatever is available,
    /// at most `buf.len()` bytes.
    ///
    /// # Returns
    /// The number of bytes written.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// A raw ADC conversion code.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct AdcCode(pub u16);

impl From<AdcCode> for f32 {
    fn from(code: AdcCode) -> f32 {
        code.0 as f32
    }
}

impl AdcCode {
    /// Convert to the voltage at the pin.
    ///
    /// # Args
    /// * `attenuation` - The input attenuation the code was taken with.
    /// * `bit_width` - The conversion resolution.
    pub fn volts(self, attenuation: Attenuation, bit_width: u8) -> f32 {
        let full_code = ((1u32 << bit_width) - 1) as f32;
        self.0 as f32 * attenuation.full_scale() / full_code
    }
}

/// Input attenuation ahead of the converter.
///
/// # Miniconf
/// Any of the variant names enclosed in double quotes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attenuation {
    Db0,
    Db2_5,
    Db6,
    #[default]
    Db11,
}

impl Attenuation {
    /// Approximate full scale input voltage.
    pub const fn full_scale(self) -> f32 {
        match self {
            Self::Db0 => 0.95,
            Self::Db2_5 => 1.25,
            Self::Db6 => 1.75,
            Self::Db11 => 3.1,
        }
    }
}

/// DMA conversion result layout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultFormat {
    /// 16 bit results: data in bits 0-11, channel in bits 12-15.
    #[default]
    Type1,
    /// 32 bit results: data in bits 0-11, channel in bits 13-16, converter
    /// unit in bit 17.
    Type2,
}

impl ResultFormat {
    /// Size of one conversion result.
    pub const fn result_bytes(self) -> usize {
        match self {
            Self::Type1 => 2,
            Self::Type2 => 4,
        }
    }
}

#[bitfield(u16)]
struct Type1Result {
    #[bits(0..=11, r)]
    data: u12,
    #[bits(12..=15, r)]
    channel: u4,
}

#[bitfield(u32)]
struct Type2Result {
    #[bits(0..=11, r)]
    data: u12,
    #[bits(13..=16, r)]
    channel: u4,
    #[bit(17, r)]
    unit: bool,
}

/// Extracts the codes of one channel from DMA frames.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decoder {
    pub format: ResultFormat,
    pub channel: u8,
    /// Significant data bits, at most 12.
    pub bit_width: u8,
}

impl Decoder {
    /// Decode a DMA frame.
    ///
    /// Results of other channels and, for [ResultFormat::Type2], of the
    /// second converter unit are skipped. A trailing partial result is
    /// ignored.
    ///
    /// # Args
    /// * `frame` - Raw frame bytes as read from the driver.
    ///
    /// # Returns
    /// The codes of the selected channel in conversion order.
    pub fn samples(self, frame: &[u8]) -> impl Iterator<Item = AdcCode> + '_ {
        let mask = ((1u32 << self.bit_width.min(12)) - 1) as u16;
        frame
            .chunks_exact(self.format.result_bytes())
            .filter_map(move |result| {
                let (channel, data) = match self.format {
                    ResultFormat::Type1 => {
                        let r = Type1Result::new_with_raw_value(
                            u16::from_le_bytes([result[0], result[1]]),
                        );
                        (r.channel(), r.data())
                    }
                    ResultFormat::Type2 => {
                        let r = Type2Result::new_with_raw_value(
                            u32::from_le_bytes([
                                result[0], result[1], result[2], result[3],
                            ]),
                        );
                        if r.unit() {
                            return None;
                        }
                        (r.channel(), r.data())
                    }
                };
                (channel.value() == self.channel)
                    .then_some(AdcCode(data.value() & mask))
            })
    }
}
