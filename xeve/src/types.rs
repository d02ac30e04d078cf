//! Enumerations shared with the native engine and their numeric values.

use serde::{Deserialize, Serialize};

/// NAL unit type as reported by the engine or derived from a NAL header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NalUnitType {
    NonIdr,
    Idr,
    Sps,
    Pps,
    Aps,
    FilterData,
    Sei,
    /// Any other value, kept as is.
    Unknown(u8),
}

impl NalUnitType {
    pub fn value(&self) -> u8 {
        match self {
            NalUnitType::NonIdr => 0,
            NalUnitType::Idr => 1,
            NalUnitType::Sps => 24,
            NalUnitType::Pps => 25,
            NalUnitType::Aps => 26,
            NalUnitType::FilterData => 27,
            NalUnitType::Sei => 28,
            NalUnitType::Unknown(v) => *v,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NalUnitType::NonIdr => "NonIDR",
            NalUnitType::Idr => "IDR",
            NalUnitType::Sps => "SPS",
            NalUnitType::Pps => "PPS",
            NalUnitType::Aps => "APS",
            NalUnitType::FilterData => "FD",
            NalUnitType::Sei => "SEI",
            NalUnitType::Unknown(_) => "Unknown",
        }
    }

    /// Parameter sets and SEI, i.e. everything that is not picture data.
    pub fn is_parameter_set(&self) -> bool {
        matches!(
            self,
            NalUnitType::Sps | NalUnitType::Pps | NalUnitType::Aps | NalUnitType::Sei
        )
    }
}

impl From<u8> for NalUnitType {
    fn from(value: u8) -> Self {
        match value {
            0 => NalUnitType::NonIdr,
            1 => NalUnitType::Idr,
            24 => NalUnitType::Sps,
            25 => NalUnitType::Pps,
            26 => NalUnitType::Aps,
            27 => NalUnitType::FilterData,
            28 => NalUnitType::Sei,
            v => NalUnitType::Unknown(v),
        }
    }
}

impl std::fmt::Display for NalUnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Slice type of a coded picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceType {
    B,
    P,
    I,
    Unknown(i8),
}

impl SliceType {
    pub fn value(&self) -> i8 {
        match self {
            SliceType::B => 0,
            SliceType::P => 1,
            SliceType::I => 2,
            SliceType::Unknown(v) => *v,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SliceType::B => "B",
            SliceType::P => "P",
            SliceType::I => "I",
            SliceType::Unknown(_) => "Unknown",
        }
    }
}

impl From<i8> for SliceType {
    fn from(value: i8) -> Self {
        match value {
            0 => SliceType::B,
            1 => SliceType::P,
            2 => SliceType::I,
            v => SliceType::Unknown(v),
        }
    }
}

impl Default for SliceType {
    fn default() -> Self {
        SliceType::Unknown(-1)
    }
}

impl std::fmt::Display for SliceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Chroma layout of an input picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorFormat {
    Unknown,
    /// Luma only.
    YCbCr400,
    #[default]
    YCbCr420,
    /// 4:2:2 with narrow chroma.
    YCbCr422,
    YCbCr444,
    /// 4:2:2 with wide chroma.
    YCbCr422Wide,
}

impl ColorFormat {
    pub fn value(&self) -> u8 {
        match self {
            ColorFormat::Unknown => 0,
            ColorFormat::YCbCr400 => 10,
            ColorFormat::YCbCr420 => 11,
            ColorFormat::YCbCr422 => 12,
            ColorFormat::YCbCr444 => 13,
            ColorFormat::YCbCr422Wide => 18,
        }
    }

    /// Chroma plane dimensions for a `width` x `height` luma plane and the
    /// number of planes the engine reads.
    ///
    /// Formats without a dedicated layout are treated as 4:2:0.
    pub fn chroma_geometry(&self, width: u32, height: u32) -> (u32, u32, usize) {
        match self {
            ColorFormat::YCbCr400 => (width, height, 1),
            ColorFormat::YCbCr422 => (width / 2, height, 3),
            ColorFormat::YCbCr444 => (width, height, 3),
            ColorFormat::YCbCr420 | ColorFormat::YCbCr422Wide | ColorFormat::Unknown => {
                (width / 2, height / 2, 3)
            }
        }
    }
}

/// Sample bit depth of an input picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitDepth {
    #[default]
    Eight,
    Ten,
}

impl BitDepth {
    pub fn value(&self) -> u8 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Ten => 10,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        match self {
            BitDepth::Eight => 1,
            BitDepth::Ten => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Default,
    Fast,
    Medium,
    Slow,
    Placebo,
}

impl Preset {
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tune {
    #[default]
    None,
    ZeroLatency,
    Psnr,
}

impl Tune {
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

/// Rate control strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateControl {
    /// Constant QP.
    #[default]
    Cqp,
    /// Average bitrate.
    Abr,
    /// Constant rate factor.
    Crf,
}

impl RateControl {
    pub fn value(&self) -> i32 {
        *self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GopType {
    Open,
    #[default]
    Closed,
}

impl GopType {
    pub fn value(&self) -> i32 {
        *self as i32
    }
}

macro_rules! display_names {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

display_names!(ColorFormat {
    Unknown => "unknown",
    YCbCr400 => "ycbcr400",
    YCbCr420 => "ycbcr420",
    YCbCr422 => "ycbcr422",
    YCbCr444 => "ycbcr444",
    YCbCr422Wide => "ycbcr422w",
});

display_names!(BitDepth {
    Eight => "8bit",
    Ten => "10bit",
});

display_names!(Preset {
    Default => "default",
    Fast => "fast",
    Medium => "medium",
    Slow => "slow",
    Placebo => "placebo",
});

display_names!(Tune {
    None => "none",
    ZeroLatency => "zero_latency",
    Psnr => "psnr",
});

display_names!(RateControl {
    Cqp => "cqp",
    Abr => "abr",
    Crf => "crf",
});

display_names!(GopType {
    Open => "open",
    Closed => "closed",
});
