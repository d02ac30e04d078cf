//! Encoder configuration loaded from JSON and `XEVE_*` environment
//! variables.

use crate::param::DEFAULT_MAX_BITSTREAM_BUFFER_SIZE;
use crate::types::{GopType, Preset, RateControl, Tune};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use twelf::{config, Layer};

const ENV_PREFIX: &str = "XEVE_";

#[config]
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct EncoderConfiguration {
    pub preset: Preset,
    #[serde(default)]
    pub tune: Tune,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Key frame interval in frames.
    pub keyint: u32,
    /// kbps
    pub bitrate: u32,
    pub gop: GopType,
    pub rate_control: RateControl,
    #[serde(default)]
    pub bframes: u32,
    #[serde(default)]
    pub use_annexb: bool,
    #[serde(default = "default_max_bitstream_buffer_size")]
    pub max_bitstream_buffer_size: usize,
}

fn default_max_bitstream_buffer_size() -> usize {
    DEFAULT_MAX_BITSTREAM_BUFFER_SIZE
}

impl EncoderConfiguration {
    /// Configuration used by the sample encoder: fast preset, 30 fps with a
    /// key frame every 60 frames, 2 Mbps ABR, closed GOP, no B frames.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            preset: Preset::Fast,
            tune: Tune::None,
            width,
            height,
            fps: 30,
            keyint: 60,
            bitrate: 2000,
            gop: GopType::Closed,
            rate_control: RateControl::Abr,
            bframes: 0,
            use_annexb: false,
            max_bitstream_buffer_size: DEFAULT_MAX_BITSTREAM_BUFFER_SIZE,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("Input size must be positive, got {}x{}", self.width, self.height);
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            bail!(
                "Input size must be even for chroma subsampling, got {}x{}",
                self.width,
                self.height
            );
        }
        if self.fps == 0 {
            bail!("Frame rate must be positive");
        }
        if self.max_bitstream_buffer_size == 0 {
            bail!("Bitstream buffer size must be positive");
        }
        if self.use_annexb {
            log::warn!("Annex-B output enabled, payloads cannot be split into length-prefixed NAL units");
        }
        Ok(())
    }

    /// Load from a JSON file, then apply `XEVE_*` environment overrides.
    pub fn new(path: &str) -> Result<Self> {
        let conf = Self::with_layers(&[
            Layer::Json(path.into()),
            Layer::Env(Some(ENV_PREFIX.to_string())),
        ])
        .with_context(|| format!("Failed to load encoder configuration from {}", path))?;
        conf.validate()?;
        Ok(conf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_asset() -> Result<()> {
        let conf = EncoderConfiguration::new("assets/encoder.json")?;
        assert_eq!(conf.width, 320);
        assert_eq!(conf.height, 240);
        assert_eq!(conf.preset, Preset::Fast);
        assert_eq!(conf.rate_control, RateControl::Abr);
        assert_eq!(conf.gop, GopType::Closed);
        Ok(())
    }

    #[test]
    fn test_with_size_is_valid() -> Result<()> {
        let conf = EncoderConfiguration::with_size(320, 240);
        conf.validate()?;
        assert_eq!(conf.max_bitstream_buffer_size, DEFAULT_MAX_BITSTREAM_BUFFER_SIZE);
        Ok(())
    }

    #[test]
    fn test_validate_rejects_odd_size() {
        let conf = EncoderConfiguration::with_size(321, 240);
        assert!(conf.validate().is_err());
        let conf = EncoderConfiguration::with_size(0, 240);
        assert!(conf.validate().is_err());
    }

    #[test]
    fn test_load_rejects_invalid_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        let mut conf = serde_json::to_value(EncoderConfiguration::with_size(640, 480))?;
        conf["fps"] = serde_json::json!(0);
        write!(file, "{}", conf)?;
        let path = file.path().to_string_lossy().to_string();
        assert!(EncoderConfiguration::new(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_optional_fields_use_defaults() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        let mut conf = serde_json::to_value(EncoderConfiguration::with_size(640, 480))?;
        if let Some(map) = conf.as_object_mut() {
            for key in ["tune", "bframes", "use_annexb", "max_bitstream_buffer_size"] {
                map.remove(key);
            }
        }
        write!(file, "{}", conf)?;
        let path = file.path().to_string_lossy().to_string();
        let loaded = EncoderConfiguration::new(&path)?;
        assert_eq!(loaded, EncoderConfiguration::with_size(640, 480));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(EncoderConfiguration::new("assets/does_not_exist.json").is_err());
    }
}
