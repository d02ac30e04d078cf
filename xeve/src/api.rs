//! Boundary with the native engine.
//!
//! The engine is consumed through [`XeveApi`]. Every native resource is
//! represented by an opaque id issued by the implementation; ids are never
//! dereferenced on this side and are not exposed through the public
//! parameter/encoder types.

use crate::image::ImageDescriptor;
use crate::status::ReturnCode;
use crate::types::{GopType, Preset, RateControl, Tune};

macro_rules! native_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            pub fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub fn raw(&self) -> u64 {
                self.0
            }
        }
    };
}

native_id!(
    /// Native parameter set (`XEVE_PARAM`).
    ParamId
);
native_id!(
    /// Native encoder instance (`XEVE`).
    EncoderId
);
native_id!(
    /// Native bitstream output buffer (`XEVE_BITB`).
    BitstreamBufferId
);
native_id!(
    /// Transient native image descriptor (`XEVE_IMGB`).
    ImageId
);

/// Metadata of one pull from the engine. The payload itself is written into
/// the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullStat {
    pub status: ReturnCode,
    pub nalu_type: u8,
    pub slice_type: i8,
}

impl PullStat {
    pub fn status(status: ReturnCode) -> Self {
        Self {
            status,
            nalu_type: 0,
            slice_type: -1,
        }
    }
}

/// Capabilities of the native baseline encoder.
///
/// Implementations must tolerate calls from several threads; the binding
/// serializes calls that target the same encoder id.
pub trait XeveApi: Send + Sync {
    /// Allocate a parameter set initialised with baseline defaults and a
    /// closed GOP. `None` on allocation failure.
    fn default_param(&self) -> Option<ParamId>;

    fn set_preset_tune(&self, param: ParamId, preset: Preset, tune: Tune) -> ReturnCode;

    fn set_input_size(&self, param: ParamId, width: u32, height: u32) -> ReturnCode;

    fn set_framerate(&self, param: ParamId, fps: u32, keyint: u32) -> ReturnCode;

    fn set_rate_control(&self, param: ParamId, rc: RateControl) -> ReturnCode;

    /// Bitrate in kbps.
    fn set_bitrate(&self, param: ParamId, kbps: u32) -> ReturnCode;

    fn set_gop(&self, param: ParamId, gop: GopType) -> ReturnCode;

    /// Zero disables B slices altogether.
    fn set_bframes(&self, param: ParamId, count: u32) -> ReturnCode;

    fn set_use_annexb(&self, param: ParamId, enable: bool) -> ReturnCode;

    /// Human readable dump of the native parameter set.
    fn describe_param(&self, param: ParamId) -> String;

    fn release_param(&self, param: ParamId);

    fn create_bitstream_buffer(&self, size: usize) -> Option<BitstreamBufferId>;

    fn release_bitstream_buffer(&self, bitb: BitstreamBufferId);

    /// Create an encoder from a copy of `param`.
    fn create_encoder(&self, param: ParamId, max_bitstream_buffer_size: usize)
        -> Option<EncoderId>;

    fn release_encoder(&self, encoder: EncoderId);

    fn create_image(&self, image: &ImageDescriptor<'_>) -> Option<ImageId>;

    fn release_image(&self, image: ImageId);

    fn push(&self, encoder: EncoderId, image: ImageId) -> ReturnCode;

    /// Signal end of stream so buffered pictures get emitted by later pulls.
    fn bump(&self, encoder: EncoderId) -> ReturnCode;

    /// Retrieve the next coded unit. On `Ok` with [`ReturnCode::Ok`] the
    /// bytes have been appended to `out`; informational statuses leave `out`
    /// untouched. `Err` is returned when the engine produced no result at
    /// all.
    fn pull(
        &self,
        encoder: EncoderId,
        bitb: BitstreamBufferId,
        out: &mut Vec<u8>,
    ) -> Result<PullStat, ReturnCode>;
}
