//! Native parameter set ownership.

use crate::api::{ParamId, XeveApi};
use crate::configuration::EncoderConfiguration;
use crate::error::XeveError;
use crate::status::ReturnCode;
use crate::types::{GopType, Preset, RateControl, Tune};
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Bitstream output buffer size used unless configured otherwise.
pub const DEFAULT_MAX_BITSTREAM_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Rust-side mirror of the values written into the native parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSettings {
    pub preset: Preset,
    pub tune: Tune,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub keyint: u32,
    pub rate_control: RateControl,
    /// kbps
    pub bitrate: u32,
    pub gop: GopType,
    pub bframes: u32,
    pub use_annexb: bool,
    pub max_bitstream_buffer_size: usize,
}

impl Default for ParamSettings {
    fn default() -> Self {
        Self {
            preset: Preset::Default,
            tune: Tune::None,
            width: 0,
            height: 0,
            fps: 0,
            keyint: 0,
            rate_control: RateControl::Cqp,
            bitrate: 0,
            gop: GopType::Closed,
            bframes: 0,
            use_annexb: false,
            max_bitstream_buffer_size: DEFAULT_MAX_BITSTREAM_BUFFER_SIZE,
        }
    }
}

/// Owner of a native baseline parameter set.
///
/// The set is released exactly once: by the first [`close`](Self::close),
/// by the encoder that shares it being closed, or on drop. Any use after
/// that fails with [`XeveError::HandleClosed`].
pub struct BaselineParam {
    api: Arc<dyn XeveApi>,
    id: ParamId,
    settings: Mutex<ParamSettings>,
    closed: AtomicBool,
}

impl std::fmt::Debug for BaselineParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaselineParam")
            .field("settings", &*self.settings.lock())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl BaselineParam {
    /// Allocate a parameter set with baseline defaults.
    pub fn create_default(api: Arc<dyn XeveApi>) -> Result<Arc<Self>, XeveError> {
        let id = api.default_param().ok_or_else(|| {
            warn!("Native default parameter set allocation failed");
            XeveError::AllocationFailed("parameter set")
        })?;
        debug!("Parameter set {:?} created", id);
        Ok(Arc::new(Self {
            api,
            id,
            settings: Mutex::new(ParamSettings::default()),
            closed: AtomicBool::new(false),
        }))
    }

    /// Allocate a parameter set and apply a whole configuration to it.
    ///
    /// The set is released again if any value is rejected.
    pub fn configure(
        api: Arc<dyn XeveApi>,
        conf: &EncoderConfiguration,
    ) -> Result<Arc<Self>, XeveError> {
        let param = Self::create_default(api)?;
        param.set_preset_tune(conf.preset, conf.tune)?;
        param.set_input_size(conf.width, conf.height)?;
        param.set_framerate(conf.fps, conf.keyint)?;
        param.set_bitrate(conf.bitrate)?;
        param.set_gop(conf.gop)?;
        param.set_rate_control(conf.rate_control)?;
        param.set_bframes(conf.bframes)?;
        param.set_use_annexb(conf.use_annexb)?;
        param.set_max_bitstream_buffer_size(conf.max_bitstream_buffer_size)?;
        Ok(param)
    }

    fn apply<F, U>(&self, op: &'static str, call: F, update: U) -> Result<(), XeveError>
    where
        F: FnOnce(&dyn XeveApi, ParamId) -> ReturnCode,
        U: FnOnce(&mut ParamSettings),
    {
        let mut settings = self.settings.lock();
        if self.is_closed() {
            return Err(XeveError::HandleClosed("parameter set"));
        }
        let rc = call(self.api.as_ref(), self.id);
        if rc.failed() {
            return Err(XeveError::native(op, rc));
        }
        update(&mut settings);
        Ok(())
    }

    pub fn set_preset_tune(&self, preset: Preset, tune: Tune) -> Result<(), XeveError> {
        self.apply(
            "set_preset_tune",
            |api, id| api.set_preset_tune(id, preset, tune),
            |s| {
                s.preset = preset;
                s.tune = tune;
            },
        )
    }

    pub fn set_input_size(&self, width: u32, height: u32) -> Result<(), XeveError> {
        self.apply(
            "set_input_size",
            |api, id| api.set_input_size(id, width, height),
            |s| {
                s.width = width;
                s.height = height;
            },
        )
    }

    pub fn set_framerate(&self, fps: u32, keyint: u32) -> Result<(), XeveError> {
        self.apply(
            "set_framerate",
            |api, id| api.set_framerate(id, fps, keyint),
            |s| {
                s.fps = fps;
                s.keyint = keyint;
            },
        )
    }

    pub fn set_rate_control(&self, rate_control: RateControl) -> Result<(), XeveError> {
        self.apply(
            "set_rate_control",
            |api, id| api.set_rate_control(id, rate_control),
            |s| s.rate_control = rate_control,
        )
    }

    /// Target bitrate in kbps.
    pub fn set_bitrate(&self, kbps: u32) -> Result<(), XeveError> {
        self.apply(
            "set_bitrate",
            |api, id| api.set_bitrate(id, kbps),
            |s| s.bitrate = kbps,
        )
    }

    pub fn set_gop(&self, gop: GopType) -> Result<(), XeveError> {
        self.apply("set_gop", |api, id| api.set_gop(id, gop), |s| s.gop = gop)
    }

    /// Number of B frames; zero switches the encoder to P slices only.
    pub fn set_bframes(&self, count: u32) -> Result<(), XeveError> {
        self.apply(
            "set_bframes",
            |api, id| api.set_bframes(id, count),
            |s| s.bframes = count,
        )
    }

    /// Emit start codes instead of length prefixes. Payloads produced with
    /// Annex-B enabled cannot be split with [`crate::nal::split_nal`].
    pub fn set_use_annexb(&self, enable: bool) -> Result<(), XeveError> {
        self.apply(
            "set_use_annexb",
            |api, id| api.set_use_annexb(id, enable),
            |s| s.use_annexb = enable,
        )
    }

    pub fn set_max_bitstream_buffer_size(&self, size: usize) -> Result<(), XeveError> {
        self.apply(
            "set_max_bitstream_buffer_size",
            |_, _| {
                if size == 0 {
                    ReturnCode::InvalidArgument
                } else {
                    ReturnCode::Ok
                }
            },
            |s| s.max_bitstream_buffer_size = size,
        )
    }

    pub fn settings(&self) -> ParamSettings {
        self.settings.lock().clone()
    }

    /// Engine description of the native parameter set.
    pub fn debug_dump(&self) -> Result<String, XeveError> {
        let _settings = self.settings.lock();
        if self.is_closed() {
            return Err(XeveError::HandleClosed("parameter set"));
        }
        Ok(self.api.describe_param(self.id))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Release the native parameter set. Repeated and concurrent calls are
    /// no-ops after the first.
    pub fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            // wait for an in-flight native call on this set
            let _settings = self.settings.lock();
            self.api.release_param(self.id);
            debug!("Parameter set {:?} released", self.id);
        }
    }

    pub(crate) fn api(&self) -> &Arc<dyn XeveApi> {
        &self.api
    }

    /// Run `f` with the native id while the set is guaranteed to stay alive.
    pub(crate) fn with_native<R>(
        &self,
        f: impl FnOnce(ParamId, &ParamSettings) -> Result<R, XeveError>,
    ) -> Result<R, XeveError> {
        let settings = self.settings.lock();
        if self.is_closed() {
            return Err(XeveError::HandleClosed("parameter set"));
        }
        f(self.id, &settings)
    }
}

impl Drop for BaselineParam {
    fn drop(&mut self) {
        self.close();
    }
}
