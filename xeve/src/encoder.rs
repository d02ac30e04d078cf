//! Baseline EVC encoder handle.
//!
//! # Lifecycle
//!
//! 1. Create a parameter set with [`BaselineParam::create_default`] or
//!    [`BaselineParam::configure`].
//! 2. Create the encoder with [`BaselineEncoder::create`]. The encoder
//!    shares the parameter set and closes it when it is closed itself.
//! 3. Submit pictures with [`encode`](BaselineEncoder::encode). Each call
//!    returns zero or one coded unit.
//! 4. Call [`flush`](BaselineEncoder::flush) once to signal end of stream,
//!    then [`pull_next`](BaselineEncoder::pull_next) until a unit without
//!    data is returned ([`finish`](BaselineEncoder::finish) does both).
//! 5. [`close`](BaselineEncoder::close) (also happens automatically on drop).

use crate::api::{BitstreamBufferId, EncoderId, XeveApi};
use crate::error::XeveError;
use crate::image::{ImageDescriptor, ImageGuard, Picture};
use crate::param::BaselineParam;
use crate::pool::{default_pool, BufferPool};
use crate::status::ReturnCode;
use crate::types::{NalUnitType, SliceType};
use crate::unit::EncodedUnit;
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Owner of a native encoder instance and its bitstream buffer.
///
/// The handle is `Send + Sync`. Native calls against it are serialized
/// internally; `close` may race freely with any other call and with other
/// `close` calls.
pub struct BaselineEncoder {
    api: Arc<dyn XeveApi>,
    param: Arc<BaselineParam>,
    id: EncoderId,
    bitb: BitstreamBufferId,
    width: u32,
    height: u32,
    pool: Arc<BufferPool>,
    /// Size of the last payload, used to pick the pool class of the next.
    last_len: AtomicUsize,
    /// Held for the duration of every native call on `id`.
    call_lock: Mutex<()>,
    closed: AtomicBool,
    bumped: AtomicBool,
}

impl std::fmt::Debug for BaselineEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaselineEncoder")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("closed", &self.is_closed())
            .field("flushed", &self.is_flushed())
            .finish()
    }
}

impl BaselineEncoder {
    /// Create an encoder from `param`, drawing payload buffers from the
    /// process-wide pool.
    ///
    /// On failure nothing is left allocated and `param` stays valid and
    /// owned by the caller.
    pub fn create(param: &Arc<BaselineParam>) -> Result<Self, XeveError> {
        Self::create_with_pool(param, default_pool())
    }

    pub fn create_with_pool(
        param: &Arc<BaselineParam>,
        pool: Arc<BufferPool>,
    ) -> Result<Self, XeveError> {
        let api = param.api().clone();
        let (id, bitb, width, height) = param.with_native(|param_id, settings| {
            let max_bs = settings.max_bitstream_buffer_size;
            let bitb = api.create_bitstream_buffer(max_bs).ok_or_else(|| {
                warn!("Native bitstream buffer allocation failed ({} bytes)", max_bs);
                XeveError::AllocationFailed("bitstream buffer")
            })?;
            let id = match api.create_encoder(param_id, max_bs) {
                Some(id) => id,
                None => {
                    api.release_bitstream_buffer(bitb);
                    warn!("Native encoder allocation failed, bitstream buffer released");
                    return Err(XeveError::AllocationFailed("encoder"));
                }
            };
            Ok((id, bitb, settings.width, settings.height))
        })?;

        debug!(
            "Encoder {:?} created by xeve {}: {}x{}, bitstream buffer {:?}",
            id,
            crate::version(),
            width,
            height,
            bitb
        );

        Ok(Self {
            api,
            param: param.clone(),
            id,
            bitb,
            width,
            height,
            pool,
            last_len: AtomicUsize::new(0),
            call_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            bumped: AtomicBool::new(false),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn param(&self) -> &Arc<BaselineParam> {
        &self.param
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Whether [`flush`](Self::flush) has been called.
    pub fn is_flushed(&self) -> bool {
        self.bumped.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), XeveError> {
        if self.is_closed() {
            return Err(XeveError::HandleClosed("encoder"));
        }
        Ok(())
    }

    /// Push one picture and pull the next coded unit.
    ///
    /// An empty unit with an informational status means the engine is still
    /// buffering. [`XeveError::PushRejected`] means the picture was not
    /// submitted and may be pushed again.
    pub fn encode(&self, picture: &Picture<'_>) -> Result<EncodedUnit, XeveError> {
        let _call = self.call_lock.lock();
        self.ensure_open()?;
        if self.is_flushed() {
            return Err(XeveError::Draining);
        }

        let descriptor = ImageDescriptor::new(picture, self.width, self.height)?;
        let image = ImageGuard::create(self.api.as_ref(), &descriptor)?;
        let rc = self.api.push(self.id, image.id());
        if rc.failed() {
            debug!("Encoder {:?} rejected picture: {}", self.id, rc);
            return Err(XeveError::PushRejected(rc));
        }
        self.pull_locked()
    }

    /// Signal end of stream and pull the first drained unit.
    ///
    /// Allowed once per encoder; further calls fail with
    /// [`XeveError::AlreadyFlushed`] without reaching the engine.
    pub fn flush(&self) -> Result<EncodedUnit, XeveError> {
        self.ensure_open()?;
        if self
            .bumped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(XeveError::AlreadyFlushed);
        }

        let _call = self.call_lock.lock();
        self.ensure_open()?;
        let rc = self.api.bump(self.id);
        if rc.failed() {
            return Err(XeveError::native("bump", rc));
        }
        debug!("Encoder {:?} entered drain mode", self.id);
        self.pull_locked()
    }

    /// Pull the next coded unit without pushing a picture.
    ///
    /// After [`flush`](Self::flush) this drains buffered pictures one per
    /// call; a unit with [`ReturnCode::NoMoreFrames`] ends the stream.
    pub fn pull_next(&self) -> Result<EncodedUnit, XeveError> {
        let _call = self.call_lock.lock();
        self.ensure_open()?;
        self.pull_locked()
    }

    /// Flush and drain every buffered picture. Units without data are not
    /// returned.
    ///
    /// If a pull fails partway through, the units drained so far go back to
    /// the pool and only the error is returned. Use [`flush`](Self::flush)
    /// and [`pull_next`](Self::pull_next) directly to keep partial output.
    pub fn finish(&self) -> Result<Vec<EncodedUnit>, XeveError> {
        let mut units = Vec::new();
        let mut unit = self.flush()?;
        while unit.has_data() {
            units.push(unit);
            unit = self.pull_next()?;
        }
        debug!("Encoder {:?} drained {} units", self.id, units.len());
        Ok(units)
    }

    fn pull_locked(&self) -> Result<EncodedUnit, XeveError> {
        let mut buf = self.pool.get(self.last_len.load(Ordering::Relaxed));
        let stat = match self.api.pull(self.id, self.bitb, &mut buf) {
            Ok(stat) => stat,
            Err(rc) => {
                self.pool.put(buf);
                return Err(XeveError::native("encode", rc));
            }
        };

        if stat.status.failed() {
            self.pool.put(buf);
            return Err(XeveError::native("encode", stat.status));
        }
        if stat.status != ReturnCode::Ok || buf.is_empty() {
            self.pool.put(buf);
            let status = if stat.status == ReturnCode::Ok {
                ReturnCode::OutNotAvailable
            } else {
                stat.status
            };
            return Ok(EncodedUnit::empty(status));
        }

        self.last_len.store(buf.len(), Ordering::Relaxed);
        Ok(EncodedUnit::pooled(
            NalUnitType::from(stat.nalu_type),
            SliceType::from(stat.slice_type),
            buf,
            self.pool.clone(),
        ))
    }

    /// Release the encoder, its bitstream buffer and the shared parameter
    /// set. Exactly one of any number of concurrent or repeated calls does
    /// the native work; the rest return immediately.
    pub fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let _call = self.call_lock.lock();
        // a close after flush does not signal end of stream again
        self.bumped.store(true, Ordering::Release);
        self.api.release_encoder(self.id);
        self.api.release_bitstream_buffer(self.bitb);
        self.param.close();
        debug!("Encoder {:?} released", self.id);
    }
}

impl Drop for BaselineEncoder {
    fn drop(&mut self) {
        self.close();
    }
}
