//! Input pictures and the transient native image descriptor.

use crate::api::{ImageId, XeveApi};
use crate::error::XeveError;
use crate::types::{BitDepth, ColorFormat};
use log::warn;

/// Borrowed planar YCbCr picture submitted to an encoder.
#[derive(Debug, Clone, Copy)]
pub struct Picture<'a> {
    pub y: &'a [u8],
    pub cb: &'a [u8],
    pub cr: &'a [u8],
    /// Row strides in bytes for Y, Cb and Cr.
    pub strides: [usize; 3],
    pub color_format: ColorFormat,
    pub bit_depth: BitDepth,
}

impl<'a> Picture<'a> {
    /// 8-bit 4:2:0 picture. Use the builder methods for other layouts.
    pub fn new(y: &'a [u8], cb: &'a [u8], cr: &'a [u8], strides: [usize; 3]) -> Self {
        Self {
            y,
            cb,
            cr,
            strides,
            color_format: ColorFormat::YCbCr420,
            bit_depth: BitDepth::Eight,
        }
    }

    pub fn color_format(mut self, color_format: ColorFormat) -> Self {
        self.color_format = color_format;
        self
    }

    pub fn bit_depth(mut self, bit_depth: BitDepth) -> Self {
        self.bit_depth = bit_depth;
        self
    }
}

/// Everything the engine needs to build an `XEVE_IMGB` for one push.
#[derive(Debug, Clone, Copy)]
pub struct ImageDescriptor<'a> {
    pub planes: [&'a [u8]; 3],
    pub strides: [usize; 3],
    pub widths: [u32; 3],
    pub heights: [u32; 3],
    /// Number of planes the engine reads (1 for 4:0:0, else 3).
    pub plane_count: usize,
    pub color_format: ColorFormat,
    pub bit_depth: BitDepth,
}

impl<'a> ImageDescriptor<'a> {
    /// Validate `picture` against a `width` x `height` encoder and derive
    /// the per-plane geometry.
    pub fn new(picture: &Picture<'a>, width: u32, height: u32) -> Result<Self, XeveError> {
        let (cw, ch, plane_count) = picture.color_format.chroma_geometry(width, height);
        let widths = [width, cw, cw];
        let heights = [height, ch, ch];
        let planes = [picture.y, picture.cb, picture.cr];
        let bytes_per_sample = picture.bit_depth.bytes_per_sample();

        for (idx, name) in ["Y", "Cb", "Cr"].iter().enumerate().take(plane_count) {
            let plane = planes[idx];
            let stride = picture.strides[idx];
            let row_bytes = (widths[idx] as usize)
                .checked_mul(bytes_per_sample)
                .ok_or_else(|| {
                    XeveError::InvalidPicture(format!("{} row size overflows", name))
                })?;
            if plane.is_empty() {
                return Err(XeveError::InvalidPicture(format!("{} plane is empty", name)));
            }
            if stride < row_bytes {
                return Err(XeveError::InvalidPicture(format!(
                    "{} stride {} is smaller than a row of {} bytes",
                    name, stride, row_bytes
                )));
            }
            let required = stride.checked_mul(heights[idx] as usize).ok_or_else(|| {
                XeveError::InvalidPicture(format!(
                    "{} stride {} times {} rows overflows",
                    name, stride, heights[idx]
                ))
            })?;
            if plane.len() < required {
                return Err(XeveError::InvalidPicture(format!(
                    "{} plane holds {} bytes, {} required",
                    name,
                    plane.len(),
                    required
                )));
            }
        }

        Ok(Self {
            planes,
            strides: picture.strides,
            widths,
            heights,
            plane_count,
            color_format: picture.color_format,
            bit_depth: picture.bit_depth,
        })
    }
}

/// Scoped native image: released when dropped, on every exit path.
pub(crate) struct ImageGuard<'a> {
    api: &'a dyn XeveApi,
    id: ImageId,
}

impl<'a> ImageGuard<'a> {
    pub(crate) fn create(
        api: &'a dyn XeveApi,
        descriptor: &ImageDescriptor<'_>,
    ) -> Result<Self, XeveError> {
        match api.create_image(descriptor) {
            Some(id) => Ok(Self { api, id }),
            None => {
                warn!("Native image descriptor allocation failed");
                Err(XeveError::AllocationFailed("image descriptor"))
            }
        }
    }

    pub(crate) fn id(&self) -> ImageId {
        self.id
    }
}

impl Drop for ImageGuard<'_> {
    fn drop(&mut self) {
        self.api.release_image(self.id);
    }
}
