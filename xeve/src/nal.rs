//! Length-prefixed NAL framing.
//!
//! Each pull from the engine yields one buffer holding a concatenation of
//! records `[u32 big-endian length L][L bytes of NAL data]`, with no padding
//! and no trailer. [`NalIter`] walks such a buffer and yields borrowed
//! [`Nal`] views; nothing is copied.

use crate::error::XeveError;
use crate::types::NalUnitType;

/// Size of the big-endian length prefix in front of every record.
pub const LENGTH_PREFIX_SIZE: usize = 4;

const ANNEX_B_START_CODE: [u8; 4] = [0, 0, 0, 1];

/// One NAL unit borrowed from an encoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nal<'a> {
    pub nal_type: NalUnitType,
    /// Record bytes, header included, length prefix excluded.
    pub data: &'a [u8],
}

impl<'a> Nal<'a> {
    /// Wrap a record whose first byte is the NAL header.
    pub fn from_record(data: &'a [u8]) -> Option<Self> {
        let header = *data.first()?;
        Some(Self {
            nal_type: nal_type_of(header),
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// NAL type carried by the first header byte: `((b >> 1) & 0x3F) - 1`.
///
/// A masked value of zero wraps to 255 and maps to
/// [`NalUnitType::Unknown`].
pub fn nal_type_of(header: u8) -> NalUnitType {
    NalUnitType::from(((header >> 1) & 0x3F).wrapping_sub(1))
}

/// Iterator over the records of a length-prefixed payload.
///
/// Yields an error once and then stops if the framing is broken.
#[derive(Debug, Clone)]
pub struct NalIter<'a> {
    payload: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> NalIter<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            pos: 0,
            done: false,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn next_record(&mut self) -> Result<Nal<'a>, XeveError> {
        let remaining = self.payload.len() - self.pos;
        if remaining < LENGTH_PREFIX_SIZE {
            return Err(XeveError::malformed(
                self.pos,
                format!(
                    "{} trailing bytes cannot hold a {}-byte length prefix",
                    remaining, LENGTH_PREFIX_SIZE
                ),
            ));
        }

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        prefix.copy_from_slice(&self.payload[self.pos..self.pos + LENGTH_PREFIX_SIZE]);
        let declared = u32::from_be_bytes(prefix) as usize;
        let available = remaining - LENGTH_PREFIX_SIZE;
        if declared > available {
            return Err(XeveError::malformed(
                self.pos,
                format!(
                    "record declares {} bytes but only {} remain",
                    declared, available
                ),
            ));
        }

        let start = self.pos + LENGTH_PREFIX_SIZE;
        let record = &self.payload[start..start + declared];
        let nal = Nal::from_record(record)
            .ok_or_else(|| XeveError::malformed(self.pos, "zero-length record has no NAL header"))?;
        self.pos = start + declared;
        Ok(nal)
    }
}

impl<'a> Iterator for NalIter<'a> {
    type Item = Result<Nal<'a>, XeveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.payload.len() {
            return None;
        }
        let res = self.next_record();
        if res.is_err() {
            self.done = true;
        }
        Some(res)
    }
}

impl std::iter::FusedIterator for NalIter<'_> {}

/// Split a payload into its NAL records, in order.
///
/// An empty payload yields an empty vector.
pub fn split_nal(payload: &[u8]) -> Result<Vec<Nal<'_>>, XeveError> {
    NalIter::new(payload).collect()
}

/// Append `nal` to `out` with its big-endian length prefix.
pub fn write_length_prefixed(out: &mut Vec<u8>, nal: &[u8]) -> Result<(), XeveError> {
    let len = u32::try_from(nal.len()).map_err(|_| {
        XeveError::malformed(
            out.len(),
            format!("record of {} bytes exceeds the length prefix range", nal.len()),
        )
    })?;
    out.reserve(LENGTH_PREFIX_SIZE + nal.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(nal);
    Ok(())
}

/// Frame a sequence of NAL units into one length-prefixed payload.
pub fn frame_nal_units<'a, I>(units: I) -> Result<Vec<u8>, XeveError>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut out = Vec::new();
    for unit in units {
        write_length_prefixed(&mut out, unit)?;
    }
    Ok(out)
}

/// Rewrite a length-prefixed payload with `00 00 00 01` start codes.
pub fn to_annex_b(payload: &[u8]) -> Result<Vec<u8>, XeveError> {
    let mut out = Vec::with_capacity(payload.len());
    for nal in NalIter::new(payload) {
        out.extend_from_slice(&ANNEX_B_START_CODE);
        out.extend_from_slice(nal?.data);
    }
    Ok(out)
}
