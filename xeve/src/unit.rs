//! Coded access units returned by the encoder.

use crate::error::XeveError;
use crate::nal::{split_nal, Nal, NalIter};
use crate::pool::BufferPool;
use crate::status::ReturnCode;
use crate::types::{NalUnitType, SliceType};
use std::sync::Arc;

/// Result of one encode, flush or pull call.
///
/// An empty payload means the call produced no output (pipelining delay,
/// look-ahead, end of stream); check [`has_data`](Self::has_data) before
/// using the data. A non-empty payload is borrowed from a [`BufferPool`]
/// and goes back to it when the unit is released or dropped.
#[derive(Debug)]
pub struct EncodedUnit {
    nal_unit: NalUnitType,
    slice: SliceType,
    status: ReturnCode,
    payload: Vec<u8>,
    pool: Option<Arc<BufferPool>>,
}

impl EncodedUnit {
    /// A unit without output, carrying the status of the call.
    pub fn empty(status: ReturnCode) -> Self {
        Self {
            nal_unit: NalUnitType::Unknown(u8::MAX),
            slice: SliceType::default(),
            status,
            payload: Vec::new(),
            pool: None,
        }
    }

    pub(crate) fn pooled(
        nal_unit: NalUnitType,
        slice: SliceType,
        payload: Vec<u8>,
        pool: Arc<BufferPool>,
    ) -> Self {
        Self {
            nal_unit,
            slice,
            status: ReturnCode::Ok,
            payload,
            pool: Some(pool),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.payload.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Type of the coded picture as reported by the engine.
    pub fn nal_unit(&self) -> NalUnitType {
        self.nal_unit
    }

    pub fn slice(&self) -> SliceType {
        self.slice
    }

    /// Native status of the call that produced this unit.
    pub fn status(&self) -> ReturnCode {
        self.status
    }

    /// Whether the engine reported that nothing more will be emitted.
    pub fn is_end_of_stream(&self) -> bool {
        self.status == ReturnCode::NoMoreFrames
    }

    /// Split the payload into its NAL records. The records borrow from
    /// this unit.
    pub fn split_nal(&self) -> Result<Vec<Nal<'_>>, XeveError> {
        split_nal(&self.payload)
    }

    pub fn nals(&self) -> NalIter<'_> {
        NalIter::new(&self.payload)
    }

    /// Detach the payload from the pool and take ownership of it.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.pool = None;
        std::mem::take(&mut self.payload)
    }

    /// Give the payload buffer back to its pool.
    pub fn release(self) {
        drop(self)
    }
}

impl AsRef<[u8]> for EncodedUnit {
    fn as_ref(&self) -> &[u8] {
        &self.payload
    }
}

impl Drop for EncodedUnit {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.put(std::mem::take(&mut self.payload));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nal::frame_nal_units;

    fn unit_from(pool: &Arc<BufferPool>, nals: &[&[u8]]) -> anyhow::Result<EncodedUnit> {
        let mut buf = pool.get(0);
        buf.extend_from_slice(&frame_nal_units(nals.iter().copied())?);
        Ok(EncodedUnit::pooled(
            NalUnitType::Idr,
            SliceType::I,
            buf,
            pool.clone(),
        ))
    }

    #[test]
    fn test_empty_unit() -> anyhow::Result<()> {
        let unit = EncodedUnit::empty(ReturnCode::OutNotAvailable);
        assert!(!unit.has_data());
        assert!(unit.split_nal()?.is_empty());
        assert_eq!(unit.status(), ReturnCode::OutNotAvailable);
        assert!(!unit.is_end_of_stream());
        unit.release();
        Ok(())
    }

    #[test]
    fn test_release_returns_buffer_once() -> anyhow::Result<()> {
        let pool = Arc::new(BufferPool::new(8));
        let unit = unit_from(&pool, &[&[0x04, 1, 2]])?;
        assert!(unit.has_data());
        assert_eq!(unit.split_nal()?.len(), 1);
        assert_eq!(pool.idle(), 0);
        unit.release();
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.stats().returned, 1);
        Ok(())
    }

    #[test]
    fn test_drop_returns_buffer() -> anyhow::Result<()> {
        let pool = Arc::new(BufferPool::new(8));
        {
            let _unit = unit_from(&pool, &[&[0x02, 1]])?;
        }
        assert_eq!(pool.idle(), 1);
        Ok(())
    }

    #[test]
    fn test_into_vec_detaches_from_pool() -> anyhow::Result<()> {
        let pool = Arc::new(BufferPool::new(8));
        let unit = unit_from(&pool, &[&[0x02, 1], &[0x04, 2, 3]])?;
        let bytes = unit.into_vec();
        assert_eq!(bytes.len(), 4 + 2 + 4 + 3);
        assert_eq!(pool.idle(), 0);
        Ok(())
    }

    #[test]
    fn test_nals_iterator() -> anyhow::Result<()> {
        let pool = Arc::new(BufferPool::new(8));
        let unit = unit_from(&pool, &[&[50, 1], &[52], &[4, 9, 9]])?;
        let types = unit
            .nals()
            .map(|n| n.map(|n| n.nal_type))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(
            types,
            vec![NalUnitType::Sps, NalUnitType::Pps, NalUnitType::Idr]
        );
        Ok(())
    }
}
