//! End-to-end and lifecycle tests for `BaselineEncoder` against the
//! scripted engine.

mod common;

use common::{init, sample_param};
use std::sync::Arc;
use std::thread;
use xeve::nal::to_annex_b;
use xeve::pool::BufferPool;
use xeve::status::ReturnCode;
use xeve::test::{expected_records, gradient_frame, gray_frame, ScriptedApi};
use xeve::{BaselineEncoder, BaselineParam, EncodedUnit, NalUnitType, SliceType, XeveError};

fn check_unit(unit: &EncodedUnit, index: u64, keyint: u32) -> anyhow::Result<()> {
    let types = unit
        .split_nal()?
        .iter()
        .map(|n| n.nal_type)
        .collect::<Vec<_>>();
    assert_eq!(types, expected_records(index, keyint), "frame {}", index);
    let total = unit
        .split_nal()?
        .iter()
        .map(|n| n.len() + 4)
        .sum::<usize>();
    assert_eq!(total, unit.len());
    Ok(())
}

// ─── End-to-end tests ────────────────────────────────────────────────────

#[test]
fn test_encode_120_frames() -> anyhow::Result<()> {
    init();
    let api = Arc::new(ScriptedApi::default());
    let param = sample_param(&api, 320, 240)?;
    let keyint = param.settings().keyint;
    let encoder = BaselineEncoder::create(&param)?;

    let mut emitted = 0u64;
    for i in 0..120 {
        let frame = gradient_frame(320, 240, i);
        let unit = encoder.encode(&frame.picture())?;
        assert!(unit.has_data());
        check_unit(&unit, emitted, keyint)?;
        if emitted % u64::from(keyint) == 0 {
            assert_eq!(unit.nal_unit(), NalUnitType::Idr);
            assert_eq!(unit.slice(), SliceType::I);
        } else {
            assert_eq!(unit.nal_unit(), NalUnitType::NonIdr);
            assert_eq!(unit.slice(), SliceType::P);
        }
        emitted += 1;
    }

    let last = encoder.flush()?;
    assert!(!last.has_data());
    assert!(last.is_end_of_stream());
    assert!(matches!(encoder.flush(), Err(XeveError::AlreadyFlushed)));

    encoder.close();
    assert_eq!(emitted, 120);
    assert_eq!(api.counters().live(), 0);
    Ok(())
}

#[test]
fn test_encode_with_delay_and_drain() -> anyhow::Result<()> {
    init();
    let api = Arc::new(ScriptedApi::with_delay(4));
    let param = sample_param(&api, 320, 240)?;
    param.set_framerate(30, 8)?;
    let encoder = BaselineEncoder::create(&param)?;

    let mut units = Vec::new();
    let mut empty = 0;
    for i in 0..30 {
        let unit = encoder.encode(&gradient_frame(320, 240, i).picture())?;
        if unit.has_data() {
            units.push(unit);
        } else {
            assert_eq!(unit.status(), ReturnCode::OutNotAvailable);
            empty += 1;
        }
    }
    assert_eq!(empty, 4);
    units.extend(encoder.finish()?);
    assert_eq!(units.len(), 30);
    for (idx, unit) in units.iter().enumerate() {
        check_unit(unit, idx as u64, 8)?;
    }

    let end = encoder.pull_next()?;
    assert!(end.is_end_of_stream());
    Ok(())
}

#[test]
fn test_annex_b_rewrite_of_key_frame() -> anyhow::Result<()> {
    init();
    let api = Arc::new(ScriptedApi::default());
    let encoder = BaselineEncoder::create(&sample_param(&api, 64, 64)?)?;
    let unit = encoder.encode(&gray_frame(64, 64).picture())?;
    let annex_b = to_annex_b(unit.data())?;
    assert_eq!(annex_b.len(), unit.len());
    assert_eq!(&annex_b[..4], &[0, 0, 0, 1]);
    Ok(())
}

#[test]
fn test_configure_from_asset() -> anyhow::Result<()> {
    init();
    let conf = xeve::EncoderConfiguration::new("assets/encoder.json")?;
    let api = Arc::new(ScriptedApi::default());
    let param = BaselineParam::configure(api.clone(), &conf)?;
    assert!(param.debug_dump()?.contains("320x240"));
    let encoder = BaselineEncoder::create(&param)?;
    assert_eq!((encoder.width(), encoder.height()), (320, 240));
    Ok(())
}

// ─── Lifecycle tests ─────────────────────────────────────────────────────

#[test]
fn test_drop_releases_everything() -> anyhow::Result<()> {
    init();
    let api = Arc::new(ScriptedApi::default());
    {
        let param = sample_param(&api, 320, 240)?;
        let encoder = BaselineEncoder::create(&param)?;
        encoder.encode(&gray_frame(320, 240).picture())?;
    }
    let c = api.counters();
    assert_eq!(c.live(), 0);
    assert_eq!(c.encoders_released, 1);
    assert_eq!(c.params_released, 1);
    Ok(())
}

#[test]
fn test_concurrent_close_with_encode() -> anyhow::Result<()> {
    init();
    let api = Arc::new(ScriptedApi::default());
    let encoder = Arc::new(BaselineEncoder::create(&sample_param(&api, 320, 240)?)?);

    let workers = (0..4)
        .map(|i| {
            let encoder = encoder.clone();
            thread::spawn(move || {
                let frame = gradient_frame(320, 240, i);
                for _ in 0..50 {
                    match encoder.encode(&frame.picture()) {
                        Ok(_) => {}
                        Err(e) => {
                            assert!(e.is_lifecycle_error(), "{}", e);
                            break;
                        }
                    }
                }
            })
        })
        .collect::<Vec<_>>();
    let closers = (0..8)
        .map(|_| {
            let encoder = encoder.clone();
            thread::spawn(move || encoder.close())
        })
        .collect::<Vec<_>>();

    for h in workers.into_iter().chain(closers) {
        h.join().expect("worker panicked");
    }
    assert!(encoder.is_closed());
    drop(encoder);

    let c = api.counters();
    assert_eq!(c.encoders_released, 1);
    assert_eq!(c.bitbs_released, 1);
    assert_eq!(c.params_released, 1);
    assert_eq!(c.images_created, c.images_released);
    assert_eq!(c.live(), 0);
    Ok(())
}

#[test]
fn test_concurrent_flush_bumps_once() -> anyhow::Result<()> {
    init();
    let api = Arc::new(ScriptedApi::default());
    let encoder = Arc::new(BaselineEncoder::create(&sample_param(&api, 320, 240)?)?);
    let results = (0..8)
        .map(|_| {
            let encoder = encoder.clone();
            thread::spawn(move || encoder.flush().is_ok())
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().expect("flush panicked"))
        .collect::<Vec<_>>();
    assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(api.counters().bumps, 1);
    Ok(())
}

#[test]
fn test_image_allocation_failure() -> anyhow::Result<()> {
    init();
    let api = Arc::new(ScriptedApi::default());
    let encoder = BaselineEncoder::create(&sample_param(&api, 320, 240)?)?;
    api.fail_image_allocation(true);
    let res = encoder.encode(&gray_frame(320, 240).picture());
    assert!(matches!(
        res,
        Err(XeveError::AllocationFailed("image descriptor"))
    ));
    assert_eq!(api.counters().pushes, 0);
    api.fail_image_allocation(false);
    assert!(encoder.encode(&gray_frame(320, 240).picture())?.has_data());
    Ok(())
}

#[test]
fn test_pull_failure_returns_buffer() -> anyhow::Result<()> {
    init();
    let api = Arc::new(ScriptedApi::default());
    let pool = Arc::new(BufferPool::new(4));
    let encoder = BaselineEncoder::create_with_pool(&sample_param(&api, 320, 240)?, pool.clone())?;
    api.fail_pull(true);
    let res = encoder.encode(&gray_frame(320, 240).picture());
    assert!(matches!(
        res,
        Err(XeveError::Native {
            op: "encode",
            code: ReturnCode::Unexpected
        })
    ));
    assert_eq!(pool.idle(), 1);
    assert_eq!(api.counters().images_released, 1);
    Ok(())
}

#[test]
fn test_failed_configure_releases_param() {
    init();
    let api = Arc::new(ScriptedApi::default());
    let res = sample_param(&api, 0, 240);
    assert!(res.is_err());
    let c = api.counters();
    assert_eq!(c.params_created, 1);
    assert_eq!(c.params_released, 1);
}
