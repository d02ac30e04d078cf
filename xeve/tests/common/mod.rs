//! Shared helpers for xeve integration tests.

use std::sync::{Arc, Once};
use xeve::configuration::EncoderConfiguration;
use xeve::test::ScriptedApi;
use xeve::BaselineParam;

static INIT: Once = Once::new();

pub fn init() {
    INIT.call_once(|| {
        let _ = env_logger::try_init();
    });
}

/// Parameter set configured the way the sample encoder does it.
pub fn sample_param(
    api: &Arc<ScriptedApi>,
    width: u32,
    height: u32,
) -> anyhow::Result<Arc<BaselineParam>> {
    let conf = EncoderConfiguration::with_size(width, height);
    Ok(BaselineParam::configure(api.clone(), &conf)?)
}
