//! Lifecycle-safe binding for the baseline EVC (MPEG-5 Essential Video
//! Coding) encoder.
//!
//! The native engine sits behind [`api::XeveApi`]. On top of it the crate
//! provides owned parameter sets ([`BaselineParam`]) and encoders
//! ([`BaselineEncoder`]) that release their native resources exactly once,
//! a parser for the length-prefixed NAL payloads the encoder emits
//! ([`nal`]) and a shared pool of payload buffers ([`pool`]).

pub mod api;
pub mod configuration;
pub mod encoder;
pub mod error;
pub mod image;
pub mod nal;
pub mod param;
pub mod pool;
pub mod status;
pub mod types;
pub mod unit;

pub use configuration::EncoderConfiguration;
pub use encoder::BaselineEncoder;
pub use error::XeveError;
pub use image::Picture;
pub use nal::{split_nal, Nal};
pub use param::BaselineParam;
pub use pool::BufferPool;
pub use status::ReturnCode;
pub use types::{NalUnitType, SliceType};
pub use unit::EncodedUnit;

pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_owned()
}
