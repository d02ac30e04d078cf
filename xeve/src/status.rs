//! Native status codes returned by the xeveb engine.
//!
//! The engine speaks a signed-integer status space: zero is plain success,
//! small positive values are informational successes and negative values
//! are failures. Callers branch on `code >= 0` as the success predicate, so
//! unrecognized codes are kept verbatim in [`ReturnCode::Other`] and still
//! classify correctly.

/// Three-tier classification of a [`ReturnCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// `XEVE_OK`.
    Success,
    /// A success that carries extra meaning (delayed output, end of stream, …).
    Informational,
    /// A failure.
    Error,
}

/// Status code of a native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    Ok,
    WarnCrcIgnored,
    BadCrc,
    FrameDelayed,
    FrameDimensionChanged,
    OutNotAvailable,
    NoMoreFrames,
    Err,
    InvalidArgument,
    OutOfMemory,
    ReachedMax,
    Unsupported,
    Unexpected,
    UnsupportedColorSpace,
    MalformedBitstream,
    Unknown,
    /// A code outside of the documented set.
    Other(i32),
}

impl ReturnCode {
    /// The raw native value.
    pub fn code(&self) -> i32 {
        match self {
            ReturnCode::Ok => 0,
            ReturnCode::WarnCrcIgnored => 200,
            ReturnCode::BadCrc => 201,
            ReturnCode::FrameDelayed => 202,
            ReturnCode::FrameDimensionChanged => 203,
            ReturnCode::OutNotAvailable => 204,
            ReturnCode::NoMoreFrames => 205,
            ReturnCode::Err => -1,
            ReturnCode::InvalidArgument => -101,
            ReturnCode::OutOfMemory => -102,
            ReturnCode::ReachedMax => -103,
            ReturnCode::Unsupported => -104,
            ReturnCode::Unexpected => -105,
            ReturnCode::UnsupportedColorSpace => -201,
            ReturnCode::MalformedBitstream => -202,
            ReturnCode::Unknown => -32767,
            ReturnCode::Other(code) => *code,
        }
    }

    pub fn class(&self) -> StatusClass {
        match self.code() {
            0 => StatusClass::Success,
            c if c > 0 => StatusClass::Informational,
            _ => StatusClass::Error,
        }
    }

    /// `true` for every non-negative code.
    pub fn succeeded(&self) -> bool {
        self.code() >= 0
    }

    pub fn failed(&self) -> bool {
        !self.succeeded()
    }

    pub fn is_informational(&self) -> bool {
        self.class() == StatusClass::Informational
    }

    /// Native symbolic name, e.g. `XEVE_OK_NO_MORE_FRM`.
    pub fn name(&self) -> &'static str {
        match self {
            ReturnCode::Ok => "XEVE_OK",
            ReturnCode::WarnCrcIgnored => "XEVE_WARN_CRC_IGNORED",
            ReturnCode::BadCrc => "XEVE_ERR_BAD_CRC",
            ReturnCode::FrameDelayed => "XEVE_OK_FRM_DELAYED",
            ReturnCode::FrameDimensionChanged => "XEVE_OK_DIM_CHANGED",
            ReturnCode::OutNotAvailable => "XEVE_OK_OUT_NOT_AVAILABLE",
            ReturnCode::NoMoreFrames => "XEVE_OK_NO_MORE_FRM",
            ReturnCode::Err => "XEVE_ERR",
            ReturnCode::InvalidArgument => "XEVE_ERR_INVALID_ARGUMENT",
            ReturnCode::OutOfMemory => "XEVE_ERR_OUT_OF_MEMORY",
            ReturnCode::ReachedMax => "XEVE_ERR_REACHED_MAX",
            ReturnCode::Unsupported => "XEVE_ERR_UNSUPPORTED",
            ReturnCode::Unexpected => "XEVE_ERR_UNEXPECTED",
            ReturnCode::UnsupportedColorSpace => "XEVE_ERR_UNSUPPORTED_COLORSPACE",
            ReturnCode::MalformedBitstream => "XEVE_ERR_MALFORMED_BITSTREAM",
            ReturnCode::Unknown | ReturnCode::Other(_) => "XEVE_ERR_UNKNOWN",
        }
    }
}

impl From<i32> for ReturnCode {
    fn from(code: i32) -> Self {
        match code {
            0 => ReturnCode::Ok,
            200 => ReturnCode::WarnCrcIgnored,
            201 => ReturnCode::BadCrc,
            202 => ReturnCode::FrameDelayed,
            203 => ReturnCode::FrameDimensionChanged,
            204 => ReturnCode::OutNotAvailable,
            205 => ReturnCode::NoMoreFrames,
            -1 => ReturnCode::Err,
            -101 => ReturnCode::InvalidArgument,
            -102 => ReturnCode::OutOfMemory,
            -103 => ReturnCode::ReachedMax,
            -104 => ReturnCode::Unsupported,
            -105 => ReturnCode::Unexpected,
            -201 => ReturnCode::UnsupportedColorSpace,
            -202 => ReturnCode::MalformedBitstream,
            -32767 => ReturnCode::Unknown,
            other => ReturnCode::Other(other),
        }
    }
}

impl From<ReturnCode> for i32 {
    fn from(rc: ReturnCode) -> Self {
        rc.code()
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
