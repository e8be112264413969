//! Error types
//!
//! Two families live here. [`ErrorCode`] is the outcome of a streaming call and is returned as
//! a value, since callers branch on it in their I/O loops. [`Error`] covers everything else:
//! device construction, configuration calls the driver rejected, and format lookups.

use crate::ll;
use crate::stream::Direction;
use libc::c_int;
use thiserror::Error;

/// Outcome code of a streaming call
///
/// The discriminants are the driver's negative return codes; `None` is zero.
#[repr(i32)]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode
{
    /// The call succeeded
    #[default]
    #[error("no error")]
    None = 0,

    /// Nothing could be transferred within the timeout
    #[error("timeout")]
    Timeout = ll::ERR_TIMEOUT,

    /// Generic stream failure
    #[error("stream error")]
    StreamError = ll::ERR_STREAM_ERROR,

    /// Data was corrupted in transit
    #[error("corruption")]
    Corruption = ll::ERR_CORRUPTION,

    /// Receive data was dropped
    #[error("overflow")]
    Overflow = ll::ERR_OVERFLOW,

    /// The driver does not implement the call
    #[error("not supported")]
    NotSupported = ll::ERR_NOT_SUPPORTED,

    /// A timed command was late or malformed
    #[error("time error")]
    TimeError = ll::ERR_TIME_ERROR,

    /// Transmit data was not delivered in time
    #[error("underflow")]
    Underflow = ll::ERR_UNDERFLOW,
}

impl ErrorCode
{
    /// Map a driver return code onto the enumeration.
    ///
    /// Non-negative codes are `None`. Negative codes outside the known range become
    /// `StreamError`.
    pub fn from_code(code: c_int) -> ErrorCode
    {
        match code
        {
            n if n >= 0 => ErrorCode::None,
            ll::ERR_TIMEOUT => ErrorCode::Timeout,
            ll::ERR_STREAM_ERROR => ErrorCode::StreamError,
            ll::ERR_CORRUPTION => ErrorCode::Corruption,
            ll::ERR_OVERFLOW => ErrorCode::Overflow,
            ll::ERR_NOT_SUPPORTED => ErrorCode::NotSupported,
            ll::ERR_TIME_ERROR => ErrorCode::TimeError,
            ll::ERR_UNDERFLOW => ErrorCode::Underflow,
            other =>
            {
                warn!("driver returned unknown stream code {}", other);
                ErrorCode::StreamError
            }
        }
    }

    /// The driver-level integer code
    pub fn code(self) -> c_int
    {
        self as c_int
    }

    /// True for `ErrorCode::None`
    pub fn is_ok(self) -> bool
    {
        self == ErrorCode::None
    }

    /// `Ok(())` for `None`, `Err(self)` otherwise.
    pub fn into_result(self) -> std::result::Result<(), ErrorCode>
    {
        match self
        {
            ErrorCode::None => Ok(()),
            code => Err(code),
        }
    }
}

/// Errors raised outside the streaming hot path
#[derive(Error, Debug)]
pub enum Error
{
    /// No registered driver found a device for the arguments
    #[error("no driver matches device arguments \"{0}\"")]
    NoMatchingDriver(String),

    /// A driver matched but failed to construct the device
    #[error("driver \"{driver}\" failed to make device: {message}")]
    DriverInit
    {
        /// Key of the failing driver
        driver: String,
        /// Driver-reported message
        message: String,
    },

    /// One entry of a parallel construction failed, failing the whole batch
    #[error("device {index} of parallel make failed: {source}")]
    ParallelMake
    {
        /// Position of the failing entry in the request list
        index: usize,
        /// Why it failed
        #[source]
        source: Box<Error>,
    },

    /// The driver rejected a configuration or stream management call
    #[error("driver error: {0}")]
    Driver(String),

    /// The format identifier is not understood by the catalog
    #[error("unknown stream format \"{0}\"")]
    UnknownFormat(String),

    /// The device does not offer the format on the requested channel
    #[error("format \"{format}\" is not supported on {direction} channel {channel}")]
    UnsupportedFormat
    {
        /// Requested format
        format: String,
        /// Requested direction
        direction: Direction,
        /// First channel lacking the format
        channel: usize,
    },

    /// A streaming call failed
    #[error(transparent)]
    Stream(#[from] ErrorCode),
}

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;
