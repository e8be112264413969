//! Low-level driver boundary
//!
//! Drivers plug into the crate by implementing [`Driver`] and [`RawDevice`]. The calling
//! convention here is deliberately the native one: directions are integer codes, streaming
//! calls return a signed integer that is either an element count or a negative error code,
//! flags and timestamps travel through out-parameters, and sample buffers are arrays of raw
//! addresses. Nothing above [`crate::device`] ever sees these conventions.
//!
//! Configuration calls report failure as a `String` message, the way a native driver reports
//! its last error.

use crate::kwargs::Kwargs;
use crate::types::{ArgInfo, Range};
use libc::{c_int, c_long, c_longlong, c_void};
use num_complex::Complex64;

/// Transmit direction code
pub const DIRECTION_TX: c_int = 0;
/// Receive direction code
pub const DIRECTION_RX: c_int = 1;

/// Returned when the timeout elapsed before anything could be transferred
pub const ERR_TIMEOUT: c_int = -1;
/// Generic stream failure
pub const ERR_STREAM_ERROR: c_int = -2;
/// Data was corrupted in transit
pub const ERR_CORRUPTION: c_int = -3;
/// Receive data was dropped
pub const ERR_OVERFLOW: c_int = -4;
/// The call is not implemented by the driver
pub const ERR_NOT_SUPPORTED: c_int = -5;
/// A timed command was late or malformed
pub const ERR_TIME_ERROR: c_int = -6;
/// Transmit data was not delivered in time
pub const ERR_UNDERFLOW: c_int = -7;

/// The transfer ends a burst
pub const FLAG_END_BURST: c_int = 1 << 1;
/// The time argument is valid
pub const FLAG_HAS_TIME: c_int = 1 << 2;
/// The burst ended without an end-of-burst marker
pub const FLAG_END_ABRUPT: c_int = 1 << 3;
/// Transfer at most one packet
pub const FLAG_ONE_PACKET: c_int = 1 << 4;
/// More data for this packet follows in the next call
pub const FLAG_MORE_FRAGMENTS: c_int = 1 << 5;
/// Wait for an external trigger before streaming
pub const FLAG_WAIT_TRIGGER: c_int = 1 << 6;

/// Default MTU reported by drivers that do not override [`RawDevice::stream_mtu`]
pub const DEFAULT_MTU: usize = 1024;

/// Opaque token identifying one open stream inside one raw device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamToken(pub usize);

/// Message used by the default configuration setters.
pub fn not_supported(call: &str) -> String
{
    format!("{} not supported", call)
}

/// A driver module able to discover and construct devices.
pub trait Driver: Send + Sync
{
    /// Unique key used in the `driver` argument
    fn key(&self) -> &str;

    /// Discover devices matching `args`. An empty result means no match.
    fn find(&self, args: &Kwargs) -> Vec<Kwargs>;

    /// Construct a device. `args` already carries the discovery result merged with the
    /// caller's arguments.
    fn make(&self, args: &Kwargs) -> Result<Box<dyn RawDevice>, String>;

    /// Release a device constructed by this driver.
    fn unmake(&self, device: Box<dyn RawDevice>) -> Result<(), String>
    {
        drop(device);
        Ok(())
    }
}

/// One constructed device, as seen through the native calling convention.
///
/// Every method takes `&self`: a device may be driven from several threads and any locking is
/// the driver's own business.
#[allow(unused_variables, missing_docs)]
pub trait RawDevice: Send + Sync
{
    fn driver_key(&self) -> String;

    fn hardware_key(&self) -> String;

    fn hardware_info(&self) -> Kwargs
    {
        Kwargs::new()
    }

    fn set_frontend_mapping(&self, direction: c_int, mapping: &str) -> Result<(), String>
    {
        Err(not_supported("setFrontendMapping"))
    }

    fn frontend_mapping(&self, direction: c_int) -> String
    {
        String::new()
    }

    fn num_channels(&self, direction: c_int) -> usize
    {
        0
    }

    fn channel_info(&self, direction: c_int, channel: usize) -> Kwargs
    {
        Kwargs::new()
    }

    fn full_duplex(&self, direction: c_int, channel: usize) -> bool
    {
        false
    }

    fn stream_formats(&self, direction: c_int, channel: usize) -> Vec<String>
    {
        Vec::new()
    }

    /// Returns the native format and writes its full-scale value into `full_scale`.
    fn native_stream_format(&self, direction: c_int, channel: usize, full_scale: &mut f64) -> String
    {
        *full_scale = 0.0;
        String::new()
    }

    fn stream_args_info(&self, direction: c_int, channel: usize) -> Vec<ArgInfo>
    {
        Vec::new()
    }

    fn setup_stream(&self, direction: c_int, format: &str, channels: &[usize], args: &Kwargs) -> Result<StreamToken, String>
    {
        Err(not_supported("setupStream"))
    }

    fn close_stream(&self, stream: StreamToken) -> Result<(), String>
    {
        Err(not_supported("closeStream"))
    }

    fn stream_mtu(&self, stream: StreamToken) -> usize
    {
        DEFAULT_MTU
    }

    fn activate_stream(&self, stream: StreamToken, flags: c_int, time_ns: c_longlong, num_elems: usize) -> c_int
    {
        ERR_NOT_SUPPORTED
    }

    fn deactivate_stream(&self, stream: StreamToken, flags: c_int, time_ns: c_longlong) -> c_int
    {
        ERR_NOT_SUPPORTED
    }

    /// Read up to `num_elems` elements per channel into `buffs`.
    ///
    /// Returns the number of elements read or a negative error code.
    ///
    /// # Safety
    ///
    /// Every address in `buffs` must be valid for writes of `num_elems` elements of the stream
    /// format for the duration of the call, and no two addresses may overlap.
    unsafe fn read_stream(&self, stream: StreamToken, buffs: &[*mut c_void], num_elems: usize,
                          flags: &mut c_int, time_ns: &mut c_longlong, timeout_us: c_long) -> c_int
    {
        ERR_NOT_SUPPORTED
    }

    /// Write up to `num_elems` elements per channel from `buffs`.
    ///
    /// Returns the number of elements written or a negative error code.
    ///
    /// # Safety
    ///
    /// Every address in `buffs` must be valid for reads of `num_elems` elements of the stream
    /// format for the duration of the call.
    unsafe fn write_stream(&self, stream: StreamToken, buffs: &[*const c_void], num_elems: usize,
                           flags: &mut c_int, time_ns: c_longlong, timeout_us: c_long) -> c_int
    {
        ERR_NOT_SUPPORTED
    }

    fn read_stream_status(&self, stream: StreamToken, chan_mask: &mut usize, flags: &mut c_int,
                          time_ns: &mut c_longlong, timeout_us: c_long) -> c_int
    {
        ERR_NOT_SUPPORTED
    }

    fn list_antennas(&self, direction: c_int, channel: usize) -> Vec<String>
    {
        Vec::new()
    }

    fn set_antenna(&self, direction: c_int, channel: usize, name: &str) -> Result<(), String>
    {
        Err(not_supported("setAntenna"))
    }

    fn antenna(&self, direction: c_int, channel: usize) -> String
    {
        String::new()
    }

    fn has_dc_offset_mode(&self, direction: c_int, channel: usize) -> bool
    {
        false
    }

    fn set_dc_offset_mode(&self, direction: c_int, channel: usize, automatic: bool) -> Result<(), String>
    {
        Err(not_supported("setDCOffsetMode"))
    }

    fn dc_offset_mode(&self, direction: c_int, channel: usize) -> bool
    {
        false
    }

    fn has_dc_offset(&self, direction: c_int, channel: usize) -> bool
    {
        false
    }

    fn set_dc_offset(&self, direction: c_int, channel: usize, offset: Complex64) -> Result<(), String>
    {
        Err(not_supported("setDCOffset"))
    }

    fn dc_offset(&self, direction: c_int, channel: usize) -> Complex64
    {
        Complex64::new(0.0, 0.0)
    }

    fn has_iq_balance(&self, direction: c_int, channel: usize) -> bool
    {
        false
    }

    fn set_iq_balance(&self, direction: c_int, channel: usize, balance: Complex64) -> Result<(), String>
    {
        Err(not_supported("setIQBalance"))
    }

    fn iq_balance(&self, direction: c_int, channel: usize) -> Complex64
    {
        Complex64::new(0.0, 0.0)
    }

    fn has_iq_balance_mode(&self, direction: c_int, channel: usize) -> bool
    {
        false
    }

    fn set_iq_balance_mode(&self, direction: c_int, channel: usize, automatic: bool) -> Result<(), String>
    {
        Err(not_supported("setIQBalanceMode"))
    }

    fn iq_balance_mode(&self, direction: c_int, channel: usize) -> bool
    {
        false
    }

    fn has_frequency_correction(&self, direction: c_int, channel: usize) -> bool
    {
        false
    }

    fn set_frequency_correction(&self, direction: c_int, channel: usize, value: f64) -> Result<(), String>
    {
        Err(not_supported("setFrequencyCorrection"))
    }

    fn frequency_correction(&self, direction: c_int, channel: usize) -> f64
    {
        0.0
    }

    fn list_gains(&self, direction: c_int, channel: usize) -> Vec<String>
    {
        Vec::new()
    }

    fn set_gain(&self, direction: c_int, channel: usize, name: &str, value: f64) -> Result<(), String>
    {
        Err(not_supported("setGain"))
    }

    fn gain(&self, direction: c_int, channel: usize, name: &str) -> f64
    {
        0.0
    }

    fn gain_range(&self, direction: c_int, channel: usize, name: &str) -> Range
    {
        Range::default()
    }

    fn set_frequency(&self, direction: c_int, channel: usize, frequency: f64, args: &Kwargs) -> Result<(), String>
    {
        Err(not_supported("setFrequency"))
    }

    fn frequency(&self, direction: c_int, channel: usize) -> f64
    {
        0.0
    }

    fn frequency_range(&self, direction: c_int, channel: usize) -> Vec<Range>
    {
        Vec::new()
    }

    fn set_sample_rate(&self, direction: c_int, channel: usize, rate: f64) -> Result<(), String>
    {
        Err(not_supported("setSampleRate"))
    }

    fn sample_rate(&self, direction: c_int, channel: usize) -> f64
    {
        0.0
    }

    fn sample_rate_range(&self, direction: c_int, channel: usize) -> Vec<Range>
    {
        Vec::new()
    }

    fn has_hardware_time(&self, what: &str) -> bool
    {
        false
    }

    fn hardware_time(&self, what: &str) -> c_longlong
    {
        0
    }

    fn set_hardware_time(&self, time_ns: c_longlong, what: &str) -> Result<(), String>
    {
        Err(not_supported("setHardwareTime"))
    }
}
