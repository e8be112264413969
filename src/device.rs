//! Device sessions
//!
//! A [`Device`] is a cheap, clonable reference to one constructed driver device. Clones alias
//! the same underlying resource, which is released exactly once when the last clone drops.
//!
//! # Threading
//!
//! `Device` is `Send + Sync`. Calls are passed straight to the driver without extra locking,
//! so the driver's own guarantees apply: distinct streams may be driven from different threads,
//! but calls on one [`StreamHandle`] must be serialised by the caller.

use crate::error::{Error, ErrorCode, Result};
use crate::factory;
use crate::format::{self, Sample};
use crate::kwargs::Kwargs;
use crate::ll::{Driver, RawDevice};
use crate::stream::{check_capacity, Direction, RxBuffer, StreamFlags, StreamHandle, StreamResult, TxBuffer};
use crate::streamer::{RxStream, TxStream};
use crate::types::{ArgInfo, Range};
use crate::util::{split_ret, timeout_us_to_c, to_driver_result};
use libc::c_void;
use num_complex::Complex64;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::ManuallyDrop;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static NEXT_SESSION_ID: AtomicUsize = AtomicUsize::new(1);

struct Session
{
    id: usize,
    driver: Arc<dyn Driver>,
    raw: ManuallyDrop<Box<dyn RawDevice>>,
    open_streams: AtomicUsize,
}

impl Drop for Session
{
    fn drop(&mut self)
    {
        let open = self.open_streams.load(Ordering::Acquire);
        if open > 0
        {
            warn!("releasing device session {} with {} open streams", self.id, open);
        }

        // SAFETY: `raw` is never touched again after this point.
        let raw = unsafe { ManuallyDrop::take(&mut self.raw) };
        let driver = &self.driver;
        match panic::catch_unwind(AssertUnwindSafe(|| driver.unmake(raw)))
        {
            Ok(Ok(())) => debug!("released device session {}", self.id),
            Ok(Err(e)) => error!("Error releasing device session {}: {}", self.id, e),
            Err(_) => error!("Unknown error releasing device session {}", self.id),
        }
    }
}

/// A session on one device
///
/// Two `Device` values compare equal when their driver and hardware keys match, even when
/// they are backed by different resources. Use [`Device::same_resource`] to ask whether two
/// values alias one resource.
#[derive(Clone)]
pub struct Device
{
    session: Arc<Session>,
}

impl Device
{
    pub(crate) fn from_raw(driver: Arc<dyn Driver>, raw: Box<dyn RawDevice>) -> Device
    {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        debug!("device session {} opened by driver \"{}\"", id, driver.key());
        Device
        {
            session: Arc::new(Session
            {
                id,
                driver,
                raw: ManuallyDrop::new(raw),
                open_streams: AtomicUsize::new(0),
            }),
        }
    }

    /// Construct a device from an argument map. See [`factory::make`].
    pub fn make(args: &Kwargs) -> Result<Device>
    {
        factory::make(args)
    }

    /// Construct a device from a flat argument string such as `"driver=loopback,serial=1"`.
    pub fn make_from_str(args: &str) -> Result<Device>
    {
        factory::make_from_str(args)
    }

    /// Construct several devices concurrently. See [`factory::parallel_make`].
    pub fn parallel_make(args_list: &[Kwargs]) -> Result<Vec<Device>>
    {
        factory::parallel_make(args_list)
    }

    /// List devices matching `args` across all registered drivers.
    pub fn enumerate(args: &Kwargs) -> Vec<Kwargs>
    {
        factory::enumerate(args)
    }

    /// True when both values alias the same underlying resource
    pub fn same_resource(a: &Device, b: &Device) -> bool
    {
        Arc::ptr_eq(&a.session, &b.session)
    }

    fn raw(&self) -> &dyn RawDevice
    {
        &**self.session.raw
    }

    fn check_handle(&self, handle: &StreamHandle)
    {
        assert!(handle.session() == self.session.id,
                "stream handle {:?} belongs to another device session", handle.token());
    }

    //
    // Identification
    //

    /// Key of the driver behind this device
    pub fn get_driver_key(&self) -> String
    {
        self.raw().driver_key()
    }

    /// Key identifying the hardware model
    pub fn get_hardware_key(&self) -> String
    {
        self.raw().hardware_key()
    }

    /// Free-form hardware information
    pub fn get_hardware_info(&self) -> Kwargs
    {
        self.raw().hardware_info()
    }

    //
    // Channels
    //

    /// Set the frontend-to-channel mapping for a direction
    pub fn set_frontend_mapping(&self, direction: Direction, mapping: &str) -> Result<()>
    {
        to_driver_result(self.raw().set_frontend_mapping(direction.code(), mapping))
    }

    /// Current frontend-to-channel mapping for a direction
    pub fn get_frontend_mapping(&self, direction: Direction) -> String
    {
        self.raw().frontend_mapping(direction.code())
    }

    /// Number of channels in a direction
    pub fn get_num_channels(&self, direction: Direction) -> usize
    {
        self.raw().num_channels(direction.code())
    }

    /// Free-form information about one channel
    pub fn get_channel_info(&self, direction: Direction, channel: usize) -> Kwargs
    {
        self.raw().channel_info(direction.code(), channel)
    }

    /// Whether the channel can stream in both directions at once
    pub fn get_full_duplex(&self, direction: Direction, channel: usize) -> bool
    {
        self.raw().full_duplex(direction.code(), channel)
    }

    //
    // Stream discovery
    //

    /// Formats the channel can stream in
    pub fn get_stream_formats(&self, direction: Direction, channel: usize) -> Vec<String>
    {
        self.raw().stream_formats(direction.code(), channel)
    }

    /// The channel's native format together with its full-scale value
    pub fn get_native_stream_format(&self, direction: Direction, channel: usize) -> (String, f64)
    {
        let mut full_scale = 0.0;
        let format = self.raw().native_stream_format(direction.code(), channel, &mut full_scale);
        (format, full_scale)
    }

    /// Arguments accepted by [`Device::setup_stream`] for this channel
    pub fn get_stream_args_info(&self, direction: Direction, channel: usize) -> Vec<ArgInfo>
    {
        self.raw().stream_args_info(direction.code(), channel)
    }

    //
    // Stream lifecycle
    //

    /// Open a stream.
    ///
    /// An empty `channels` list means every channel of the direction. The format must be
    /// listed by [`Device::get_stream_formats`] for every requested channel; nothing is
    /// substituted. The returned handle records the request as given (after the empty-list
    /// expansion) and starts in the configured, inactive state.
    pub fn setup_stream(&self, direction: Direction, format: &str, channels: &[usize], args: &Kwargs) -> Result<StreamHandle>
    {
        let channels: Vec<usize> = if channels.is_empty()
        {
            (0 .. self.get_num_channels(direction)).collect()
        }
        else
        {
            channels.to_vec()
        };

        for &channel in &channels
        {
            if !self.get_stream_formats(direction, channel).iter().any(|f| f == format)
            {
                return Err(Error::UnsupportedFormat { format: format.to_string(), direction, channel });
            }
        }

        let token = to_driver_result(self.raw().setup_stream(direction.code(), format, &channels, args))?;
        self.session.open_streams.fetch_add(1, Ordering::AcqRel);
        debug!("session {}: {} stream {:?} set up ({}, channels {:?})",
               self.session.id, direction, token, format, channels);

        let elem_size = format::format_to_size(format).ok();
        Ok(StreamHandle::new(self.session.id, token, direction, channels, format.to_string(), elem_size))
    }

    /// Close a stream, consuming its handle.
    ///
    /// The handle is gone even when the driver reports an error: the stream is then counted
    /// as closed and cannot be closed again. Any resources the driver failed to free stay
    /// with the driver until the device is released.
    ///
    /// # Panics
    ///
    /// If the handle was set up on a different session.
    pub fn close_stream(&self, handle: StreamHandle) -> Result<()>
    {
        self.check_handle(&handle);
        let closed = self.raw().close_stream(handle.token());
        self.session.open_streams.fetch_sub(1, Ordering::AcqRel);
        match closed
        {
            Ok(()) => debug!("session {}: stream {:?} closed", self.session.id, handle.token()),
            Err(ref e) => warn!("session {}: closing stream {:?} failed: {}", self.session.id, handle.token(), e),
        }
        to_driver_result(closed)
    }

    /// Number of streams set up on this session and not yet closed
    pub fn get_num_open_streams(&self) -> usize
    {
        self.session.open_streams.load(Ordering::Acquire)
    }

    /// Largest number of elements one read or write moves without fragmenting.
    ///
    /// Advisory: larger transfers are allowed and simply return partial counts.
    pub fn get_stream_mtu(&self, handle: &StreamHandle) -> usize
    {
        self.check_handle(handle);
        self.raw().stream_mtu(handle.token())
    }

    /// Start streaming.
    ///
    /// `time_ns` is honoured only when `flags` contains `HAS_TIME`. `num_elems` of zero streams
    /// until deactivated; otherwise a single burst of that many elements is requested.
    pub fn activate_stream(&self, handle: &StreamHandle, flags: StreamFlags, time_ns: i64, num_elems: usize) -> ErrorCode
    {
        self.check_handle(handle);
        ErrorCode::from_code(self.raw().activate_stream(handle.token(), flags.bits(), time_ns, num_elems))
    }

    /// Stop streaming.
    ///
    /// Not guaranteed to be idempotent: deactivating an inactive stream may return an error,
    /// so track the active state rather than relying on repeated calls.
    pub fn deactivate_stream(&self, handle: &StreamHandle, flags: StreamFlags, time_ns: i64) -> ErrorCode
    {
        self.check_handle(handle);
        ErrorCode::from_code(self.raw().deactivate_stream(handle.token(), flags.bits(), time_ns))
    }

    /// Read up to `num_elems` elements per channel straight into `buffers`.
    ///
    /// `buffers` holds one destination per stream channel, in channel order. On
    /// `ErrorCode::None` the result carries the number of elements actually read (a short
    /// read is normal) plus the driver's flags and timestamp. On any other code the count is
    /// zero and must not be interpreted. `ErrorCode::Timeout` means nothing arrived within
    /// `timeout_us` and is usually retried. A request for zero elements returns immediately
    /// without calling the driver.
    ///
    /// # Panics
    ///
    /// If the handle belongs to another session or is not a receive stream, if the number of
    /// buffers differs from the number of stream channels, or if a slice-backed buffer is too
    /// small for `num_elems` elements.
    pub fn read_stream(&self, handle: &StreamHandle, buffers: &mut [RxBuffer<'_>], num_elems: usize,
                       flags: StreamFlags, time_ns: i64, timeout_us: i64) -> (ErrorCode, StreamResult)
    {
        self.check_handle(handle);
        assert_eq!(handle.direction(), Direction::Rx, "read_stream needs a receive stream");
        assert_eq!(buffers.len(), handle.channels().len(), "expected one buffer per stream channel");
        for buffer in buffers.iter()
        {
            check_capacity(buffer.len_bytes(), handle.elem_size(), num_elems);
        }

        let mut result = StreamResult { flags, time_ns, timeout_us, ..StreamResult::default() };
        if num_elems == 0
        {
            return (ErrorCode::None, result);
        }

        let ptrs: Vec<*mut c_void> = buffers.iter().map(|b| b.as_ptr()).collect();
        let mut raw_flags = flags.bits();
        let mut raw_time = time_ns;
        // SAFETY: slice-backed buffers were sized above and are exclusively borrowed; raw
        // buffers were vouched for when they were built.
        let ret = unsafe
        {
            self.raw().read_stream(handle.token(), &ptrs, num_elems, &mut raw_flags, &mut raw_time,
                                   timeout_us_to_c(timeout_us))
        };

        let (code, count) = split_ret(ret);
        result.num_samples = count;
        result.flags = StreamFlags::from_bits_truncate(raw_flags);
        result.time_ns = raw_time;
        (code, result)
    }

    /// Write up to `num_elems` elements per channel straight from `buffers`.
    ///
    /// `flags` carries burst and timing intent (`END_BURST`, `HAS_TIME` with `time_ns`) and
    /// comes back in the result as the driver left it. Results follow the same rules as
    /// [`Device::read_stream`].
    ///
    /// # Panics
    ///
    /// As for [`Device::read_stream`], with a transmit stream required.
    pub fn write_stream(&self, handle: &StreamHandle, buffers: &[TxBuffer<'_>], num_elems: usize,
                        flags: StreamFlags, time_ns: i64, timeout_us: i64) -> (ErrorCode, StreamResult)
    {
        self.check_handle(handle);
        assert_eq!(handle.direction(), Direction::Tx, "write_stream needs a transmit stream");
        assert_eq!(buffers.len(), handle.channels().len(), "expected one buffer per stream channel");
        for buffer in buffers
        {
            check_capacity(buffer.len_bytes(), handle.elem_size(), num_elems);
        }

        let mut result = StreamResult { flags, time_ns, timeout_us, ..StreamResult::default() };
        if num_elems == 0
        {
            return (ErrorCode::None, result);
        }

        let ptrs: Vec<*const c_void> = buffers.iter().map(|b| b.as_ptr()).collect();
        let mut raw_flags = flags.bits();
        // SAFETY: see read_stream.
        let ret = unsafe
        {
            self.raw().write_stream(handle.token(), &ptrs, num_elems, &mut raw_flags, time_ns,
                                    timeout_us_to_c(timeout_us))
        };

        let (code, count) = split_ret(ret);
        result.num_samples = count;
        result.flags = StreamFlags::from_bits_truncate(raw_flags);
        (code, result)
    }

    /// Wait up to `timeout_us` for an asynchronous status event on the stream.
    ///
    /// Fills `chan_mask`, `flags` and `time_ns` of the result; no samples move.
    pub fn read_stream_status(&self, handle: &StreamHandle, timeout_us: i64) -> (ErrorCode, StreamResult)
    {
        self.check_handle(handle);
        let mut chan_mask = 0;
        let mut raw_flags = 0;
        let mut raw_time = 0;
        let ret = self.raw().read_stream_status(handle.token(), &mut chan_mask, &mut raw_flags, &mut raw_time,
                                                timeout_us_to_c(timeout_us));
        let (code, _) = split_ret(ret);
        let result = StreamResult
        {
            num_samples: 0,
            flags: StreamFlags::from_bits_truncate(raw_flags),
            time_ns: raw_time,
            timeout_us,
            chan_mask,
        };
        (code, result)
    }

    /// Open a typed receive stream in `T::FORMAT`.
    pub fn rx_stream<T: Sample>(&self, channels: &[usize], args: &Kwargs) -> Result<RxStream<T>>
    {
        RxStream::setup(self.clone(), channels, args)
    }

    /// Open a typed transmit stream in `T::FORMAT`.
    pub fn tx_stream<T: Sample>(&self, channels: &[usize], args: &Kwargs) -> Result<TxStream<T>>
    {
        TxStream::setup(self.clone(), channels, args)
    }

    //
    // Antennas
    //

    /// Antennas available on a channel
    pub fn list_antennas(&self, direction: Direction, channel: usize) -> Vec<String>
    {
        self.raw().list_antennas(direction.code(), channel)
    }

    /// Select an antenna
    pub fn set_antenna(&self, direction: Direction, channel: usize, name: &str) -> Result<()>
    {
        to_driver_result(self.raw().set_antenna(direction.code(), channel, name))
    }

    /// Selected antenna
    pub fn get_antenna(&self, direction: Direction, channel: usize) -> String
    {
        self.raw().antenna(direction.code(), channel)
    }

    //
    // Frontend corrections. Probe with the `has_` call first; the setters are not validated
    // here and an unsupported one fails in the driver.
    //

    /// Whether automatic DC offset correction can be toggled
    pub fn has_dc_offset_mode(&self, direction: Direction, channel: usize) -> bool
    {
        self.raw().has_dc_offset_mode(direction.code(), channel)
    }

    /// Enable or disable automatic DC offset correction
    pub fn set_dc_offset_mode(&self, direction: Direction, channel: usize, automatic: bool) -> Result<()>
    {
        to_driver_result(self.raw().set_dc_offset_mode(direction.code(), channel, automatic))
    }

    /// Whether automatic DC offset correction is on
    pub fn get_dc_offset_mode(&self, direction: Direction, channel: usize) -> bool
    {
        self.raw().dc_offset_mode(direction.code(), channel)
    }

    /// Whether a manual DC offset can be applied
    pub fn has_dc_offset(&self, direction: Direction, channel: usize) -> bool
    {
        self.raw().has_dc_offset(direction.code(), channel)
    }

    /// Apply a manual DC offset
    pub fn set_dc_offset(&self, direction: Direction, channel: usize, offset: Complex64) -> Result<()>
    {
        to_driver_result(self.raw().set_dc_offset(direction.code(), channel, offset))
    }

    /// Current manual DC offset
    pub fn get_dc_offset(&self, direction: Direction, channel: usize) -> Complex64
    {
        self.raw().dc_offset(direction.code(), channel)
    }

    /// Whether a manual IQ balance can be applied
    pub fn has_iq_balance(&self, direction: Direction, channel: usize) -> bool
    {
        self.raw().has_iq_balance(direction.code(), channel)
    }

    /// Apply a manual IQ balance
    pub fn set_iq_balance(&self, direction: Direction, channel: usize, balance: Complex64) -> Result<()>
    {
        to_driver_result(self.raw().set_iq_balance(direction.code(), channel, balance))
    }

    /// Current manual IQ balance
    pub fn get_iq_balance(&self, direction: Direction, channel: usize) -> Complex64
    {
        self.raw().iq_balance(direction.code(), channel)
    }

    /// Whether automatic IQ balance correction can be toggled
    pub fn has_iq_balance_mode(&self, direction: Direction, channel: usize) -> bool
    {
        self.raw().has_iq_balance_mode(direction.code(), channel)
    }

    /// Enable or disable automatic IQ balance correction
    pub fn set_iq_balance_mode(&self, direction: Direction, channel: usize, automatic: bool) -> Result<()>
    {
        to_driver_result(self.raw().set_iq_balance_mode(direction.code(), channel, automatic))
    }

    /// Whether automatic IQ balance correction is on
    pub fn get_iq_balance_mode(&self, direction: Direction, channel: usize) -> bool
    {
        self.raw().iq_balance_mode(direction.code(), channel)
    }

    /// Whether a frequency correction can be applied
    pub fn has_frequency_correction(&self, direction: Direction, channel: usize) -> bool
    {
        self.raw().has_frequency_correction(direction.code(), channel)
    }

    /// Apply a frequency correction in PPM
    pub fn set_frequency_correction(&self, direction: Direction, channel: usize, value: f64) -> Result<()>
    {
        to_driver_result(self.raw().set_frequency_correction(direction.code(), channel, value))
    }

    /// Current frequency correction in PPM
    pub fn get_frequency_correction(&self, direction: Direction, channel: usize) -> f64
    {
        self.raw().frequency_correction(direction.code(), channel)
    }

    //
    // Gain, frequency, sample rate
    //

    /// Names of the gain elements on a channel
    pub fn list_gains(&self, direction: Direction, channel: usize) -> Vec<String>
    {
        self.raw().list_gains(direction.code(), channel)
    }

    /// Set one gain element in dB
    pub fn set_gain(&self, direction: Direction, channel: usize, name: &str, value: f64) -> Result<()>
    {
        to_driver_result(self.raw().set_gain(direction.code(), channel, name, value))
    }

    /// Value of one gain element in dB
    pub fn get_gain(&self, direction: Direction, channel: usize, name: &str) -> f64
    {
        self.raw().gain(direction.code(), channel, name)
    }

    /// Range of one gain element
    pub fn get_gain_range(&self, direction: Direction, channel: usize, name: &str) -> Range
    {
        self.raw().gain_range(direction.code(), channel, name)
    }

    /// Tune the channel's centre frequency in Hz
    pub fn set_frequency(&self, direction: Direction, channel: usize, frequency: f64, args: &Kwargs) -> Result<()>
    {
        to_driver_result(self.raw().set_frequency(direction.code(), channel, frequency, args))
    }

    /// Centre frequency in Hz
    pub fn get_frequency(&self, direction: Direction, channel: usize) -> f64
    {
        self.raw().frequency(direction.code(), channel)
    }

    /// Tunable frequency ranges
    pub fn get_frequency_range(&self, direction: Direction, channel: usize) -> Vec<Range>
    {
        self.raw().frequency_range(direction.code(), channel)
    }

    /// Set the sample rate in Hz
    pub fn set_sample_rate(&self, direction: Direction, channel: usize, rate: f64) -> Result<()>
    {
        to_driver_result(self.raw().set_sample_rate(direction.code(), channel, rate))
    }

    /// Sample rate in Hz
    pub fn get_sample_rate(&self, direction: Direction, channel: usize) -> f64
    {
        self.raw().sample_rate(direction.code(), channel)
    }

    /// Supported sample rate ranges
    pub fn get_sample_rate_range(&self, direction: Direction, channel: usize) -> Vec<Range>
    {
        self.raw().sample_rate_range(direction.code(), channel)
    }

    //
    // Time
    //

    /// Whether the named time source exists (empty name for the default)
    pub fn has_hardware_time(&self, what: &str) -> bool
    {
        self.raw().has_hardware_time(what)
    }

    /// Hardware time in nanoseconds
    pub fn get_hardware_time(&self, what: &str) -> i64
    {
        self.raw().hardware_time(what)
    }

    /// Set the hardware time in nanoseconds
    pub fn set_hardware_time(&self, time_ns: i64, what: &str) -> Result<()>
    {
        to_driver_result(self.raw().set_hardware_time(time_ns, what))
    }
}

impl PartialEq for Device
{
    fn eq(&self, other: &Device) -> bool
    {
        self.get_driver_key() == other.get_driver_key() && self.get_hardware_key() == other.get_hardware_key()
    }
}

impl Eq for Device {}

impl Hash for Device
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        self.get_driver_key().hash(state);
        self.get_hardware_key().hash(state);
    }
}

impl fmt::Display for Device
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "{}:{}", self.get_driver_key(), self.get_hardware_key())
    }
}

impl fmt::Debug for Device
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.debug_struct("Device")
            .field("session", &self.session.id)
            .field("driver", &self.get_driver_key())
            .field("hardware", &self.get_hardware_key())
            .finish()
    }
}
