//! Stream handles, flags and per-call results

use crate::format::Sample;
use crate::ll;
use libc::{c_int, c_void};
use std::fmt;
use std::marker::PhantomData;
use std::mem;

/// Direction of a stream or channel
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction
{
    /// Transmit
    Tx = ll::DIRECTION_TX,

    /// Receive
    Rx = ll::DIRECTION_RX,
}

impl Direction
{
    /// The driver-level direction code
    pub fn code(self) -> c_int
    {
        self as c_int
    }
}

impl fmt::Display for Direction
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match *self
        {
            Direction::Tx => f.write_str("TX"),
            Direction::Rx => f.write_str("RX"),
        }
    }
}

bitflags! {
    /// Stream control and status flags
    ///
    /// `StreamFlags::empty()` is the "no flags" value.
    #[derive(Default)]
    pub struct StreamFlags: c_int
    {
        /// The transfer ends a burst
        const END_BURST = ll::FLAG_END_BURST;
        /// The accompanying time value is valid
        const HAS_TIME = ll::FLAG_HAS_TIME;
        /// The burst ended without an end-of-burst marker
        const END_ABRUPT = ll::FLAG_END_ABRUPT;
        /// Transfer at most one packet
        const ONE_PACKET = ll::FLAG_ONE_PACKET;
        /// More fragments of this packet follow
        const MORE_FRAGMENTS = ll::FLAG_MORE_FRAGMENTS;
        /// Wait for an external trigger
        const WAIT_TRIGGER = ll::FLAG_WAIT_TRIGGER;
    }
}

/// What a single streaming call reported
///
/// `num_samples` is only meaningful when the accompanying [`crate::ErrorCode`] is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamResult
{
    /// Elements transferred per channel
    pub num_samples: usize,

    /// Flags reported by the driver
    pub flags: StreamFlags,

    /// Timestamp in nanoseconds, valid when `flags` has `HAS_TIME`
    pub time_ns: i64,

    /// Timeout the call ran with, in microseconds
    pub timeout_us: i64,

    /// Channels a status event applies to, one bit per channel
    pub chan_mask: usize,
}

/// One open stream on one device session
///
/// The handle records the request it was set up with; the driver token inside is the resource
/// actually negotiated. Handles cannot be cloned and [`crate::Device::close_stream`] consumes
/// them, so a closed handle cannot be used again. Equality and hashing look only at the
/// session and token, never at the recorded configuration.
pub struct StreamHandle
{
    session: usize,
    token: ll::StreamToken,
    direction: Direction,
    channels: Vec<usize>,
    format: String,
    elem_size: Option<usize>,
}

impl StreamHandle
{
    pub(crate) fn new(session: usize, token: ll::StreamToken, direction: Direction,
                      channels: Vec<usize>, format: String, elem_size: Option<usize>) -> StreamHandle
    {
        StreamHandle
        {
            session,
            token,
            direction,
            channels,
            format,
            elem_size,
        }
    }

    /// Channels the stream was set up with, in order
    pub fn channels(&self) -> &[usize]
    {
        &self.channels
    }

    /// Format identifier the stream was set up with
    pub fn format(&self) -> &str
    {
        &self.format
    }

    /// Direction of the stream
    pub fn direction(&self) -> Direction
    {
        self.direction
    }

    /// Driver token, for passing back into driver calls
    pub fn token(&self) -> ll::StreamToken
    {
        self.token
    }

    pub(crate) fn session(&self) -> usize
    {
        self.session
    }

    pub(crate) fn elem_size(&self) -> Option<usize>
    {
        self.elem_size
    }
}

impl PartialEq for StreamHandle
{
    fn eq(&self, other: &StreamHandle) -> bool
    {
        self.session == other.session && self.token == other.token
    }
}

impl Eq for StreamHandle {}

impl std::hash::Hash for StreamHandle
{
    fn hash<H: std::hash::Hasher>(&self, state: &mut H)
    {
        self.session.hash(state);
        self.token.hash(state);
    }
}

impl fmt::Debug for StreamHandle
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.debug_struct("StreamHandle")
            .field("token", &self.token)
            .field("direction", &self.direction)
            .field("format", &self.format)
            .field("channels", &self.channels)
            .finish()
    }
}

/// Destination address for one channel of a read
///
/// Reads are zero-copy: the driver writes straight into this memory. A buffer built with
/// [`RxBuffer::new`] borrows a slice and its length is checked against every read. A buffer
/// built with [`RxBuffer::from_raw`] carries only an address, and the caller vouches for it.
pub struct RxBuffer<'a>
{
    ptr: *mut c_void,
    len: Option<usize>,
    _marker: PhantomData<&'a mut [u8]>,
}

impl<'a> RxBuffer<'a>
{
    /// Borrow a slice as a read destination.
    pub fn new<T: Sample>(buf: &'a mut [T]) -> RxBuffer<'a>
    {
        RxBuffer
        {
            len: Some(mem::size_of_val(buf)),
            ptr: buf.as_mut_ptr() as *mut c_void,
            _marker: PhantomData,
        }
    }

    /// Use a raw address as a read destination.
    ///
    /// # Safety
    ///
    /// For every read this buffer is passed to, `ptr` must be valid for writes of
    /// `num_elems` elements of the stream format, must not alias any other buffer of the same
    /// call, and must stay valid until the call returns. None of this is checked.
    pub unsafe fn from_raw(ptr: *mut c_void) -> RxBuffer<'a>
    {
        RxBuffer { ptr, len: None, _marker: PhantomData }
    }

    /// The destination address
    pub fn as_ptr(&self) -> *mut c_void
    {
        self.ptr
    }

    /// Size of the borrowed slice in bytes, `None` for raw buffers
    pub fn len_bytes(&self) -> Option<usize>
    {
        self.len
    }
}

/// Source address for one channel of a write
///
/// The read-only counterpart of [`RxBuffer`], with the same checked and unchecked forms.
#[derive(Clone, Copy)]
pub struct TxBuffer<'a>
{
    ptr: *const c_void,
    len: Option<usize>,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> TxBuffer<'a>
{
    /// Borrow a slice as a write source.
    pub fn new<T: Sample>(buf: &'a [T]) -> TxBuffer<'a>
    {
        TxBuffer
        {
            len: Some(mem::size_of_val(buf)),
            ptr: buf.as_ptr() as *const c_void,
            _marker: PhantomData,
        }
    }

    /// Use a raw address as a write source.
    ///
    /// # Safety
    ///
    /// For every write this buffer is passed to, `ptr` must be valid for reads of `num_elems`
    /// elements of the stream format until the call returns. None of this is checked.
    pub unsafe fn from_raw(ptr: *const c_void) -> TxBuffer<'a>
    {
        TxBuffer { ptr, len: None, _marker: PhantomData }
    }

    /// The source address
    pub fn as_ptr(&self) -> *const c_void
    {
        self.ptr
    }

    /// Size of the borrowed slice in bytes, `None` for raw buffers
    pub fn len_bytes(&self) -> Option<usize>
    {
        self.len
    }
}

// Slice-backed buffers must hold `num_elems` elements; raw ones are the caller's problem.
pub(crate) fn check_capacity(len: Option<usize>, elem_size: Option<usize>, num_elems: usize)
{
    if let (Some(len), Some(elem_size)) = (len, elem_size)
    {
        let needed = num_elems.checked_mul(elem_size);
        assert!(needed.map_or(false, |needed| needed <= len),
                "buffer of {} bytes cannot hold {} elements of {} bytes", len, num_elems, elem_size);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn flag_bits_match_driver_constants()
    {
        assert_eq!(StreamFlags::END_BURST.bits(), 2);
        assert_eq!(StreamFlags::HAS_TIME.bits(), 4);
        assert_eq!(StreamFlags::WAIT_TRIGGER.bits(), 64);
        assert_eq!(StreamFlags::default(), StreamFlags::empty());
        let both = StreamFlags::HAS_TIME | StreamFlags::END_BURST;
        assert_eq!(StreamFlags::from_bits_truncate(both.bits() | 1), both);
    }

    #[test]
    fn result_defaults_are_zero()
    {
        let result = StreamResult::default();
        assert_eq!(result.num_samples, 0);
        assert!(result.flags.is_empty());
        assert_eq!(result.time_ns, 0);
        assert_eq!(result.timeout_us, 0);
        assert_eq!(result.chan_mask, 0);
    }

    #[test]
    fn handles_compare_by_token_not_configuration()
    {
        let a = StreamHandle::new(1, ll::StreamToken(5), Direction::Rx, vec![0], "CF32".into(), Some(8));
        let b = StreamHandle::new(2, ll::StreamToken(5), Direction::Rx, vec![0], "CF32".into(), Some(8));
        let c = StreamHandle::new(1, ll::StreamToken(5), Direction::Tx, vec![1], "CS16".into(), Some(4));
        assert!(a != b);
        assert!(a == c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&c));
        assert!(!set.contains(&b));
    }

    #[test]
    fn slice_buffers_know_their_size()
    {
        let mut samples = [0i16; 10];
        assert_eq!(RxBuffer::new(&mut samples[..]).len_bytes(), Some(20));
        assert_eq!(TxBuffer::new(&samples[..4]).len_bytes(), Some(8));
        let raw = unsafe { TxBuffer::from_raw(samples.as_ptr() as *const c_void) };
        assert_eq!(raw.len_bytes(), None);
    }

    #[test]
    fn capacity_checks()
    {
        check_capacity(Some(16), Some(4), 4);
        check_capacity(None, Some(4), 1 << 20);
        check_capacity(Some(0), None, 100);
    }

    #[test]
    #[should_panic(expected = "cannot hold")]
    fn short_buffer_panics()
    {
        check_capacity(Some(15), Some(4), 4);
    }
}
