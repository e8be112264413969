//! Typed streams
//!
//! [`RxStream`] and [`TxStream`] own a [`StreamHandle`] together with a clone of the
//! [`Device`] that opened it, so the device stays alive while the stream is open. They track
//! whether the stream is active and close it when dropped.

use crate::device::Device;
use crate::error::{ErrorCode, Result};
use crate::format::Sample;
use crate::kwargs::Kwargs;
use crate::stream::{Direction, RxBuffer, StreamFlags, StreamHandle, StreamResult, TxBuffer};
use crate::util::duration_to_timeout_us;
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

struct Inner
{
    device: Device,
    handle: Option<StreamHandle>,
    args: Kwargs,
    active: bool,
}

impl Inner
{
    fn setup(device: Device, direction: Direction, format: &str, channels: &[usize], args: &Kwargs) -> Result<Inner>
    {
        let handle = device.setup_stream(direction, format, channels, args)?;
        Ok(Inner { device, handle: Some(handle), args: args.clone(), active: false })
    }

    fn handle(&self) -> &StreamHandle
    {
        match self.handle
        {
            Some(ref handle) => handle,
            None => unreachable!("stream used after close"),
        }
    }

    fn activate(&mut self, time_ns: Option<i64>, num_elems: usize) -> std::result::Result<(), ErrorCode>
    {
        let (flags, time_ns) = timed(time_ns);
        self.device.activate_stream(self.handle(), flags, time_ns, num_elems).into_result()?;
        self.active = true;
        Ok(())
    }

    fn deactivate(&mut self, time_ns: Option<i64>) -> std::result::Result<(), ErrorCode>
    {
        let (flags, time_ns) = timed(time_ns);
        self.device.deactivate_stream(self.handle(), flags, time_ns).into_result()?;
        self.active = false;
        Ok(())
    }

    fn close(&mut self) -> Result<()>
    {
        let handle = match self.handle.take()
        {
            Some(handle) => handle,
            None => return Ok(()),
        };
        if self.active
        {
            let code = self.device.deactivate_stream(&handle, StreamFlags::empty(), 0);
            if !code.is_ok()
            {
                warn!("deactivating {} before close: {}", self.device, code);
            }
            self.active = false;
        }
        self.device.close_stream(handle)
    }

    fn describe(&self, f: &mut fmt::Formatter, direction: &str) -> fmt::Result
    {
        match self.handle
        {
            Some(ref handle) => write!(f, "{} {} stream (format: {}, channels: {:?})",
                                       self.device, direction, handle.format(), handle.channels()),
            None => write!(f, "{} closed {} stream", self.device, direction),
        }
    }
}

impl Drop for Inner
{
    fn drop(&mut self)
    {
        if let Err(e) = self.close()
        {
            error!("Error closing stream on {}: {}", self.device, e);
        }
    }
}

fn timed(time_ns: Option<i64>) -> (StreamFlags, i64)
{
    match time_ns
    {
        Some(t) => (StreamFlags::HAS_TIME, t),
        None => (StreamFlags::empty(), 0),
    }
}

fn common_len<I>(mut lens: I, channels: usize) -> usize
    where I: ExactSizeIterator<Item = usize>
{
    assert_eq!(lens.len(), channels, "expected {} buffers, one per stream channel", channels);
    let len = lens.next().unwrap_or(0);
    assert!(lens.all(|l| l == len), "all buffers must have the same length");
    len
}

/// A typed receive stream
pub struct RxStream<T: Sample>
{
    inner: Inner,
    _sample: PhantomData<T>,
}

impl<T: Sample> RxStream<T>
{
    pub(crate) fn setup(device: Device, channels: &[usize], args: &Kwargs) -> Result<RxStream<T>>
    {
        Ok(RxStream { inner: Inner::setup(device, Direction::Rx, T::FORMAT, channels, args)?, _sample: PhantomData })
    }

    /// Channels the stream reads, in buffer order
    pub fn channels(&self) -> &[usize]
    {
        self.inner.handle().channels()
    }

    /// Stream format, always `T::FORMAT`
    pub fn format(&self) -> &str
    {
        self.inner.handle().format()
    }

    /// Arguments the stream was set up with
    pub fn args(&self) -> &Kwargs
    {
        &self.inner.args
    }

    /// Whether the stream is currently active
    pub fn is_active(&self) -> bool
    {
        self.inner.active
    }

    /// The underlying handle, for use with [`Device`] calls
    pub fn handle(&self) -> &StreamHandle
    {
        self.inner.handle()
    }

    /// Preferred maximum elements per read
    pub fn mtu(&self) -> usize
    {
        self.inner.device.get_stream_mtu(self.inner.handle())
    }

    /// Start streaming, optionally at a hardware time, optionally as a burst of `num_elems`.
    pub fn activate(&mut self, time_ns: Option<i64>, num_elems: usize) -> std::result::Result<(), ErrorCode>
    {
        self.inner.activate(time_ns, num_elems)
    }

    /// Stop streaming, optionally at a hardware time.
    pub fn deactivate(&mut self, time_ns: Option<i64>) -> std::result::Result<(), ErrorCode>
    {
        self.inner.deactivate(time_ns)
    }

    /// Read into one slice per channel.
    ///
    /// Returns the result of the call, whose `num_samples` may be smaller than the slices.
    ///
    /// # Panics
    ///
    /// If the number of slices differs from the number of channels or the slices differ in
    /// length.
    pub fn read(&mut self, buffers: &mut [&mut [T]], timeout: Duration) -> std::result::Result<StreamResult, ErrorCode>
    {
        self.read_with(buffers, StreamFlags::empty(), 0, timeout)
    }

    /// Like [`RxStream::read`], handing `flags` and `time_ns` to the driver as well.
    ///
    /// What a driver makes of the inbound values is its own business; most ignore them. The
    /// returned result always carries the flags and time the driver reported.
    pub fn read_with(&mut self, buffers: &mut [&mut [T]], flags: StreamFlags, time_ns: i64, timeout: Duration)
        -> std::result::Result<StreamResult, ErrorCode>
    {
        let num_elems = common_len(buffers.iter().map(|b| b.len()), self.channels().len());
        let mut raw: Vec<RxBuffer<'_>> = buffers.iter_mut().map(|b| RxBuffer::new(&mut **b)).collect();
        let (code, result) = self.inner.device.read_stream(self.inner.handle(), &mut raw, num_elems, flags, time_ns,
                                                           duration_to_timeout_us(timeout));
        code.into_result().map(|()| result)
    }

    /// Close the stream, deactivating it first if needed.
    pub fn close(mut self) -> Result<()>
    {
        self.inner.close()
    }
}

impl<T: Sample> fmt::Display for RxStream<T>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        self.inner.describe(f, "RX")
    }
}

/// A typed transmit stream
pub struct TxStream<T: Sample>
{
    inner: Inner,
    _sample: PhantomData<T>,
}

impl<T: Sample> TxStream<T>
{
    pub(crate) fn setup(device: Device, channels: &[usize], args: &Kwargs) -> Result<TxStream<T>>
    {
        Ok(TxStream { inner: Inner::setup(device, Direction::Tx, T::FORMAT, channels, args)?, _sample: PhantomData })
    }

    /// Channels the stream writes, in buffer order
    pub fn channels(&self) -> &[usize]
    {
        self.inner.handle().channels()
    }

    /// Stream format, always `T::FORMAT`
    pub fn format(&self) -> &str
    {
        self.inner.handle().format()
    }

    /// Arguments the stream was set up with
    pub fn args(&self) -> &Kwargs
    {
        &self.inner.args
    }

    /// Whether the stream is currently active
    pub fn is_active(&self) -> bool
    {
        self.inner.active
    }

    /// The underlying handle, for use with [`Device`] calls
    pub fn handle(&self) -> &StreamHandle
    {
        self.inner.handle()
    }

    /// Preferred maximum elements per write
    pub fn mtu(&self) -> usize
    {
        self.inner.device.get_stream_mtu(self.inner.handle())
    }

    /// Start streaming, optionally at a hardware time.
    pub fn activate(&mut self, time_ns: Option<i64>, num_elems: usize) -> std::result::Result<(), ErrorCode>
    {
        self.inner.activate(time_ns, num_elems)
    }

    /// Stop streaming, optionally at a hardware time.
    pub fn deactivate(&mut self, time_ns: Option<i64>) -> std::result::Result<(), ErrorCode>
    {
        self.inner.deactivate(time_ns)
    }

    /// Write from one slice per channel.
    ///
    /// `at_ns` schedules the transmission at a hardware time; `end_burst` marks the last
    /// write of a burst. The result's `num_samples` may be smaller than the slices.
    ///
    /// # Panics
    ///
    /// If the number of slices differs from the number of channels or the slices differ in
    /// length.
    pub fn write(&mut self, buffers: &[&[T]], at_ns: Option<i64>, end_burst: bool, timeout: Duration)
        -> std::result::Result<StreamResult, ErrorCode>
    {
        let num_elems = common_len(buffers.iter().map(|b| b.len()), self.channels().len());
        let raw: Vec<TxBuffer<'_>> = buffers.iter().map(|b| TxBuffer::new(*b)).collect();
        let (mut flags, time_ns) = timed(at_ns);
        if end_burst
        {
            flags |= StreamFlags::END_BURST;
        }
        let (code, result) = self.inner.device.write_stream(self.inner.handle(), &raw, num_elems, flags, time_ns,
                                                            duration_to_timeout_us(timeout));
        code.into_result().map(|()| result)
    }

    /// Write every element, repeating partial writes.
    ///
    /// The timestamp applies to the first chunk only. `END_BURST` rides along with every
    /// chunk and takes effect with the one that empties the buffers. A write that moves
    /// nothing is reported as `Timeout`.
    pub fn write_all(&mut self, buffers: &[&[T]], at_ns: Option<i64>, end_burst: bool, timeout: Duration)
        -> std::result::Result<(), ErrorCode>
    {
        let total = common_len(buffers.iter().map(|b| b.len()), self.channels().len());
        let mut written = 0;
        let mut at_ns = at_ns;
        while written < total
        {
            let chunk: Vec<&[T]> = buffers.iter().map(|b| &b[written ..]).collect();
            let result = self.write(&chunk, at_ns.take(), end_burst, timeout)?;
            if result.num_samples == 0
            {
                return Err(ErrorCode::Timeout);
            }
            written += result.num_samples;
        }
        Ok(())
    }

    /// Wait for an asynchronous status event such as a burst acknowledgement or underflow.
    pub fn read_status(&mut self, timeout: Duration) -> std::result::Result<StreamResult, ErrorCode>
    {
        let (code, result) = self.inner.device.read_stream_status(self.inner.handle(), duration_to_timeout_us(timeout));
        code.into_result().map(|()| result)
    }

    /// Close the stream, deactivating it first if needed.
    pub fn close(mut self) -> Result<()>
    {
        self.inner.close()
    }
}

impl<T: Sample> fmt::Display for TxStream<T>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        self.inner.describe(f, "TX")
    }
}
