//! The null device
//!
//! Matches only `driver=null` or `type=null`. Streams can be set up, activated and closed, but
//! every transfer reports `NotSupported`. All other calls use the boundary defaults.

use crate::format;
use crate::kwargs::Kwargs;
use crate::ll::{self, Driver, RawDevice, StreamToken};
use libc::{c_int, c_longlong};
use std::sync::atomic::{AtomicUsize, Ordering};

const KEY: &str = "null";

/// Driver for the null device
pub struct NullDriver;

impl Driver for NullDriver
{
    fn key(&self) -> &str
    {
        KEY
    }

    fn find(&self, args: &Kwargs) -> Vec<Kwargs>
    {
        let wanted = args.get("driver").map(String::as_str) == Some(KEY)
            || args.get("type").map(String::as_str) == Some(KEY);
        if !wanted
        {
            return Vec::new();
        }
        let mut found = Kwargs::new();
        found.insert("driver".into(), KEY.into());
        found.insert("type".into(), KEY.into());
        vec![found]
    }

    fn make(&self, _args: &Kwargs) -> Result<Box<dyn RawDevice>, String>
    {
        Ok(Box::new(NullDevice { next_token: AtomicUsize::new(1) }))
    }
}

struct NullDevice
{
    next_token: AtomicUsize,
}

impl RawDevice for NullDevice
{
    fn driver_key(&self) -> String
    {
        KEY.into()
    }

    fn hardware_key(&self) -> String
    {
        KEY.into()
    }

    fn num_channels(&self, _direction: c_int) -> usize
    {
        1
    }

    fn stream_formats(&self, _direction: c_int, _channel: usize) -> Vec<String>
    {
        format::ALL.iter().map(|f| f.to_string()).collect()
    }

    fn native_stream_format(&self, _direction: c_int, _channel: usize, full_scale: &mut f64) -> String
    {
        *full_scale = 32768.0;
        format::CS16.into()
    }

    fn setup_stream(&self, _direction: c_int, _format: &str, _channels: &[usize], _args: &Kwargs)
        -> Result<StreamToken, String>
    {
        Ok(StreamToken(self.next_token.fetch_add(1, Ordering::Relaxed)))
    }

    fn close_stream(&self, _stream: StreamToken) -> Result<(), String>
    {
        Ok(())
    }

    fn stream_mtu(&self, _stream: StreamToken) -> usize
    {
        ll::DEFAULT_MTU
    }

    fn activate_stream(&self, _stream: StreamToken, _flags: c_int, _time_ns: c_longlong, _num_elems: usize) -> c_int
    {
        0
    }

    fn deactivate_stream(&self, _stream: StreamToken, _flags: c_int, _time_ns: c_longlong) -> c_int
    {
        0
    }
}
