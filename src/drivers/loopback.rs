//! The loopback device
//!
//! An in-memory device whose transmit channel *n* feeds receive channel *n* through a bounded
//! byte FIFO. Bytes pass through unconverted, so both ends should use the same format.
//!
//! Device arguments:
//!
//! | key        | default      | meaning                               |
//! |------------|--------------|---------------------------------------|
//! | `channels` | 2            | channels per direction, 1 to 32       |
//! | `mtu`      | 1024         | default stream MTU in elements        |
//! | `capacity` | `mtu * 64`   | FIFO depth per channel in bytes       |
//! | `rate`     | 1e6          | initial sample rate in Hz             |
//! | `serial`   | `"0"`        | reported serial                       |
//!
//! Streams accept an `mtu` argument overriding the device default. Reads and writes block on a
//! condition variable until data or space is available or the timeout expires. Deactivating or
//! closing a stream wakes blocked calls on it, which then return `ERR_STREAM_ERROR`.

use crate::format;
use crate::kwargs::Kwargs;
use crate::ll::{self, Driver, RawDevice, StreamToken};
use crate::time::ticks_to_time_ns;
use crate::types::{ArgInfo, ArgType, Range};
use libc::{c_int, c_long, c_longlong, c_void};
use num_complex::Complex64;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::{BTreeMap, VecDeque};
use std::ptr;
use std::slice;
use std::str::FromStr;
use std::time::{Duration, Instant};

const KEY: &str = "loopback";
const ANTENNA: &str = "LOOP";
const GAIN: &str = "LOOP";
const MAX_CHANNELS: usize = 32;
const FORMATS: &[&str] = &[format::CF64, format::CF32, format::CS16, format::CS8, format::F32, format::S16];

fn gain_range() -> Range
{
    Range::new(0.0, 60.0, 1.0)
}

fn rate_range() -> Range
{
    Range::new(1e3, 100e6, 0.0)
}

fn frequency_range() -> Range
{
    Range::new(0.0, 6e9, 0.0)
}

/// Driver for the loopback device
pub struct LoopbackDriver;

impl Driver for LoopbackDriver
{
    fn key(&self) -> &str
    {
        KEY
    }

    fn find(&self, args: &Kwargs) -> Vec<Kwargs>
    {
        if args.get("type").map_or(false, |t| t != KEY)
        {
            return Vec::new();
        }
        let mut found = Kwargs::new();
        found.insert("driver".into(), KEY.into());
        found.insert("type".into(), KEY.into());
        found.insert("label".into(), "Loopback device".into());
        found.insert("serial".into(), args.get("serial").cloned().unwrap_or_else(|| "0".into()));
        vec![found]
    }

    fn make(&self, args: &Kwargs) -> Result<Box<dyn RawDevice>, String>
    {
        let config = Config::from_args(args)?;
        debug!("loopback device {} with {} channels, capacity {} bytes", config.serial, config.channels, config.capacity);
        Ok(Box::new(LoopbackDevice::new(config)))
    }
}

struct Config
{
    channels: usize,
    mtu: usize,
    capacity: usize,
    rate: f64,
    serial: String,
}

fn parse_arg<T: FromStr>(args: &Kwargs, key: &str, default: T) -> Result<T, String>
{
    match args.get(key)
    {
        Some(value) => value.parse().map_err(|_| format!("invalid value \"{}\" for \"{}\"", value, key)),
        None => Ok(default),
    }
}

impl Config
{
    fn from_args(args: &Kwargs) -> Result<Config, String>
    {
        let channels = parse_arg(args, "channels", 2usize)?;
        if channels == 0 || channels > MAX_CHANNELS
        {
            return Err(format!("channels must be between 1 and {}", MAX_CHANNELS));
        }
        let mtu = parse_arg(args, "mtu", ll::DEFAULT_MTU)?;
        if mtu == 0
        {
            return Err("mtu must be positive".into());
        }
        let capacity = parse_arg(args, "capacity", mtu.saturating_mul(64))?;
        if capacity == 0
        {
            return Err("capacity must be positive".into());
        }
        let rate = parse_arg(args, "rate", 1e6)?;
        if !(rate > 0.0)
        {
            return Err("rate must be positive".into());
        }
        let serial = args.get("serial").cloned().unwrap_or_else(|| "0".into());
        Ok(Config { channels, mtu, capacity, rate, serial })
    }
}

#[derive(Clone)]
struct ChannelSettings
{
    dc_offset_mode: bool,
    dc_offset: Complex64,
    iq_balance: Complex64,
    frequency_correction: f64,
    frequency: f64,
    gain: f64,
    sample_rate: f64,
}

struct Event
{
    flags: c_int,
    chan_mask: usize,
    time_ns: i64,
}

struct Stream
{
    direction: c_int,
    channels: Vec<usize>,
    elem_size: usize,
    mtu: usize,
    active: bool,
    // Elements left in the current receive burst
    burst: Option<usize>,
    ticks: i64,
    events: VecDeque<Event>,
}

impl Stream
{
    fn chan_mask(&self) -> usize
    {
        self.channels.iter().fold(0, |mask, &ch| mask | 1 << ch)
    }
}

struct State
{
    fifos: Vec<VecDeque<u8>>,
    streams: BTreeMap<usize, Stream>,
    next_token: usize,
    // Indexed by direction code, then channel
    settings: [Vec<ChannelSettings>; 2],
    time_base: (i64, Instant),
}

struct LoopbackDevice
{
    config: Config,
    state: Mutex<State>,
    cond: Condvar,
}

fn slot(direction: c_int) -> Option<usize>
{
    match direction
    {
        ll::DIRECTION_TX => Some(0),
        ll::DIRECTION_RX => Some(1),
        _ => None,
    }
}

fn deadline(timeout_us: c_long) -> Instant
{
    Instant::now() + Duration::from_micros(u64::try_from(timeout_us).unwrap_or(0))
}

fn clamp_count(count: usize) -> c_int
{
    c_int::try_from(count).unwrap_or(c_int::MAX)
}

// Move `len` bytes from the front of `fifo` to `dst`.
unsafe fn drain_into(fifo: &mut VecDeque<u8>, dst: *mut u8, len: usize)
{
    let (front, back) = fifo.as_slices();
    let first = front.len().min(len);
    ptr::copy_nonoverlapping(front.as_ptr(), dst, first);
    ptr::copy_nonoverlapping(back.as_ptr(), dst.add(first), len - first);
    fifo.drain(.. len);
}

impl LoopbackDevice
{
    fn new(config: Config) -> LoopbackDevice
    {
        let defaults = ChannelSettings
        {
            dc_offset_mode: false,
            dc_offset: Complex64::new(0.0, 0.0),
            iq_balance: Complex64::new(0.0, 0.0),
            frequency_correction: 0.0,
            frequency: 0.0,
            gain: 0.0,
            sample_rate: config.rate,
        };
        let state = State
        {
            fifos: vec![VecDeque::new(); config.channels],
            streams: BTreeMap::new(),
            next_token: 1,
            settings: [vec![defaults.clone(); config.channels], vec![defaults; config.channels]],
            time_base: (0, Instant::now()),
        };
        LoopbackDevice { config, state: Mutex::new(state), cond: Condvar::new() }
    }

    fn valid(&self, direction: c_int, channel: usize) -> bool
    {
        slot(direction).is_some() && channel < self.config.channels
    }

    fn settings<R>(&self, direction: c_int, channel: usize, f: impl FnOnce(&mut ChannelSettings) -> R) -> Option<R>
    {
        let dir = slot(direction)?;
        let mut state = self.state.lock();
        state.settings[dir].get_mut(channel).map(f)
    }

    fn set<F>(&self, direction: c_int, channel: usize, f: F) -> Result<(), String>
        where F: FnOnce(&mut ChannelSettings)
    {
        self.settings(direction, channel, f).ok_or_else(|| format!("no channel {} in direction {}", channel, direction))
    }

    fn get<R: Default>(&self, direction: c_int, channel: usize, f: impl FnOnce(&ChannelSettings) -> R) -> R
    {
        self.settings(direction, channel, |s| f(s)).unwrap_or_default()
    }

    // Wait until `ready` yields a non-zero element count for the stream, or fail with a code.
    fn wait_for<F>(&self, state: &mut MutexGuard<State>, token: StreamToken, direction: c_int, nbuffs: usize,
                   timeout_us: c_long, ready: F) -> Result<usize, c_int>
        where F: Fn(&State, &Stream) -> usize
    {
        let deadline = deadline(timeout_us);
        loop
        {
            let stream = match state.streams.get(&token.0)
            {
                Some(stream) => stream,
                None => return Err(ll::ERR_STREAM_ERROR),
            };
            if stream.direction != direction || !stream.active || stream.channels.len() != nbuffs
            {
                return Err(ll::ERR_STREAM_ERROR);
            }
            if stream.burst == Some(0)
            {
                return Err(ll::ERR_TIMEOUT);
            }
            let count = ready(state, stream);
            if count > 0
            {
                return Ok(count);
            }
            if self.cond.wait_until(state, deadline).timed_out()
            {
                return Err(ll::ERR_TIMEOUT);
            }
        }
    }
}

impl RawDevice for LoopbackDevice
{
    fn driver_key(&self) -> String
    {
        KEY.into()
    }

    fn hardware_key(&self) -> String
    {
        KEY.into()
    }

    fn hardware_info(&self) -> Kwargs
    {
        let mut info = Kwargs::new();
        info.insert("serial".into(), self.config.serial.clone());
        info.insert("channels".into(), self.config.channels.to_string());
        info.insert("capacity".into(), self.config.capacity.to_string());
        info
    }

    fn num_channels(&self, direction: c_int) -> usize
    {
        match slot(direction)
        {
            Some(_) => self.config.channels,
            None => 0,
        }
    }

    fn channel_info(&self, direction: c_int, channel: usize) -> Kwargs
    {
        let mut info = Kwargs::new();
        if self.valid(direction, channel)
        {
            info.insert("name".into(), format!("loop{}", channel));
        }
        info
    }

    fn full_duplex(&self, direction: c_int, channel: usize) -> bool
    {
        self.valid(direction, channel)
    }

    fn stream_formats(&self, direction: c_int, channel: usize) -> Vec<String>
    {
        if !self.valid(direction, channel)
        {
            return Vec::new();
        }
        FORMATS.iter().map(|f| f.to_string()).collect()
    }

    fn native_stream_format(&self, direction: c_int, channel: usize, full_scale: &mut f64) -> String
    {
        if !self.valid(direction, channel)
        {
            *full_scale = 0.0;
            return String::new();
        }
        *full_scale = 1.0;
        format::CF32.into()
    }

    fn stream_args_info(&self, direction: c_int, channel: usize) -> Vec<ArgInfo>
    {
        if !self.valid(direction, channel)
        {
            return Vec::new();
        }
        vec![ArgInfo
        {
            key: "mtu".into(),
            value: self.config.mtu.to_string(),
            name: "MTU".into(),
            description: "Largest number of elements moved by one read or write".into(),
            units: "elements".into(),
            arg_type: ArgType::Int,
            range: Range::new(1.0, self.config.capacity as f64, 1.0),
            ..ArgInfo::default()
        }]
    }

    fn setup_stream(&self, direction: c_int, format: &str, channels: &[usize], args: &Kwargs) -> Result<StreamToken, String>
    {
        if slot(direction).is_none()
        {
            return Err(format!("invalid direction {}", direction));
        }
        if !FORMATS.contains(&format)
        {
            return Err(format!("format {} not supported", format));
        }
        let elem_size = format::format_to_size(format).map_err(|e| e.to_string())?;
        if channels.is_empty()
        {
            return Err("no channels requested".into());
        }
        let mtu = parse_arg(args, "mtu", self.config.mtu)?;
        if mtu == 0
        {
            return Err("mtu must be positive".into());
        }

        let mut state = self.state.lock();
        for (i, &channel) in channels.iter().enumerate()
        {
            if channel >= self.config.channels
            {
                return Err(format!("no channel {}", channel));
            }
            if channels[.. i].contains(&channel)
            {
                return Err(format!("channel {} requested twice", channel));
            }
            let busy = state.streams.values().any(|s| s.direction == direction && s.channels.contains(&channel));
            if busy
            {
                return Err(format!("channel {} already streaming", channel));
            }
        }

        let token = state.next_token;
        state.next_token += 1;
        state.streams.insert(token, Stream
        {
            direction,
            channels: channels.to_vec(),
            elem_size,
            mtu,
            active: false,
            burst: None,
            ticks: 0,
            events: VecDeque::new(),
        });
        Ok(StreamToken(token))
    }

    fn close_stream(&self, stream: StreamToken) -> Result<(), String>
    {
        let removed = self.state.lock().streams.remove(&stream.0);
        self.cond.notify_all();
        match removed
        {
            Some(_) => Ok(()),
            None => Err(format!("no open stream {}", stream.0)),
        }
    }

    fn stream_mtu(&self, stream: StreamToken) -> usize
    {
        self.state.lock().streams.get(&stream.0).map_or(ll::DEFAULT_MTU, |s| s.mtu)
    }

    fn activate_stream(&self, stream: StreamToken, _flags: c_int, _time_ns: c_longlong, num_elems: usize) -> c_int
    {
        let mut state = self.state.lock();
        let stream = match state.streams.get_mut(&stream.0)
        {
            Some(stream) if !stream.active => stream,
            _ => return ll::ERR_STREAM_ERROR,
        };
        stream.active = true;
        stream.burst = if stream.direction == ll::DIRECTION_RX && num_elems > 0 { Some(num_elems) } else { None };
        0
    }

    fn deactivate_stream(&self, stream: StreamToken, _flags: c_int, _time_ns: c_longlong) -> c_int
    {
        let mut state = self.state.lock();
        let stream = match state.streams.get_mut(&stream.0)
        {
            Some(stream) if stream.active => stream,
            _ => return ll::ERR_STREAM_ERROR,
        };
        stream.active = false;
        stream.burst = None;
        self.cond.notify_all();
        0
    }

    unsafe fn read_stream(&self, stream: StreamToken, buffs: &[*mut c_void], num_elems: usize,
                          flags: &mut c_int, time_ns: &mut c_longlong, timeout_us: c_long) -> c_int
    {
        if num_elems == 0
        {
            return 0;
        }
        let mut state = self.state.lock();
        let available = match self.wait_for(&mut state, stream, ll::DIRECTION_RX, buffs.len(), timeout_us, |st, s| {
            s.channels.iter().map(|&ch| st.fifos[ch].len() / s.elem_size).min().unwrap_or(0)
        })
        {
            Ok(available) => available,
            Err(code) => return code,
        };

        let st = &mut *state;
        let s = match st.streams.get_mut(&stream.0)
        {
            Some(s) => s,
            None => return ll::ERR_STREAM_ERROR,
        };
        let mut count = num_elems.min(s.mtu).min(available);
        if let Some(remaining) = s.burst
        {
            count = count.min(remaining);
        }
        let bytes = count * s.elem_size;
        for (&ch, &dst) in s.channels.iter().zip(buffs)
        {
            drain_into(&mut st.fifos[ch], dst as *mut u8, bytes);
        }

        let rate = st.settings[1][s.channels[0]].sample_rate;
        *time_ns = ticks_to_time_ns(s.ticks, rate);
        *flags = ll::FLAG_HAS_TIME;
        s.ticks += count as i64;
        if let Some(ref mut remaining) = s.burst
        {
            *remaining -= count;
            if *remaining == 0
            {
                *flags |= ll::FLAG_END_BURST;
            }
        }
        self.cond.notify_all();
        clamp_count(count)
    }

    unsafe fn write_stream(&self, stream: StreamToken, buffs: &[*const c_void], num_elems: usize,
                           flags: &mut c_int, time_ns: c_longlong, timeout_us: c_long) -> c_int
    {
        if num_elems == 0
        {
            return 0;
        }
        let capacity = self.config.capacity;
        let mut state = self.state.lock();
        let space = match self.wait_for(&mut state, stream, ll::DIRECTION_TX, buffs.len(), timeout_us, |st, s| {
            s.channels.iter().map(|&ch| (capacity - st.fifos[ch].len()) / s.elem_size).min().unwrap_or(0)
        })
        {
            Ok(space) => space,
            Err(code) => return code,
        };

        let st = &mut *state;
        let s = match st.streams.get_mut(&stream.0)
        {
            Some(s) => s,
            None => return ll::ERR_STREAM_ERROR,
        };
        let count = num_elems.min(space);
        let bytes = count * s.elem_size;
        for (&ch, &src) in s.channels.iter().zip(buffs)
        {
            st.fifos[ch].extend(slice::from_raw_parts(src as *const u8, bytes));
        }

        if count < num_elems
        {
            *flags &= !ll::FLAG_END_BURST;
        }
        else if *flags & ll::FLAG_END_BURST != 0
        {
            let timed = *flags & ll::FLAG_HAS_TIME != 0;
            let event = Event
            {
                flags: ll::FLAG_END_BURST | if timed { ll::FLAG_HAS_TIME } else { 0 },
                chan_mask: s.chan_mask(),
                time_ns: if timed { time_ns } else { 0 },
            };
            s.events.push_back(event);
        }
        self.cond.notify_all();
        clamp_count(count)
    }

    fn read_stream_status(&self, stream: StreamToken, chan_mask: &mut usize, flags: &mut c_int,
                          time_ns: &mut c_longlong, timeout_us: c_long) -> c_int
    {
        let deadline = deadline(timeout_us);
        let mut state = self.state.lock();
        loop
        {
            let s = match state.streams.get_mut(&stream.0)
            {
                Some(s) => s,
                None => return ll::ERR_STREAM_ERROR,
            };
            if s.direction != ll::DIRECTION_TX
            {
                return ll::ERR_NOT_SUPPORTED;
            }
            if let Some(event) = s.events.pop_front()
            {
                *chan_mask = event.chan_mask;
                *flags = event.flags;
                *time_ns = event.time_ns;
                return 0;
            }
            if self.cond.wait_until(&mut state, deadline).timed_out()
            {
                return ll::ERR_TIMEOUT;
            }
        }
    }

    fn list_antennas(&self, direction: c_int, channel: usize) -> Vec<String>
    {
        if !self.valid(direction, channel)
        {
            return Vec::new();
        }
        vec![ANTENNA.into()]
    }

    fn set_antenna(&self, direction: c_int, channel: usize, name: &str) -> Result<(), String>
    {
        if !self.valid(direction, channel) || name != ANTENNA
        {
            return Err(format!("no antenna \"{}\" on channel {}", name, channel));
        }
        Ok(())
    }

    fn antenna(&self, direction: c_int, channel: usize) -> String
    {
        if !self.valid(direction, channel)
        {
            return String::new();
        }
        ANTENNA.into()
    }

    fn has_dc_offset_mode(&self, direction: c_int, channel: usize) -> bool
    {
        self.valid(direction, channel)
    }

    fn set_dc_offset_mode(&self, direction: c_int, channel: usize, automatic: bool) -> Result<(), String>
    {
        self.set(direction, channel, |s| s.dc_offset_mode = automatic)
    }

    fn dc_offset_mode(&self, direction: c_int, channel: usize) -> bool
    {
        self.get(direction, channel, |s| s.dc_offset_mode)
    }

    fn has_dc_offset(&self, direction: c_int, channel: usize) -> bool
    {
        self.valid(direction, channel)
    }

    fn set_dc_offset(&self, direction: c_int, channel: usize, offset: Complex64) -> Result<(), String>
    {
        self.set(direction, channel, |s| s.dc_offset = offset)
    }

    fn dc_offset(&self, direction: c_int, channel: usize) -> Complex64
    {
        self.get(direction, channel, |s| s.dc_offset)
    }

    fn has_iq_balance(&self, direction: c_int, channel: usize) -> bool
    {
        self.valid(direction, channel)
    }

    fn set_iq_balance(&self, direction: c_int, channel: usize, balance: Complex64) -> Result<(), String>
    {
        self.set(direction, channel, |s| s.iq_balance = balance)
    }

    fn iq_balance(&self, direction: c_int, channel: usize) -> Complex64
    {
        self.get(direction, channel, |s| s.iq_balance)
    }

    fn has_frequency_correction(&self, direction: c_int, channel: usize) -> bool
    {
        self.valid(direction, channel)
    }

    fn set_frequency_correction(&self, direction: c_int, channel: usize, value: f64) -> Result<(), String>
    {
        self.set(direction, channel, |s| s.frequency_correction = value)
    }

    fn frequency_correction(&self, direction: c_int, channel: usize) -> f64
    {
        self.get(direction, channel, |s| s.frequency_correction)
    }

    fn list_gains(&self, direction: c_int, channel: usize) -> Vec<String>
    {
        if !self.valid(direction, channel)
        {
            return Vec::new();
        }
        vec![GAIN.into()]
    }

    fn set_gain(&self, direction: c_int, channel: usize, name: &str, value: f64) -> Result<(), String>
    {
        if name != GAIN
        {
            return Err(format!("no gain element \"{}\"", name));
        }
        if !gain_range().contains(value)
        {
            return Err(format!("gain {} dB out of range", value));
        }
        self.set(direction, channel, |s| s.gain = value)
    }

    fn gain(&self, direction: c_int, channel: usize, name: &str) -> f64
    {
        if name != GAIN
        {
            return 0.0;
        }
        self.get(direction, channel, |s| s.gain)
    }

    fn gain_range(&self, direction: c_int, channel: usize, name: &str) -> Range
    {
        if name != GAIN || !self.valid(direction, channel)
        {
            return Range::default();
        }
        gain_range()
    }

    fn set_frequency(&self, direction: c_int, channel: usize, frequency: f64, _args: &Kwargs) -> Result<(), String>
    {
        if !frequency_range().contains(frequency)
        {
            return Err(format!("frequency {} Hz out of range", frequency));
        }
        self.set(direction, channel, |s| s.frequency = frequency)
    }

    fn frequency(&self, direction: c_int, channel: usize) -> f64
    {
        self.get(direction, channel, |s| s.frequency)
    }

    fn frequency_range(&self, direction: c_int, channel: usize) -> Vec<Range>
    {
        if !self.valid(direction, channel)
        {
            return Vec::new();
        }
        vec![frequency_range()]
    }

    fn set_sample_rate(&self, direction: c_int, channel: usize, rate: f64) -> Result<(), String>
    {
        if !rate_range().contains(rate)
        {
            return Err(format!("sample rate {} Hz out of range", rate));
        }
        self.set(direction, channel, |s| s.sample_rate = rate)
    }

    fn sample_rate(&self, direction: c_int, channel: usize) -> f64
    {
        self.get(direction, channel, |s| s.sample_rate)
    }

    fn sample_rate_range(&self, direction: c_int, channel: usize) -> Vec<Range>
    {
        if !self.valid(direction, channel)
        {
            return Vec::new();
        }
        vec![rate_range()]
    }

    fn has_hardware_time(&self, what: &str) -> bool
    {
        what.is_empty()
    }

    fn hardware_time(&self, what: &str) -> c_longlong
    {
        if !what.is_empty()
        {
            return 0;
        }
        let (base, since) = self.state.lock().time_base;
        let elapsed = i64::try_from(since.elapsed().as_nanos()).unwrap_or(i64::MAX);
        base.saturating_add(elapsed)
    }

    fn set_hardware_time(&self, time_ns: c_longlong, what: &str) -> Result<(), String>
    {
        if !what.is_empty()
        {
            return Err(format!("no time source \"{}\"", what));
        }
        self.state.lock().time_base = (time_ns, Instant::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::kwargs::kwargs_from_str;

    fn make(args: &str) -> Box<dyn RawDevice>
    {
        LoopbackDriver.make(&kwargs_from_str(args)).unwrap()
    }

    #[test]
    fn rejects_bad_arguments()
    {
        for args in &["channels=0", "channels=33", "channels=two", "mtu=0", "rate=-1", "capacity=0"]
        {
            assert!(LoopbackDriver.make(&kwargs_from_str(args)).is_err(), "{}", args);
        }
    }

    #[test]
    fn find_respects_type()
    {
        assert_eq!(LoopbackDriver.find(&Kwargs::new()).len(), 1);
        assert!(LoopbackDriver.find(&kwargs_from_str("type=null")).is_empty());
        let found = LoopbackDriver.find(&kwargs_from_str("serial=12"));
        assert_eq!(found[0].get("serial").map(String::as_str), Some("12"));
    }

    #[test]
    fn one_stream_per_channel_and_direction()
    {
        let device = make("channels=2");
        let rx = device.setup_stream(ll::DIRECTION_RX, format::CF32, &[0], &Kwargs::new()).unwrap();
        assert!(device.setup_stream(ll::DIRECTION_RX, format::CF32, &[0, 1], &Kwargs::new()).is_err());
        assert!(device.setup_stream(ll::DIRECTION_TX, format::CF32, &[0], &Kwargs::new()).is_ok());
        assert!(device.setup_stream(ll::DIRECTION_RX, format::CF32, &[1, 1], &Kwargs::new()).is_err());
        assert!(device.setup_stream(ll::DIRECTION_RX, format::CF32, &[2], &Kwargs::new()).is_err());
        device.close_stream(rx).unwrap();
        assert!(device.setup_stream(ll::DIRECTION_RX, format::CF32, &[0, 1], &Kwargs::new()).is_ok());
    }

    #[test]
    fn fifo_wraps_around()
    {
        let mut fifo: VecDeque<u8> = VecDeque::with_capacity(4);
        fifo.extend([1, 2, 3]);
        fifo.drain(.. 2);
        fifo.extend([4, 5, 6]);
        let mut out = [0u8; 3];
        unsafe { drain_into(&mut fifo, out.as_mut_ptr(), 3) };
        assert_eq!(out, [3, 4, 5]);
        assert_eq!(fifo.iter().copied().collect::<Vec<_>>(), vec![6]);
    }

    #[test]
    fn stream_mtu_argument()
    {
        let device = make("mtu=256");
        let a = device.setup_stream(ll::DIRECTION_RX, format::CS16, &[0], &Kwargs::new()).unwrap();
        let b = device.setup_stream(ll::DIRECTION_RX, format::CS16, &[1], &kwargs_from_str("mtu=64")).unwrap();
        assert_eq!(device.stream_mtu(a), 256);
        assert_eq!(device.stream_mtu(b), 64);
    }
}
