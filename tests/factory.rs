extern crate sdrsession;

use pretty_assertions::assert_eq;
use sdrsession::ll::{Driver, RawDevice, StreamToken};
use libc::c_int;
use sdrsession::{factory, kwargs_from_str, Device, Direction, Error, Kwargs};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn init()
{
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Plain(&'static str);

impl RawDevice for Plain
{
    fn driver_key(&self) -> String
    {
        self.0.into()
    }

    fn hardware_key(&self) -> String
    {
        "plain".into()
    }
}

// Counts releases; fails construction when `fail` is present.
struct CountingDriver
{
    key: &'static str,
    made: AtomicUsize,
    released: AtomicUsize,
}

impl Driver for CountingDriver
{
    fn key(&self) -> &str
    {
        self.key
    }

    fn find(&self, args: &Kwargs) -> Vec<Kwargs>
    {
        match args.get("driver")
        {
            Some(key) if key == self.key => vec![Kwargs::new()],
            _ => Vec::new(),
        }
    }

    fn make(&self, args: &Kwargs) -> Result<Box<dyn RawDevice>, String>
    {
        if args.contains_key("fail")
        {
            return Err("refused".into());
        }
        self.made.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Plain("counting")))
    }

    fn unmake(&self, device: Box<dyn RawDevice>) -> Result<(), String>
    {
        drop(device);
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingReleaseDriver
{
    panic: bool,
}

impl Driver for FailingReleaseDriver
{
    fn key(&self) -> &str
    {
        if self.panic { "panicking-release" } else { "failing-release" }
    }

    fn find(&self, args: &Kwargs) -> Vec<Kwargs>
    {
        match args.get("driver")
        {
            Some(key) if key == self.key() => vec![Kwargs::new()],
            _ => Vec::new(),
        }
    }

    fn make(&self, _args: &Kwargs) -> Result<Box<dyn RawDevice>, String>
    {
        Ok(Box::new(Plain("failing")))
    }

    fn unmake(&self, _device: Box<dyn RawDevice>) -> Result<(), String>
    {
        if self.panic
        {
            panic!("release blew up");
        }
        Err("release failed".into())
    }
}

// Streams can be set up but never closed cleanly.
struct StuckStreams;

impl RawDevice for StuckStreams
{
    fn driver_key(&self) -> String
    {
        "stuck-streams".into()
    }

    fn hardware_key(&self) -> String
    {
        "stuck".into()
    }

    fn stream_formats(&self, _direction: c_int, _channel: usize) -> Vec<String>
    {
        vec!["CS16".into()]
    }

    fn setup_stream(&self, _direction: c_int, _format: &str, _channels: &[usize], _args: &Kwargs) -> Result<StreamToken, String>
    {
        Ok(StreamToken(7))
    }

    fn close_stream(&self, _stream: StreamToken) -> Result<(), String>
    {
        Err("stream is wedged".into())
    }
}

struct StuckStreamsDriver;

impl Driver for StuckStreamsDriver
{
    fn key(&self) -> &str
    {
        "stuck-streams"
    }

    fn find(&self, args: &Kwargs) -> Vec<Kwargs>
    {
        match args.get("driver")
        {
            Some(key) if key == self.key() => vec![Kwargs::new()],
            _ => Vec::new(),
        }
    }

    fn make(&self, _args: &Kwargs) -> Result<Box<dyn RawDevice>, String>
    {
        Ok(Box::new(StuckStreams))
    }
}

// Tests run concurrently, so each one registers its own key.
fn counting(key: &'static str) -> Arc<CountingDriver>
{
    let driver = Arc::new(CountingDriver { key, made: AtomicUsize::new(0), released: AtomicUsize::new(0) });
    factory::register_driver(driver.clone());
    driver
}

#[test]
fn make_from_map_and_string()
{
    init();
    let a = Device::make(&kwargs_from_str("driver=null")).unwrap();
    let b = Device::make_from_str("type=null").unwrap();
    assert_eq!(a.get_driver_key(), "null");
    assert_eq!(a.get_hardware_key(), "null");
    assert_eq!(b.to_string(), "null:null");
}

#[test]
fn no_matching_driver()
{
    init();
    match Device::make_from_str("type=nonexistent")
    {
        Err(Error::NoMatchingDriver(args)) => assert_eq!(args, "type=nonexistent"),
        other => panic!("expected NoMatchingDriver, got {:?}", other),
    }
}

#[test]
fn driver_init_failure()
{
    init();
    match Device::make_from_str("driver=loopback, channels=0")
    {
        Err(Error::DriverInit { driver, .. }) => assert_eq!(driver, "loopback"),
        other => panic!("expected DriverInit, got {:?}", other),
    }
}

#[test]
fn parallel_make_preserves_order()
{
    init();
    let args: Vec<Kwargs> = (0 .. 8).map(|i| kwargs_from_str(&format!("driver=loopback, serial={}", i))).collect();
    let devices = Device::parallel_make(&args).unwrap();
    assert_eq!(devices.len(), 8);
    for (i, device) in devices.iter().enumerate()
    {
        assert_eq!(device.get_hardware_info().get("serial"), Some(&i.to_string()));
    }
}

#[test]
fn parallel_make_from_strings()
{
    init();
    let devices = factory::parallel_make_from_strs(&["driver=null", "driver=loopback"]).unwrap();
    assert_eq!(devices[0].get_driver_key(), "null");
    assert_eq!(devices[1].get_driver_key(), "loopback");
    assert!(factory::parallel_make_from_strs::<&str>(&[]).unwrap().is_empty());
}

#[test]
fn parallel_make_is_all_or_nothing()
{
    init();
    let driver = counting("counting-batch");
    let args = vec![
        kwargs_from_str("driver=counting-batch"),
        kwargs_from_str("driver=counting-batch"),
        kwargs_from_str("driver=counting-batch, fail"),
        kwargs_from_str("driver=counting-batch"),
    ];
    match Device::parallel_make(&args)
    {
        Err(Error::ParallelMake { index, source }) =>
        {
            assert_eq!(index, 2);
            match *source
            {
                Error::DriverInit { ref message, .. } => assert_eq!(message, "refused"),
                ref other => panic!("unexpected source {:?}", other),
            }
        },
        other => panic!("expected ParallelMake, got {:?}", other.map(|d| d.len())),
    }
    // Every device that was made has been released again.
    assert_eq!(driver.made.load(Ordering::SeqCst), driver.released.load(Ordering::SeqCst));
}

#[test]
fn release_happens_once_for_all_clones()
{
    init();
    let driver = counting("counting-clones");
    let device = Device::make_from_str("driver=counting-clones").unwrap();
    let clones: Vec<Device> = (0 .. 4).map(|_| device.clone()).collect();
    drop(device);
    assert_eq!(driver.released.load(Ordering::SeqCst), 0);
    drop(clones);
    assert_eq!(driver.made.load(Ordering::SeqCst), 1);
    assert_eq!(driver.released.load(Ordering::SeqCst), 1);
}

#[test]
fn release_failures_are_swallowed()
{
    init();
    factory::register_driver(Arc::new(FailingReleaseDriver { panic: false }));
    factory::register_driver(Arc::new(FailingReleaseDriver { panic: true }));
    drop(Device::make_from_str("driver=failing-release").unwrap());
    drop(Device::make_from_str("driver=panicking-release").unwrap());
}

#[test]
fn equality_is_by_key_not_resource()
{
    init();
    let a = Device::make_from_str("driver=loopback").unwrap();
    let b = Device::make_from_str("driver=loopback").unwrap();
    let c = Device::make_from_str("driver=null").unwrap();
    assert!(a == b);
    assert!(!Device::same_resource(&a, &b));
    assert!(Device::same_resource(&a, &a.clone()));
    assert!(a != c);

    let set: HashSet<Device> = vec![a, b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn enumerate_and_registry()
{
    init();
    let found = Device::enumerate(&kwargs_from_str("type=null"));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("driver").map(String::as_str), Some("null"));

    let all = factory::enumerate(&Kwargs::new());
    assert!(all.iter().any(|k| k.get("driver").map(String::as_str) == Some("loopback")));
    assert!(factory::drivers().iter().any(|k| k == "null"));
}

#[test]
fn failed_close_still_consumes_the_stream()
{
    init();
    factory::register_driver(Arc::new(StuckStreamsDriver));
    let device = Device::make_from_str("driver=stuck-streams").unwrap();
    let handle = device.setup_stream(Direction::Rx, "CS16", &[0], &Kwargs::new()).unwrap();
    assert_eq!(device.get_num_open_streams(), 1);
    match device.close_stream(handle)
    {
        Err(Error::Driver(message)) => assert_eq!(message, "stream is wedged"),
        other => panic!("expected a driver error, got {:?}", other),
    }
    assert_eq!(device.get_num_open_streams(), 0);
    drop(device);
}
