extern crate sdrsession;

use num_complex::Complex64;
use pretty_assertions::assert_eq;
use sdrsession::types::{ArgType, Range};
use sdrsession::{Device, Direction, Error, Kwargs};

fn make(args: &str) -> Device
{
    let _ = env_logger::builder().is_test(true).try_init();
    Device::make_from_str(args).unwrap()
}

#[test]
fn identification()
{
    let device = make("driver=loopback, serial=abc, channels=3");
    assert_eq!(device.get_driver_key(), "loopback");
    assert_eq!(device.get_hardware_key(), "loopback");
    assert_eq!(device.get_hardware_info().get("serial").map(String::as_str), Some("abc"));
    assert_eq!(device.to_string(), "loopback:loopback");
    assert_eq!(device.get_num_channels(Direction::Rx), 3);
    assert_eq!(device.get_num_channels(Direction::Tx), 3);
    assert_eq!(device.get_channel_info(Direction::Rx, 2).get("name").map(String::as_str), Some("loop2"));
    assert!(device.get_full_duplex(Direction::Tx, 0));
}

#[test]
fn stream_discovery()
{
    let device = make("driver=loopback, mtu=256");
    let formats = device.get_stream_formats(Direction::Rx, 0);
    assert!(formats.iter().any(|f| f == "CF32"));
    assert!(!formats.iter().any(|f| f == "U8"));
    assert_eq!(device.get_native_stream_format(Direction::Tx, 1), ("CF32".to_string(), 1.0));

    let info = device.get_stream_args_info(Direction::Rx, 0);
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].key, "mtu");
    assert_eq!(info[0].value, "256");
    assert_eq!(info[0].arg_type, ArgType::Int);
}

#[test]
fn antennas()
{
    let device = make("driver=loopback");
    assert_eq!(device.list_antennas(Direction::Rx, 0), vec!["LOOP".to_string()]);
    assert_eq!(device.get_antenna(Direction::Rx, 0), "LOOP");
    device.set_antenna(Direction::Rx, 0, "LOOP").unwrap();
    assert!(matches!(device.set_antenna(Direction::Rx, 0, "RX2"), Err(Error::Driver(_))));
}

#[test]
fn corrections()
{
    let device = make("driver=loopback");
    let (dir, ch) = (Direction::Rx, 1);

    assert!(device.has_dc_offset_mode(dir, ch));
    device.set_dc_offset_mode(dir, ch, true).unwrap();
    assert!(device.get_dc_offset_mode(dir, ch));
    assert!(!device.get_dc_offset_mode(Direction::Tx, ch));

    assert!(device.has_dc_offset(dir, ch));
    device.set_dc_offset(dir, ch, Complex64::new(0.1, -0.2)).unwrap();
    assert_eq!(device.get_dc_offset(dir, ch), Complex64::new(0.1, -0.2));

    assert!(device.has_iq_balance(dir, ch));
    device.set_iq_balance(dir, ch, Complex64::new(1.0, 0.5)).unwrap();
    assert_eq!(device.get_iq_balance(dir, ch), Complex64::new(1.0, 0.5));

    assert!(!device.has_iq_balance_mode(dir, ch));
    assert!(device.set_iq_balance_mode(dir, ch, true).is_err());
    assert!(!device.get_iq_balance_mode(dir, ch));

    assert!(device.has_frequency_correction(dir, ch));
    device.set_frequency_correction(dir, ch, 2.5).unwrap();
    assert_eq!(device.get_frequency_correction(dir, ch), 2.5);
}

#[test]
fn gain_frequency_and_rate()
{
    let device = make("driver=loopback, rate=2e6");
    let (dir, ch) = (Direction::Tx, 0);

    assert_eq!(device.list_gains(dir, ch), vec!["LOOP".to_string()]);
    assert_eq!(device.get_gain_range(dir, ch, "LOOP"), Range::new(0.0, 60.0, 1.0));
    device.set_gain(dir, ch, "LOOP", 30.0).unwrap();
    assert_eq!(device.get_gain(dir, ch, "LOOP"), 30.0);
    assert!(device.set_gain(dir, ch, "LOOP", 61.0).is_err());
    assert!(device.set_gain(dir, ch, "PGA", 1.0).is_err());

    device.set_frequency(dir, ch, 433.92e6, &Kwargs::new()).unwrap();
    assert_eq!(device.get_frequency(dir, ch), 433.92e6);
    assert!(device.get_frequency_range(dir, ch)[0].contains(2.4e9));

    assert_eq!(device.get_sample_rate(dir, ch), 2e6);
    device.set_sample_rate(dir, ch, 10e6).unwrap();
    assert_eq!(device.get_sample_rate(dir, ch), 10e6);
    assert_eq!(device.get_sample_rate(Direction::Rx, ch), 2e6);
    assert!(device.set_sample_rate(dir, ch, 0.0).is_err());
    assert_eq!(device.get_sample_rate_range(dir, ch).len(), 1);
}

#[test]
fn hardware_time()
{
    let device = make("driver=loopback");
    assert!(device.has_hardware_time(""));
    assert!(!device.has_hardware_time("pps"));
    device.set_hardware_time(1_000_000_000, "").unwrap();
    let now = device.get_hardware_time("");
    assert!(now >= 1_000_000_000);
    assert!(device.get_hardware_time("") >= now);
    assert!(device.set_hardware_time(0, "pps").is_err());
}

#[test]
fn null_device_uses_boundary_defaults()
{
    let device = make("driver=null");
    let (dir, ch) = (Direction::Rx, 0);

    assert_eq!(device.get_num_channels(dir), 1);
    assert_eq!(device.get_native_stream_format(dir, ch), ("CS16".to_string(), 32768.0));
    assert!(device.get_hardware_info().is_empty());
    assert!(device.get_frontend_mapping(dir).is_empty());
    assert!(matches!(device.set_frontend_mapping(dir, "A:0"), Err(Error::Driver(_))));
    assert!(!device.get_full_duplex(dir, ch));
    assert!(device.get_stream_args_info(dir, ch).is_empty());

    assert!(!device.has_dc_offset_mode(dir, ch));
    assert!(!device.has_dc_offset(dir, ch));
    assert!(!device.has_iq_balance(dir, ch));
    assert!(!device.has_frequency_correction(dir, ch));
    match device.set_dc_offset(dir, ch, Complex64::new(1.0, 1.0))
    {
        Err(Error::Driver(message)) => assert_eq!(message, "setDCOffset not supported"),
        other => panic!("expected a driver error, got {:?}", other),
    }
    assert_eq!(device.get_dc_offset(dir, ch), Complex64::new(0.0, 0.0));

    assert!(device.list_antennas(dir, ch).is_empty());
    assert!(device.list_gains(dir, ch).is_empty());
    assert_eq!(device.get_gain_range(dir, ch, "X"), Range::default());
    assert_eq!(device.get_frequency(dir, ch), 0.0);
    assert!(device.set_sample_rate(dir, ch, 1e6).is_err());
    assert!(!device.has_hardware_time(""));
    assert_eq!(device.get_hardware_time(""), 0);
}
