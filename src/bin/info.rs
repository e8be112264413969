extern crate sdrsession;

use sdrsession::{factory, kwargs_from_str, kwargs_to_string, version, Device, Direction};

fn main()
{
    env_logger::init();

    println!("library: {} (API {}, ABI {})", version::LIB_VERSION, version::API_VERSION, version::ABI_VERSION);
    println!("drivers: {}", factory::drivers().join(", "));

    let args = kwargs_from_str(&std::env::args().skip(1).collect::<Vec<_>>().join(","));
    for found in Device::enumerate(&args)
    {
        println!("found: {}", kwargs_to_string(&found));
        match Device::make(&found)
        {
            Ok(device) => print_info(&device),
            Err(e) => println!("  make failed: {}", e),
        }
    }
}

fn print_info(device: &Device)
{
    println!("  {}", device);
    println!("  info: {}", kwargs_to_string(&device.get_hardware_info()));
    for &direction in &[Direction::Rx, Direction::Tx]
    {
        for channel in 0 .. device.get_num_channels(direction)
        {
            let (native, full_scale) = device.get_native_stream_format(direction, channel);
            println!("  {} {}: formats [{}], native {} (full scale {}), antennas [{}], gains [{}]",
                     direction, channel,
                     device.get_stream_formats(direction, channel).join(", "),
                     native, full_scale,
                     device.list_antennas(direction, channel).join(", "),
                     device.list_gains(direction, channel).join(", "));
        }
    }
}
