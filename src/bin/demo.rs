extern crate sdrsession;

use num_complex::Complex32;
use sdrsession::{Device, Kwargs};
use std::thread;
use std::time::Duration;

const SAMPLES: usize = 100_000;

fn main()
{
    env_logger::init();
    match demo()
    {
        Ok(received) => println!("received {} samples", received),
        Err(e) => eprintln!("demo failed: {}", e),
    }
}

fn demo() -> sdrsession::Result<usize>
{
    let device = Device::make_from_str("driver=loopback, channels=1, rate=2e6")?;
    println!("device: {}", device);

    let mut rx = device.rx_stream::<Complex32>(&[], &Kwargs::new())?;
    let mut tx = device.tx_stream::<Complex32>(&[], &Kwargs::new())?;
    println!("{}", rx);
    println!("{}", tx);

    rx.activate(None, 0)?;
    tx.activate(None, 0)?;

    let writer = thread::spawn(move || -> sdrsession::Result<()>
    {
        let mut phase = 0.0f32;
        let tone: Vec<Complex32> = (0 .. SAMPLES).map(|_|
        {
            phase += 0.01;
            Complex32::from_polar(0.7, phase)
        }).collect();
        tx.write_all(&[&tone[..]], None, true, Duration::from_millis(500))?;
        let status = tx.read_status(Duration::from_millis(500))?;
        println!("burst acknowledged: {:?}", status.flags);
        Ok(tx.close()?)
    });

    let mut buffer = vec![Complex32::default(); rx.mtu()];
    let mut received = 0;
    while received < SAMPLES
    {
        let result = rx.read(&mut [&mut buffer[..]], Duration::from_millis(500))?;
        received += result.num_samples;
    }

    match writer.join()
    {
        Ok(written) => written?,
        Err(_) => eprintln!("writer thread panicked"),
    }
    rx.close()?;
    Ok(received)
}
