#![warn(missing_docs)]

//! Device and streaming sessions for SDR drivers
//!
//! Drivers are reached through the integer-code boundary in [`ll`]. Everything above it is
//! typed: devices are reference-counted sessions released exactly once, streams are handles
//! that cannot outlive a close, and every streaming call returns an explicit
//! ([`ErrorCode`], [`StreamResult`]) pair.
//!
//! # Example
//!
//! ```
//! use num_complex::Complex32;
//! use std::time::Duration;
//!
//! fn demo() -> sdrsession::Result<()>
//! {
//!     let device = sdrsession::Device::make_from_str("driver=loopback")?;
//!     let args = sdrsession::Kwargs::new();
//!
//!     let mut tx = device.tx_stream::<Complex32>(&[0], &args)?;
//!     let mut rx = device.rx_stream::<Complex32>(&[0], &args)?;
//!     tx.activate(None, 0)?;
//!     rx.activate(None, 0)?;
//!
//!     let tone: Vec<Complex32> = (0..256).map(|i| Complex32::from_polar(0.5, i as f32 * 0.1)).collect();
//!     tx.write_all(&[&tone[..]], None, false, Duration::from_millis(100))?;
//!
//!     let mut received = vec![Complex32::default(); 256];
//!     let result = rx.read(&mut [&mut received[..]], Duration::from_millis(100))?;
//!     assert_eq!(&received[..result.num_samples], &tone[..result.num_samples]);
//!
//!     Ok(())
//! }
//!
//! demo().unwrap();
//! ```

extern crate libc;
#[macro_use] extern crate log;
#[macro_use] extern crate bitflags;

pub use device::Device;
pub use error::{Error, ErrorCode, Result};
pub use format::Sample;
pub use kwargs::{kwargs_from_str, kwargs_to_string, Kwargs};
pub use stream::{Direction, RxBuffer, StreamFlags, StreamHandle, StreamResult, TxBuffer};
pub use streamer::{RxStream, TxStream};

pub mod ll;
pub mod error;
pub mod format;
pub mod time;
pub mod stream;
pub mod device;
pub mod factory;
pub mod streamer;
pub mod kwargs;
pub mod types;
pub mod version;
pub mod drivers;

mod util;
