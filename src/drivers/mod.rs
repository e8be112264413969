//! Built-in drivers
//!
//! [`null`] is a device that exists but does nothing, and [`loopback`] is an in-memory device
//! that hands transmitted samples back to its receive channels. Both are registered with the
//! factory from the start.

use crate::ll::Driver;
use std::sync::Arc;

pub mod loopback;
pub mod null;

pub(crate) fn builtin() -> Vec<Arc<dyn Driver>>
{
    vec![Arc::new(null::NullDriver), Arc::new(loopback::LoopbackDriver)]
}
