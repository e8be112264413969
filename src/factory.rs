//! Device construction and the driver registry
//!
//! Drivers are looked up in a process-wide registry seeded with the built-in drivers. Extra
//! drivers can be added at runtime with [`register_driver`].

use crate::device::Device;
use crate::drivers;
use crate::error::{Error, Result};
use crate::kwargs::{kwargs_from_str, kwargs_to_string, Kwargs};
use crate::ll::Driver;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rayon::prelude::*;
use std::sync::Arc;

static REGISTRY: Lazy<RwLock<Vec<Arc<dyn Driver>>>> = Lazy::new(|| RwLock::new(drivers::builtin()));

/// Add a driver to the registry, replacing any driver with the same key.
pub fn register_driver(driver: Arc<dyn Driver>)
{
    let mut registry = REGISTRY.write();
    debug!("registering driver \"{}\"", driver.key());
    match registry.iter().position(|d| d.key() == driver.key())
    {
        Some(i) => registry[i] = driver,
        None => registry.push(driver),
    }
}

/// Keys of every registered driver, in registration order
pub fn drivers() -> Vec<String>
{
    REGISTRY.read().iter().map(|d| d.key().to_string()).collect()
}

fn get_driver(key: &str) -> Option<Arc<dyn Driver>>
{
    REGISTRY.read().iter().find(|d| d.key() == key).cloned()
}

// The driver list is cloned out so no driver code runs under the registry lock.
fn candidates(args: &Kwargs) -> Vec<Arc<dyn Driver>>
{
    match args.get("driver")
    {
        Some(key) => get_driver(key).into_iter().collect(),
        None => REGISTRY.read().clone(),
    }
}

/// List devices matching `args` across the registered drivers.
///
/// A `driver` key restricts the search to that driver.
pub fn enumerate(args: &Kwargs) -> Vec<Kwargs>
{
    candidates(args).iter().flat_map(|d| d.find(args)).collect()
}

/// Construct a device.
///
/// The first driver whose discovery matches `args` makes the device, from its discovery
/// result merged with `args` (the caller's values win).
pub fn make(args: &Kwargs) -> Result<Device>
{
    for driver in candidates(args)
    {
        let found = match driver.find(args).into_iter().next()
        {
            Some(found) => found,
            None => continue,
        };

        let mut merged = found;
        merged.extend(args.iter().map(|(k, v)| (k.clone(), v.clone())));
        debug!("making device with driver \"{}\" from \"{}\"", driver.key(), kwargs_to_string(&merged));

        return match driver.make(&merged)
        {
            Ok(raw) => Ok(Device::from_raw(driver, raw)),
            Err(message) => Err(Error::DriverInit { driver: driver.key().to_string(), message }),
        };
    }
    Err(Error::NoMatchingDriver(kwargs_to_string(args)))
}

/// Construct a device from the flat `key=value, ...` form.
pub fn make_from_str(args: &str) -> Result<Device>
{
    make(&kwargs_from_str(args))
}

/// Construct several devices concurrently.
///
/// The result at index *i* is made from `args_list[i]`. The batch is all-or-nothing: if any
/// entry fails, the error names that entry and every device already made is released again.
/// When several entries fail, which one is reported is unspecified.
pub fn parallel_make(args_list: &[Kwargs]) -> Result<Vec<Device>>
{
    debug!("parallel make of {} devices", args_list.len());
    args_list.par_iter()
        .enumerate()
        .map(|(index, args)| make(args).map_err(|e| Error::ParallelMake { index, source: Box::new(e) }))
        .collect()
}

/// [`parallel_make`] over flat argument strings.
pub fn parallel_make_from_strs<S: AsRef<str>>(args_list: &[S]) -> Result<Vec<Device>>
{
    let parsed: Vec<Kwargs> = args_list.iter().map(|s| kwargs_from_str(s.as_ref())).collect();
    parallel_make(&parsed)
}
