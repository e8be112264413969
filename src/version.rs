//! Build metadata

/// Version of the driver boundary in [`crate::ll`]
pub const API_VERSION: &str = "0.8.0";

/// ABI tag drivers are built against; changes whenever [`crate::ll::RawDevice`] changes shape
pub const ABI_VERSION: &str = "0.8-1";

/// Version of this library
pub const LIB_VERSION: &str = env!("CARGO_PKG_VERSION");
