//! Stream sample formats
//!
//! Format identifiers follow the usual SDR naming: an optional `C` for complex interleaved
//! I/Q, a type letter (`F` float, `S` signed, `U` unsigned) and the bit width of one
//! component.

use crate::error::{Error, Result};
use num_complex::Complex;

/// Complex 64-bit floats
pub const CF64: &str = "CF64";
/// Complex 32-bit floats
pub const CF32: &str = "CF32";
/// Complex signed 32-bit integers
pub const CS32: &str = "CS32";
/// Complex unsigned 32-bit integers
pub const CU32: &str = "CU32";
/// Complex signed 16-bit integers
pub const CS16: &str = "CS16";
/// Complex unsigned 16-bit integers
pub const CU16: &str = "CU16";
/// Complex signed 12-bit integers, packed
pub const CS12: &str = "CS12";
/// Complex unsigned 12-bit integers, packed
pub const CU12: &str = "CU12";
/// Complex signed 8-bit integers
pub const CS8: &str = "CS8";
/// Complex unsigned 8-bit integers
pub const CU8: &str = "CU8";
/// Complex signed 4-bit integers, packed
pub const CS4: &str = "CS4";
/// Complex unsigned 4-bit integers, packed
pub const CU4: &str = "CU4";
/// Real 64-bit floats
pub const F64: &str = "F64";
/// Real 32-bit floats
pub const F32: &str = "F32";
/// Real signed 32-bit integers
pub const S32: &str = "S32";
/// Real unsigned 32-bit integers
pub const U32: &str = "U32";
/// Real signed 16-bit integers
pub const S16: &str = "S16";
/// Real unsigned 16-bit integers
pub const U16: &str = "U16";
/// Real signed 8-bit integers
pub const S8: &str = "S8";
/// Real unsigned 8-bit integers
pub const U8: &str = "U8";

/// Every format identifier known to the catalog
pub const ALL: &[&str] = &[
    CF64, CF32, CS32, CU32, CS16, CU16, CS12, CU12, CS8, CU8, CS4, CU4,
    F64, F32, S32, U32, S16, U16, S8, U8,
];

/// Size in bytes of one element of `format`.
///
/// Fails with `UnknownFormat` unless the identifier is well formed and an element occupies a
/// whole number of bytes.
///
/// ```
/// assert_eq!(sdrsession::format::format_to_size("CS16").unwrap(), 4);
/// assert_eq!(sdrsession::format::format_to_size("CS12").unwrap(), 3);
/// assert!(sdrsession::format::format_to_size("CQ16").is_err());
/// ```
pub fn format_to_size(format: &str) -> Result<usize>
{
    let unknown = || Error::UnknownFormat(format.to_string());

    let (components, rest) = match format.strip_prefix('C')
    {
        Some(rest) => (2, rest),
        None => (1, format),
    };
    let mut chars = rest.chars();
    match chars.next()
    {
        Some('F') | Some('S') | Some('U') => {},
        _ => return Err(unknown()),
    }
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(unknown());
    }
    let bits: usize = digits.parse().map_err(|_| unknown())?;
    let total = bits.checked_mul(components).ok_or_else(unknown)?;
    if bits == 0 || total % 8 != 0
    {
        return Err(unknown());
    }
    Ok(total / 8)
}

/// Element types that can be streamed without conversion
///
/// # Safety
///
/// Implementors must be plain data: every bit pattern of `size_of::<Self>()` bytes is a valid
/// value, and that size equals `format_to_size(Self::FORMAT)`. Drivers write raw bytes straight
/// into buffers of these types.
pub unsafe trait Sample: Copy + Default + Send + Sync + 'static
{
    /// Format identifier of one element
    const FORMAT: &'static str;
}

macro_rules! impl_sample {
    ($($t:ty => $real:ident, $complex:ident;)*) => {
        $(
            unsafe impl Sample for $t { const FORMAT: &'static str = $real; }
            unsafe impl Sample for Complex<$t> { const FORMAT: &'static str = $complex; }
        )*
    }
}

impl_sample! {
    f64 => F64, CF64;
    f32 => F32, CF32;
    i32 => S32, CS32;
    u32 => U32, CU32;
    i16 => S16, CS16;
    u16 => U16, CU16;
    i8 => S8, CS8;
    u8 => U8, CU8;
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::mem::size_of;

    #[test]
    fn catalog_sizes()
    {
        let expected = [16, 8, 8, 8, 4, 4, 3, 3, 2, 2, 1, 1, 8, 4, 4, 4, 2, 2, 1, 1];
        for (format, size) in ALL.iter().zip(expected.iter())
        {
            assert_eq!(format_to_size(format).unwrap(), *size, "{}", format);
        }
    }

    #[test]
    fn malformed_formats_are_rejected()
    {
        for format in ["", "C", "CF", "X16", "S4", "S12", "F0", "CF32x", "cf32", "S-8", "CF18446744073709551615", "F99999999999999999999"]
        {
            match format_to_size(format)
            {
                Err(Error::UnknownFormat(f)) => assert_eq!(f, format),
                other => panic!("{:?} gave {:?}", format, other),
            }
        }
    }

    fn check<T: Sample>()
    {
        assert_eq!(format_to_size(T::FORMAT).unwrap(), size_of::<T>(), "{}", T::FORMAT);
    }

    #[test]
    fn sample_types_match_their_format()
    {
        check::<f64>();
        check::<f32>();
        check::<i32>();
        check::<u32>();
        check::<i16>();
        check::<u16>();
        check::<i8>();
        check::<u8>();
        check::<Complex<f64>>();
        check::<Complex<f32>>();
        check::<Complex<i16>>();
        check::<Complex<u8>>();
    }
}
