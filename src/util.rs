use crate::error::ErrorCode;
use libc::{c_int, c_long};
use std::time::Duration;

/// Split a driver return value into its outcome and element count.
///
/// This is the only place the signed count-or-error convention is interpreted; the count is
/// zero whenever the code is not `None`.
pub fn split_ret(ret: c_int) -> (ErrorCode, usize)
{
    if ret >= 0
    {
        return (ErrorCode::None, ret as usize);
    }
    (ErrorCode::from_code(ret), 0)
}

pub fn to_driver_result<T>(result: Result<T, String>) -> crate::Result<T>
{
    result.map_err(crate::Error::Driver)
}

pub fn duration_to_timeout_us(duration: Duration) -> i64
{
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}

pub fn timeout_us_to_c(timeout_us: i64) -> c_long
{
    // c_long is 32 bits on some targets
    c_long::try_from(timeout_us).unwrap_or(if timeout_us < 0 { c_long::MIN } else { c_long::MAX })
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn counts_pass_through()
    {
        assert_eq!(split_ret(0), (ErrorCode::None, 0));
        assert_eq!(split_ret(512), (ErrorCode::None, 512));
    }

    #[test]
    fn negative_codes_zero_the_count()
    {
        assert_eq!(split_ret(-1), (ErrorCode::Timeout, 0));
        assert_eq!(split_ret(-5), (ErrorCode::NotSupported, 0));
    }

    #[test]
    fn durations()
    {
        assert_eq!(duration_to_timeout_us(Duration::from_millis(3)), 3000);
        assert_eq!(duration_to_timeout_us(Duration::MAX), i64::MAX);
        assert_eq!(timeout_us_to_c(1000), 1000);
    }
}
