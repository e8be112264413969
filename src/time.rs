//! Tick and nanosecond conversions
//!
//! Both directions split the value into whole seconds and a remainder before touching floating
//! point, so multi-hour tick counts at GHz rates neither overflow nor lose precision. The
//! conversions are lossy when `rate` does not divide one second evenly: a round trip can then
//! land one tick away from where it started. That is rounding, not a bug.

const NS_PER_SEC: i64 = 1_000_000_000;

/// Convert a tick count at `rate` Hz into nanoseconds.
///
/// Rates below 1 Hz, including zero and negative rates, take a plain floating point path that
/// saturates at the ends of the `i64` range.
///
/// ```
/// assert_eq!(sdrsession::time::ticks_to_time_ns(1_000, 1e6), 1_000_000);
/// ```
pub fn ticks_to_time_ns(ticks: i64, rate: f64) -> i64
{
    let rate_int = rate as i64;
    if rate_int <= 0
    {
        return (ticks as f64 * NS_PER_SEC as f64 / rate).round() as i64;
    }
    let full = ticks / rate_int;
    let err = ticks - full * rate_int;
    let part = full as f64 * (rate - rate_int as f64);
    let frac = ((err as f64 - part) * NS_PER_SEC as f64) / rate;
    full.saturating_mul(NS_PER_SEC).saturating_add(frac.round() as i64)
}

/// Convert nanoseconds into a tick count at `rate` Hz.
///
/// ```
/// assert_eq!(sdrsession::time::time_ns_to_ticks(1_000_000, 1e6), 1_000);
/// ```
pub fn time_ns_to_ticks(time_ns: i64, rate: f64) -> i64
{
    let rate_int = rate as i64;
    let full = time_ns / NS_PER_SEC;
    let err = time_ns - full * NS_PER_SEC;
    let part = full as f64 * (rate - rate_int as f64);
    let frac = part + (err as f64 * rate) / NS_PER_SEC as f64;
    full.saturating_mul(rate_int).saturating_add(frac.round() as i64)
}

#[cfg(test)]
mod tests
{
    use super::*;

    const TICKS: &[i64] = &[0, 1, 2, 999, 1_000_001, 123_456_789, -77, 48_000 * 3600];

    #[test]
    fn exact_for_rates_dividing_one_second()
    {
        for &rate in &[1.0, 1e3, 50e3, 1e6, 2e6, 10e6, 1e9]
        {
            for &ticks in TICKS
            {
                let ns = ticks_to_time_ns(ticks, rate);
                assert_eq!(time_ns_to_ticks(ns, rate), ticks, "rate {} ticks {}", rate, ticks);
            }
        }
    }

    #[test]
    fn within_one_tick_for_other_rates()
    {
        for &rate in &[3e6, 48e3, 44.1e3, 61.44e6, 1_234_567.891, 0.5]
        {
            for &ticks in TICKS
            {
                let back = time_ns_to_ticks(ticks_to_time_ns(ticks, rate), rate);
                assert!((back - ticks).abs() <= 1, "rate {} ticks {} came back as {}", rate, ticks, back);
            }
        }
    }

    #[test]
    fn hours_at_gigahertz_rates()
    {
        let rate = 3.2e9;
        let ticks = 6 * 3600 * 3_200_000_000i64;
        assert_eq!(ticks_to_time_ns(ticks, rate), 6 * 3600 * NS_PER_SEC);
        assert_eq!(time_ns_to_ticks(6 * 3600 * NS_PER_SEC, rate), ticks);
    }

    #[test]
    fn known_values()
    {
        assert_eq!(ticks_to_time_ns(1, 3e6), 333);
        assert_eq!(time_ns_to_ticks(1_500_000_000, 1e3), 1_500);
    }

    #[test]
    fn nonpositive_rates_saturate()
    {
        assert_eq!(ticks_to_time_ns(i64::MIN, -1.0), i64::MAX);
        assert_eq!(ticks_to_time_ns(i64::MAX, -1.0), i64::MIN);
        assert_eq!(ticks_to_time_ns(1, -1e6), -1_000);
        assert_eq!(ticks_to_time_ns(5, 0.0), i64::MAX);
        assert_eq!(time_ns_to_ticks(i64::MIN, -1.0), 9_223_372_037);
        assert_eq!(time_ns_to_ticks(1_000, 0.0), 0);
    }
}
