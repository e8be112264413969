//! Argument maps

use std::collections::BTreeMap;

/// Ordered string-keyed argument map used for device and stream arguments
pub type Kwargs = BTreeMap<String, String>;

/// Parse the flat `key=value, key=value` form.
///
/// Keys and values are trimmed, a key without `=` maps to the empty string and empty pairs are
/// skipped. Later duplicates win.
pub fn kwargs_from_str(args: &str) -> Kwargs
{
    let mut kwargs = Kwargs::new();
    for pair in args.split(',')
    {
        let pair = pair.trim();
        if pair.is_empty()
        {
            continue;
        }
        let (key, value) = match pair.split_once('=')
        {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (pair, ""),
        };
        kwargs.insert(key.to_string(), value.to_string());
    }
    kwargs
}

/// Render an argument map back into its flat form.
pub fn kwargs_to_string(kwargs: &Kwargs) -> String
{
    kwargs.iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests
{
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_pairs()
    {
        let kwargs = kwargs_from_str(" driver = loopback ,serial=7,, flag");
        assert_eq!(kwargs.len(), 3);
        assert_eq!(kwargs["driver"], "loopback");
        assert_eq!(kwargs["serial"], "7");
        assert_eq!(kwargs["flag"], "");
    }

    #[test]
    fn value_may_contain_equals()
    {
        let kwargs = kwargs_from_str("mapping=A=B");
        assert_eq!(kwargs["mapping"], "A=B");
    }

    #[test]
    fn to_string_is_parseable()
    {
        let kwargs = kwargs_from_str("type=null,driver=null");
        let flat = kwargs_to_string(&kwargs);
        assert_eq!(flat, "driver=null, type=null");
        assert_eq!(kwargs_from_str(&flat), kwargs);
    }

    #[test]
    fn empty()
    {
        assert!(kwargs_from_str("").is_empty());
        assert_eq!(kwargs_to_string(&Kwargs::new()), "");
    }
}
