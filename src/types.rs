//! Discovery value types

/// A numeric range with optional step, as reported by drivers
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Range
{
    /// Lower bound
    pub minimum: f64,

    /// Upper bound
    pub maximum: f64,

    /// Resolution, zero when continuous
    pub step: f64,
}

impl Range
{
    /// Create a range
    pub fn new(minimum: f64, maximum: f64, step: f64) -> Range
    {
        Range { minimum, maximum, step }
    }

    /// True when `value` lies within the bounds
    pub fn contains(&self, value: f64) -> bool
    {
        value >= self.minimum && value <= self.maximum
    }
}

/// Value type of an argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum ArgType
{
    Bool,
    Int,
    Float,
    #[default]
    String,
}

/// Description of one argument a driver accepts
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgInfo
{
    /// Key used in the argument map
    pub key: String,

    /// Default value, in its string form
    pub value: String,

    /// Human readable name
    pub name: String,

    /// Human readable description
    pub description: String,

    /// Units of the value, if any
    pub units: String,

    /// Value type
    pub arg_type: ArgType,

    /// Valid range for numeric arguments
    pub range: Range,

    /// Discrete allowed values, empty when unrestricted
    pub options: Vec<String>,

    /// Display names of `options`
    pub option_names: Vec<String>,
}
