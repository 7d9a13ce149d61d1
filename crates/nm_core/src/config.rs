use std::fmt;
use std::str::FromStr;

/// Which layer a resolved setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Manual,
    Variable,
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Manual => write!(f, "manual override"),
            ConfigSource::Variable => write!(f, "configuration variable"),
            ConfigSource::Default => write!(f, "built-in default"),
        }
    }
}

/// One setting with its three possible layers: manual run input, persisted
/// variable, built-in default. The first present layer wins.
#[derive(Debug, Clone)]
pub struct Layered<T> {
    pub manual: Option<T>,
    pub variable: Option<T>,
    pub default: T,
}

impl<T> Layered<T> {
    pub fn new(default: T) -> Self {
        Self {
            manual: None,
            variable: None,
            default,
        }
    }

    pub fn with_manual(mut self, value: Option<T>) -> Self {
        self.manual = value;
        self
    }

    pub fn with_variable(mut self, value: Option<T>) -> Self {
        self.variable = value;
        self
    }

    pub fn resolve(self) -> (T, ConfigSource) {
        if let Some(value) = self.manual {
            (value, ConfigSource::Manual)
        } else if let Some(value) = self.variable {
            (value, ConfigSource::Variable)
        } else {
            (self.default, ConfigSource::Default)
        }
    }
}

/// Parses a raw layer value. Blank input counts as "not set" since schedulers
/// pass empty strings for optional inputs that were left alone.
pub fn parse_layer<T>(raw: Option<&str>, name: &str) -> crate::Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| crate::Error::Config(format!("Invalid value for {}: {} ({})", name, value, e))),
    }
}
