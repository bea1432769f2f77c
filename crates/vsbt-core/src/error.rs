use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address `{0}` must start with 0x")]
    MissingPrefix(String),
    #[error("address `{input}` is not 20 bytes of hex: {reason}")]
    Invalid { input: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,
    #[error("amount `{0}` is not a non-negative decimal number")]
    Invalid(String),
    #[error("amount `{input}` has more than {decimals} fractional digits")]
    TooPrecise { input: String, decimals: u32 },
    #[error("amount `{0}` overflows u128")]
    Overflow(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Address(#[from] AddressError),
}
