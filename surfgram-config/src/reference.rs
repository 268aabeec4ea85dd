use std::fmt;
use std::str::FromStr;

use surfgram_core::{ManagerError, Result};

/// `module.ClassName`, split on the last `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigReference {
    module: String,
    class: String,
}

impl ConfigReference {
    pub fn new(module: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            class: class.into(),
        }
    }

    /// Rejects references without a separator or with an empty half. Pure string check.
    pub fn parse(reference: &str) -> Result<Self> {
        match reference.rsplit_once('.') {
            Some((module, class)) if !module.is_empty() && !class.is_empty() => {
                Ok(Self::new(module, class))
            }
            _ => Err(ManagerError::Format {
                reference: reference.to_string(),
            }),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn class(&self) -> &str {
        &self.class
    }
}

impl FromStr for ConfigReference {
    type Err = ManagerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ConfigReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.class)
    }
}
