//! `surfgram.toml`: the package marker and the declaration of a module's namespace.
//!
//! ```toml
//! use = ["surfgram.BaseConfig", "shared.Limits"]
//!
//! [values]
//! VERSION = "1.0"
//!
//! [types.EchoConfig]
//! extends = "BaseConfig"
//!
//! [types.EchoConfig.fields]
//! bot_token = { env = "BOT_TOKEN" }
//! timeout = "30"
//!
//! [bot]
//! command = "cargo run --quiet"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use surfgram_core::{ManagerError, Result};

/// File whose presence makes a directory an importable package.
pub const MANIFEST_FILE: &str = "surfgram.toml";

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// `"module"` imports a whole module; `"module.Item"` binds `Item` into this namespace.
    #[serde(default, rename = "use")]
    pub uses: Vec<String>,
    #[serde(default)]
    pub values: BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub types: BTreeMap<String, TypeSpec>,
    #[serde(default)]
    pub bot: Option<BotSection>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeSpec {
    /// Local name, name bound by `use`, or qualified `module.Name`.
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
}

/// Default value of a field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    /// Read from an environment variable at instantiation time.
    Env(EnvField),
    Literal(toml::Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvField {
    pub env: String,
    #[serde(default)]
    pub default: Option<toml::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotSection {
    pub command: Option<String>,
}

impl Manifest {
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ManagerError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Reads `<dir>/surfgram.toml`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&path, &content)
    }

    pub fn bot_command(&self) -> Option<&str> {
        self.bot.as_ref().and_then(|b| b.command.as_deref())
    }
}

pub fn is_package(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
}
