use std::path::PathBuf;

use thiserror::Error;

/// Failures of config discovery and materialization.
///
/// Structural variants (`NotFound` .. `NotAClass`) are operator-input problems and carry
/// remediation text in their message. The remaining variants are environment problems and
/// are propagated unchanged by the resolver and materializer.
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Directory not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("{0}")]
    ImportStructure(String),

    #[error("Missing dependency: {missing}\nFix: add a package named '{missing}' next to '{module}' or remove it from `use`")]
    Dependency { module: String, missing: String },

    #[error(
        "No valid config classes found in {module}\n\
         Requirements:\n\
         1. Must extend surfgram.BaseConfig\n\
         2. Must be defined in or imported into {module}/surfgram.toml"
    )]
    NoConfigFound { module: String },

    #[error("Invalid selection '{input}'. Please enter a number between 1 and {max}.")]
    Selection { input: String, max: usize },

    #[error("Invalid config format: '{reference}'\nExpected format: 'module_name.ClassName'")]
    Format { reference: String },

    #[error(
        "Class '{class}' not found in '{module}'\nAvailable classes: {}",
        .available.join(", ")
    )]
    AttributeNotFound {
        class: String,
        module: String,
        available: Vec<String>,
    },

    #[error("'{name}' is not a class")]
    NotAClass { name: String },

    #[error("No module named '{name}'")]
    ModuleNotFound { name: String },

    #[error("Invalid manifest {}: {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Unknown base type '{base}' for '{type_name}'")]
    UnknownBase { type_name: String, base: String },

    #[error("Cannot import name '{name}' from '{module}'")]
    UnknownItem { module: String, name: String },

    #[error("Import cycle detected while loading '{module}'")]
    ImportCycle { module: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ManagerError {
    /// Name of the module an import could not find, if this is such a failure.
    pub fn missing_module(&self) -> Option<&str> {
        match self {
            ManagerError::ModuleNotFound { name } => Some(name),
            _ => None,
        }
    }
}

/// Failures of the bot runtime contract.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Invalid bot command '{command}': {message}")]
    Command { command: String, message: String },

    #[error("Bot process exited with {0}")]
    Exited(std::process::ExitStatus),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ManagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_not_found_lists_available() {
        let err = ManagerError::AttributeNotFound {
            class: "Missing".to_string(),
            module: "echo".to_string(),
            available: vec!["BaseConfig".to_string(), "EchoConfig".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("Class 'Missing' not found in 'echo'"));
        assert!(text.ends_with("Available classes: BaseConfig, EchoConfig"));
    }

    #[test]
    fn test_missing_module() {
        let err = ManagerError::ModuleNotFound {
            name: "shared".to_string(),
        };
        assert_eq!(err.missing_module(), Some("shared"));
        assert!(ManagerError::NotAClass { name: "X".to_string() }
            .missing_module()
            .is_none());
    }
}
