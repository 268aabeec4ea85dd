//! Config discovery: find the one configuration type a bot project declares.

use std::io;
use std::path::Path;
use std::sync::Arc;

use surfgram_core::{ManagerError, Result};
use tracing::{debug, info, instrument};

use crate::context::ResolverContext;
use crate::manifest::{is_package, MANIFEST_FILE};
use crate::module::{Module, TypeDef};
use crate::reference::ConfigReference;

/// A configuration type found in a module, under the name it is bound to there.
#[derive(Debug, Clone)]
pub struct ConfigCandidate {
    pub name: String,
    pub def: Arc<TypeDef>,
}

/// Asks the operator to choose among several candidates.
///
/// `candidates` are fully qualified (`module.Name`) and listed in discovery order; the answer
/// is the raw text the operator entered, expected to be a 1-based index.
pub trait ConfigSelector {
    fn select(&mut self, module: &str, candidates: &[String]) -> io::Result<String>;
}

/// Config types in `module`'s namespace, in discovery order.
pub fn discover_candidates(module: &Module) -> Vec<ConfigCandidate> {
    module
        .members()
        .filter_map(|(name, item)| {
            item.as_type()
                .filter(|def| def.is_config())
                .map(|def| ConfigCandidate {
                    name: name.to_string(),
                    def: def.clone(),
                })
        })
        .collect()
}

/// Locates exactly one configuration type inside the package at `bot_dir`.
///
/// Mounts the parent of `bot_dir` on `ctx`, imports the package and scans its namespace.
/// With several candidates, `selector` decides; there is no default choice.
#[instrument(skip(ctx, selector), fields(bot_dir = %bot_dir.display()))]
pub fn resolve(
    ctx: &mut ResolverContext,
    bot_dir: &Path,
    selector: &mut dyn ConfigSelector,
) -> Result<ConfigReference> {
    if !bot_dir.exists() {
        return Err(ManagerError::NotFound {
            path: bot_dir.to_path_buf(),
        });
    }
    let bot_dir = bot_dir.canonicalize()?;
    let dir_name = bot_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !is_package(&bot_dir) {
        return Err(ManagerError::ImportStructure(format!(
            "Directory '{}' is not a Surfgram package\n\
             Solution: Add a {} file to make it a proper package",
            dir_name, MANIFEST_FILE
        )));
    }
    if dir_name.is_empty() || dir_name.contains('.') {
        return Err(ManagerError::ImportStructure(format!(
            "Directory '{}' is not a valid package name\n\
             Solution: Rename it without dots",
            bot_dir.display()
        )));
    }

    if let Some(parent) = bot_dir.parent() {
        ctx.mount(parent);
    }

    let module = ctx.import(&dir_name).map_err(|e| {
        let missing = e.missing_module().map(str::to_string);
        match missing {
            Some(missing) if missing == dir_name => ManagerError::ImportStructure(format!(
                "Failed to import '{}'\n\
                 Possible causes:\n\
                 1. Missing {}\n\
                 2. Incorrect package structure",
                dir_name, MANIFEST_FILE
            )),
            Some(missing) => ManagerError::Dependency {
                module: dir_name.clone(),
                missing,
            },
            None => e,
        }
    })?;

    let candidates = discover_candidates(&module);
    debug!(
        module = %dir_name,
        candidates = ?candidates.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        "Config candidates discovered"
    );

    match candidates.as_slice() {
        [] => Err(ManagerError::NoConfigFound { module: dir_name }),
        [only] => {
            info!(config = %only.name, "Config resolved");
            Ok(ConfigReference::new(dir_name, only.name.clone()))
        }
        many => {
            let listed: Vec<String> = many
                .iter()
                .map(|c| format!("{}.{}", dir_name, c.name))
                .collect();
            let answer = selector.select(&dir_name, &listed)?;
            let index = parse_selection(&answer, many.len())?;
            let chosen = &many[index];
            info!(config = %chosen.name, "Config selected");
            Ok(ConfigReference::new(dir_name, chosen.name.clone()))
        }
    }
}

/// Parses a 1-based selection into a 0-based index.
pub fn parse_selection(answer: &str, max: usize) -> Result<usize> {
    let invalid = || ManagerError::Selection {
        input: answer.to_string(),
        max,
    };
    let choice: usize = answer.trim().parse().map_err(|_| invalid())?;
    if (1..=max).contains(&choice) {
        Ok(choice - 1)
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection_in_range() {
        assert_eq!(parse_selection("1", 3).unwrap(), 0);
        assert_eq!(parse_selection(" 3 ", 3).unwrap(), 2);
    }

    #[test]
    fn test_parse_selection_rejects_invalid() {
        for bad in ["0", "4", "", "abc", "-1", "1.0"] {
            assert!(
                matches!(parse_selection(bad, 3), Err(ManagerError::Selection { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
