//! Bot project scaffolding from the templates embedded in the binary.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir, DirEntry};
use surfgram_core::ManagerError;
use tracing::{debug, info};

static BOT_TEMPLATES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates/bot_structure");

const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Values substituted into `{{ bot_name }}` and `{{ token }}`.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub bot_name: &'a str,
    pub token: &'a str,
}

pub fn render(template: &str, vars: &TemplateVars<'_>) -> String {
    template
        .replace("{{ bot_name }}", vars.bot_name)
        .replace("{{ token }}", vars.token)
}

/// Template path with a trailing `.tmpl` removed.
pub fn output_path(template: &Path) -> PathBuf {
    let text = template.to_string_lossy();
    match text.strip_suffix(TEMPLATE_SUFFIX) {
        Some(stripped) => PathBuf::from(stripped),
        None => template.to_path_buf(),
    }
}

/// Writes every embedded template under `dest`, returning the written paths.
pub fn write_templates(dest: &Path, vars: &TemplateVars<'_>) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    write_dir(&BOT_TEMPLATES, dest, vars, &mut written)?;
    Ok(written)
}

fn write_dir(
    dir: &Dir<'_>,
    dest: &Path,
    vars: &TemplateVars<'_>,
    written: &mut Vec<PathBuf>,
) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in dir.entries() {
        match entry {
            // Entry paths are relative to the template root, so `dest` stays the same.
            DirEntry::Dir(subdir) => write_dir(subdir, dest, vars, written)?,
            DirEntry::File(file) => {
                let path = dest.join(output_path(file.path()));
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let content = match file.contents_utf8() {
                    Some(text) => render(text, vars).into_bytes(),
                    None => file.contents().to_vec(),
                };
                fs::write(&path, content)?;
                debug!(path = %path.display(), "Template written");
                written.push(path);
            }
        }
    }
    Ok(())
}

/// Creates the bot project at `target`.
///
/// When `target` already exists, `confirm_overwrite` decides; declining leaves it untouched
/// and returns `false`.
pub fn create_bot(
    target: &Path,
    vars: &TemplateVars<'_>,
    confirm_overwrite: impl FnOnce(&Path) -> io::Result<bool>,
) -> Result<bool, ManagerError> {
    if target.exists() {
        if !confirm_overwrite(target)? {
            return Ok(false);
        }
        fs::remove_dir_all(target)?;
    }
    let written = write_templates(target, vars)?;
    info!(target = %target.display(), files = written.len(), "Bot project created");
    Ok(true)
}

pub fn delete_bot(target: &Path) -> Result<(), ManagerError> {
    if !target.exists() {
        return Err(ManagerError::NotFound {
            path: target.to_path_buf(),
        });
    }
    fs::remove_dir_all(target)?;
    info!(target = %target.display(), "Bot project deleted");
    Ok(())
}
