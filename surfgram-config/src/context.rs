//! Module search path and module loading.
//!
//! A [`ResolverContext`] owns the search path (mount points), the explicitly registered
//! built-in modules, and a cache of loaded modules. Callers pass the context around instead of
//! relying on process-wide state. It is not meant to be shared between threads.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use surfgram_core::{ManagerError, Result};
use tracing::{debug, instrument};

use crate::manifest::{is_package, Manifest, TypeSpec};
use crate::module::{Item, Module, TypeDef};

pub struct ResolverContext {
    mounts: Vec<PathBuf>,
    builtins: HashMap<String, Arc<Module>>,
    loaded: HashMap<String, Arc<Module>>,
    loading: HashSet<String>,
}

impl Default for ResolverContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverContext {
    /// Context with the framework module registered and an empty search path.
    pub fn new() -> Self {
        let mut ctx = Self::empty();
        ctx.register_builtin(Module::framework());
        ctx
    }

    /// Context with no built-in modules at all.
    pub fn empty() -> Self {
        Self {
            mounts: Vec::new(),
            builtins: HashMap::new(),
            loaded: HashMap::new(),
            loading: HashSet::new(),
        }
    }

    pub fn register_builtin(&mut self, module: Module) {
        self.builtins
            .insert(module.name().to_string(), Arc::new(module));
    }

    /// Adds `dir` to the search path. Mounting the same directory again is a no-op and does not
    /// change its priority: a directory mounted early stays behind later mounts even when it is
    /// mounted again, which matters when one context resolves several projects in turn. Use a
    /// fresh context per project to give its parent the highest priority. Returns whether the
    /// directory was newly added.
    pub fn mount(&mut self, dir: impl Into<PathBuf>) -> bool {
        let dir = dir.into();
        if self.mounts.contains(&dir) {
            return false;
        }
        debug!(dir = %dir.display(), "Mounting module search path");
        self.mounts.push(dir);
        true
    }

    pub fn mount_points(&self) -> &[PathBuf] {
        &self.mounts
    }

    /// Imports `name` (dotted for nested packages), loading its `use` dependencies first.
    ///
    /// A module that cannot be located fails with [`ManagerError::ModuleNotFound`] carrying the
    /// name of the module that was actually missing, which may be a dependency of `name`.
    #[instrument(skip(self))]
    pub fn import(&mut self, name: &str) -> Result<Arc<Module>> {
        if let Some(module) = self.builtins.get(name).or_else(|| self.loaded.get(name)) {
            return Ok(module.clone());
        }
        if self.loading.contains(name) {
            return Err(ManagerError::ImportCycle {
                module: name.to_string(),
            });
        }

        let dir = self.locate(name)?;
        let manifest = Manifest::load(&dir)?;

        self.loading.insert(name.to_string());
        let built = self.build(name, &dir, &manifest);
        self.loading.remove(name);

        let module = Arc::new(built?);
        debug!(module = name, dir = %dir.display(), "Module loaded");
        self.loaded.insert(name.to_string(), module.clone());
        Ok(module)
    }

    fn locate(&mut self, name: &str) -> Result<PathBuf> {
        let not_found = || ManagerError::ModuleNotFound {
            name: name.to_string(),
        };
        if name.is_empty() || name.split('.').any(|seg| !is_identifier(seg)) {
            return Err(not_found());
        }

        match name.rsplit_once('.') {
            Some((parent, last)) => {
                let parent = self.import(parent)?;
                let dir = parent.dir().map(|d| d.join(last)).ok_or_else(not_found)?;
                if is_package(&dir) {
                    Ok(dir)
                } else {
                    Err(not_found())
                }
            }
            None => self
                .mounts
                .iter()
                .rev()
                .map(|mount| mount.join(name))
                .find(|dir| is_package(dir))
                .ok_or_else(not_found),
        }
    }

    fn build(&mut self, name: &str, dir: &Path, manifest: &Manifest) -> Result<Module> {
        let mut namespace = BTreeMap::new();

        for entry in &manifest.uses {
            match entry.rsplit_once('.') {
                Some((module_name, item_name)) => {
                    let module = self.import(module_name)?;
                    let item = module.get(item_name).cloned().ok_or_else(|| {
                        ManagerError::UnknownItem {
                            module: module_name.to_string(),
                            name: item_name.to_string(),
                        }
                    })?;
                    namespace.insert(item_name.to_string(), item);
                }
                None => {
                    self.import(entry)?;
                    namespace.insert(entry.clone(), Item::Module(entry.clone()));
                }
            }
        }

        for (key, value) in &manifest.values {
            namespace.insert(key.clone(), Item::Value(value.clone()));
        }

        let mut types = HashMap::new();
        for type_name in manifest.types.keys() {
            let mut building = Vec::new();
            self.build_type(name, type_name, manifest, &namespace, &mut types, &mut building)?;
        }
        for (type_name, def) in types {
            namespace.insert(type_name, Item::Type(def));
        }

        Ok(Module::new(
            name,
            Some(dir.to_path_buf()),
            namespace,
            manifest.bot_command().map(str::to_string),
        ))
    }

    /// Builds `type_name` and, recursively, any local type it extends.
    fn build_type(
        &mut self,
        module: &str,
        type_name: &str,
        manifest: &Manifest,
        namespace: &BTreeMap<String, Item>,
        types: &mut HashMap<String, Arc<TypeDef>>,
        building: &mut Vec<String>,
    ) -> Result<Arc<TypeDef>> {
        if let Some(def) = types.get(type_name) {
            return Ok(def.clone());
        }
        if building.iter().any(|b| b == type_name) {
            return Err(ManagerError::ImportCycle {
                module: format!("{}.{}", module, type_name),
            });
        }
        let spec: &TypeSpec = &manifest.types[type_name];

        building.push(type_name.to_string());
        let parent = match spec.extends.as_deref() {
            None => None,
            Some(base) => Some(self.resolve_base(
                module, type_name, base, manifest, namespace, types, building,
            )?),
        };
        building.pop();

        let def = Arc::new(TypeDef::new(
            module,
            type_name,
            spec.fields.clone(),
            parent,
        ));
        types.insert(type_name.to_string(), def.clone());
        Ok(def)
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_base(
        &mut self,
        module: &str,
        type_name: &str,
        base: &str,
        manifest: &Manifest,
        namespace: &BTreeMap<String, Item>,
        types: &mut HashMap<String, Arc<TypeDef>>,
        building: &mut Vec<String>,
    ) -> Result<Arc<TypeDef>> {
        let unknown = || ManagerError::UnknownBase {
            type_name: format!("{}.{}", module, type_name),
            base: base.to_string(),
        };

        if manifest.types.contains_key(base) {
            return self.build_type(module, base, manifest, namespace, types, building);
        }
        if let Some(item) = namespace.get(base) {
            return item.as_type().cloned().ok_or_else(unknown);
        }
        match base.rsplit_once('.') {
            Some((base_module, base_name)) => {
                let owner = self.import(base_module)?;
                owner
                    .get(base_name)
                    .and_then(Item::as_type)
                    .cloned()
                    .ok_or_else(unknown)
            }
            None => Err(unknown()),
        }
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
