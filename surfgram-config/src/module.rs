//! Loaded modules and the items in their namespaces.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::manifest::FieldSpec;

/// Qualified name of the base configuration type every config must extend.
pub const BASE_CONFIG: &str = "surfgram.BaseConfig";

/// Name of the built-in framework module.
pub const FRAMEWORK_MODULE: &str = "surfgram";

/// A type declared by some module, with its single-inheritance parent.
#[derive(Debug)]
pub struct TypeDef {
    module: String,
    name: String,
    fields: BTreeMap<String, FieldSpec>,
    parent: Option<Arc<TypeDef>>,
}

impl TypeDef {
    pub fn new(
        module: impl Into<String>,
        name: impl Into<String>,
        fields: BTreeMap<String, FieldSpec>,
        parent: Option<Arc<TypeDef>>,
    ) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            fields,
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    pub fn parent(&self) -> Option<&Arc<TypeDef>> {
        self.parent.as_ref()
    }

    /// Fields declared on this type only.
    pub fn declared_fields(&self) -> &BTreeMap<String, FieldSpec> {
        &self.fields
    }

    /// This type followed by its ancestors, nearest first.
    pub fn lineage(&self) -> impl Iterator<Item = &TypeDef> {
        std::iter::successors(Some(self), |t| t.parent.as_deref())
    }

    /// True when `qualified` names this type or one of its ancestors.
    pub fn is_subtype_of(&self, qualified: &str) -> bool {
        self.lineage().any(|t| t.qualified_name() == qualified)
    }

    /// Subtype of [`BASE_CONFIG`] that is not `BaseConfig` itself.
    pub fn is_config(&self) -> bool {
        self.qualified_name() != BASE_CONFIG && self.is_subtype_of(BASE_CONFIG)
    }
}

/// Something bound to a name in a module namespace.
#[derive(Debug, Clone)]
pub enum Item {
    Type(Arc<TypeDef>),
    Value(toml::Value),
    /// A whole imported module, by qualified name.
    Module(String),
}

impl Item {
    pub fn as_type(&self) -> Option<&Arc<TypeDef>> {
        match self {
            Item::Type(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Module {
    name: String,
    dir: Option<PathBuf>,
    namespace: BTreeMap<String, Item>,
    bot_command: Option<String>,
}

impl Module {
    pub fn new(
        name: impl Into<String>,
        dir: Option<PathBuf>,
        namespace: BTreeMap<String, Item>,
        bot_command: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            dir,
            namespace,
            bot_command,
        }
    }

    /// The framework module, exporting `BaseConfig` with no fields.
    pub fn framework() -> Self {
        let base = TypeDef::new(FRAMEWORK_MODULE, "BaseConfig", BTreeMap::new(), None);
        let mut namespace = BTreeMap::new();
        namespace.insert("BaseConfig".to_string(), Item::Type(Arc::new(base)));
        Self::new(FRAMEWORK_MODULE, None, namespace, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package directory; `None` for built-in modules.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.namespace.get(name)
    }

    /// Namespace entries in member-scan order (sorted by name).
    pub fn members(&self) -> impl Iterator<Item = (&str, &Item)> {
        self.namespace.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names bound to types, in member-scan order.
    pub fn type_names(&self) -> Vec<String> {
        self.members()
            .filter(|(_, item)| item.as_type().is_some())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    pub fn bot_command(&self) -> Option<&str> {
        self.bot_command.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Arc<TypeDef> {
        Module::framework()
            .get("BaseConfig")
            .and_then(Item::as_type)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_base_config_is_not_a_config() {
        let base = base();
        assert_eq!(base.qualified_name(), BASE_CONFIG);
        assert!(base.is_subtype_of(BASE_CONFIG));
        assert!(!base.is_config());
    }

    #[test]
    fn test_transitive_subtype_is_config() {
        let mid = Arc::new(TypeDef::new("echo", "Mid", BTreeMap::new(), Some(base())));
        let leaf = TypeDef::new("echo", "Leaf", BTreeMap::new(), Some(mid));
        assert!(leaf.is_config());
        let names: Vec<_> = leaf.lineage().map(TypeDef::qualified_name).collect();
        assert_eq!(names, ["echo.Leaf", "echo.Mid", "surfgram.BaseConfig"]);
    }

    #[test]
    fn test_unrelated_type_is_not_config() {
        let helper = TypeDef::new("echo", "Helper", BTreeMap::new(), None);
        assert!(!helper.is_config());
    }
}
