//! Config materialization: turn a `module.ClassName` reference into a field-normalized instance.

use std::collections::BTreeMap;
use std::env;

use serde_json::{Map, Number, Value};
use surfgram_core::{ManagerError, Result};
use tracing::{debug, instrument};

use crate::context::ResolverContext;
use crate::manifest::FieldSpec;
use crate::module::{Item, TypeDef};
use crate::reference::ConfigReference;

/// Environment variable carrying the whole instance as JSON.
pub const CONFIG_ENV: &str = "SURFGRAM_CONFIG";
/// Environment variable carrying the config reference.
pub const CONFIG_CLASS_ENV: &str = "SURFGRAM_CONFIG_CLASS";

/// A materialized configuration. Owned by one run; only the coercion pass mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigInstance {
    reference: ConfigReference,
    type_name: String,
    fields: BTreeMap<String, Value>,
}

impl ConfigInstance {
    pub fn new(
        reference: ConfigReference,
        type_name: impl Into<String>,
        fields: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            reference,
            type_name: type_name.into(),
            fields,
        }
    }

    /// Instantiates `def` with no arguments: defaults merged from the root ancestor down,
    /// environment-backed fields read from the process environment.
    pub fn instantiate(reference: ConfigReference, def: &TypeDef) -> Self {
        let mut lineage: Vec<&TypeDef> = def.lineage().collect();
        lineage.reverse();

        let mut fields = BTreeMap::new();
        for ty in lineage {
            for (name, spec) in ty.declared_fields() {
                fields.insert(name.clone(), field_value(spec));
            }
        }
        Self::new(reference, def.qualified_name(), fields)
    }

    pub fn reference(&self) -> &ConfigReference {
        &self.reference
    }

    /// Qualified name of the type that was instantiated (where it was declared).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Replaces numeric-looking text fields by numbers. See [`coerce_numeric`].
    pub fn coerce_numeric_fields(&mut self) {
        for value in self.fields.values_mut() {
            if let Value::String(text) = value {
                if let Some(number) = coerce_numeric(text) {
                    *value = number;
                }
            }
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }

    /// Environment handed to the bot process: one upper-cased variable per non-null field,
    /// plus [`CONFIG_ENV`] and [`CONFIG_CLASS_ENV`].
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = self
            .fields
            .iter()
            .filter_map(|(name, value)| {
                let text = match value {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((name.to_uppercase(), text))
            })
            .collect();
        vars.push((CONFIG_ENV.to_string(), self.to_json().to_string()));
        vars.push((CONFIG_CLASS_ENV.to_string(), self.reference.to_string()));
        vars
    }
}

/// Loads, validates and instantiates the type named by `reference`, then coerces its fields.
///
/// The reference is parsed before anything is imported. A missing target module is a
/// structural error; any other import failure is returned unchanged.
#[instrument(skip(ctx))]
pub fn materialize(ctx: &mut ResolverContext, reference: &str) -> Result<ConfigInstance> {
    let reference = ConfigReference::parse(reference)?;
    let module_name = reference.module();

    let module = ctx.import(module_name).map_err(|e| {
        if e.missing_module() == Some(module_name) {
            ManagerError::ImportStructure(format!(
                "Module '{}' not found\n\
                 Check:\n\
                 1. Is '{}' a proper Surfgram package?\n\
                 2. Is the package in correct location?",
                module_name, module_name
            ))
        } else {
            e
        }
    })?;

    let item = module
        .get(reference.class())
        .ok_or_else(|| ManagerError::AttributeNotFound {
            class: reference.class().to_string(),
            module: module_name.to_string(),
            available: module.type_names(),
        })?;
    let def = match item {
        Item::Type(def) => def.clone(),
        _ => {
            return Err(ManagerError::NotAClass {
                name: reference.class().to_string(),
            })
        }
    };

    let mut instance = ConfigInstance::instantiate(reference.clone(), &def);
    instance.coerce_numeric_fields();
    debug!(
        config = %reference,
        fields = instance.fields().len(),
        "Config materialized"
    );
    Ok(instance)
}

/// Integer for all-digit text, float for digits with exactly one `.`, otherwise `None`.
///
/// No signs, exponents, booleans or lists. Integers beyond `u64` stay text.
pub fn coerce_numeric(text: &str) -> Option<Value> {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return text
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| text.parse::<u64>().map(Value::from))
            .ok();
    }
    if text.matches('.').count() == 1 {
        let digits = text.replacen('.', "", 1);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return text
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number);
        }
    }
    None
}

fn field_value(spec: &FieldSpec) -> Value {
    match spec {
        FieldSpec::Literal(value) => toml_to_json(value),
        FieldSpec::Env(field) => match env::var(&field.env) {
            Ok(value) => Value::String(value),
            Err(_) => field.default.as_ref().map(toml_to_json).unwrap_or(Value::Null),
        },
    }
}

fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}
