//! # surfgram-config
//!
//! Bot projects are packages: directories holding a `surfgram.toml` manifest that declares a
//! module namespace (imports, values and types). This crate loads those modules through an
//! explicit [`ResolverContext`], discovers the project's configuration type ([`resolve`]) and
//! turns a `module.ClassName` reference into a [`ConfigInstance`] ([`materialize`]).

pub mod context;
pub mod manifest;
pub mod materializer;
pub mod module;
pub mod reference;
pub mod resolver;

pub use context::ResolverContext;
pub use manifest::{is_package, Manifest, MANIFEST_FILE};
pub use materializer::{coerce_numeric, materialize, ConfigInstance, CONFIG_CLASS_ENV, CONFIG_ENV};
pub use module::{Item, Module, TypeDef, BASE_CONFIG};
pub use reference::ConfigReference;
pub use resolver::{discover_candidates, parse_selection, resolve, ConfigCandidate, ConfigSelector};
