//! Binding catalogue files (TOML or JSON)
//!
//! A catalogue lists bound classes declaratively:
//!
//! ```toml
//! [[class]]
//! id = "HTMLElement"
//! host = "HTMLElement"
//!
//! [[class.field]]
//! name = "title"
//! type = "string"
//!
//! [[class.method]]
//! name = "click"
//! ```
//!
//! Methods carry no body; an unknown key anywhere is a parse error.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::TypeDescriptor;
use crate::error::BindingError;
use crate::registry::BindingRegistry;
use crate::types::DeclaredType;

/// Errors that can occur while loading a catalogue
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// Failed to read catalogue file
    #[error("Failed to read catalogue file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse catalogue: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Failed to parse JSON
    #[error("Failed to parse catalogue: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File extension is neither `.toml` nor `.json`
    #[error("Unsupported catalogue format: {0}")]
    UnsupportedFormat(String),

    /// Catalogue content is inconsistent
    #[error("Invalid catalogue: {0}")]
    ValidationError(String),

    /// Descriptor construction or registration failed
    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// A catalogue document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalogue {
    /// Bound classes, in any order
    #[serde(default)]
    pub class: Vec<ClassEntry>,
}

/// One bound class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClassEntry {
    /// Bound class id
    pub id: String,

    /// Host constructor name; absent for abstract bindings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Supertype class id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Constructor parameter types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constructor: Vec<DeclaredType>,

    /// Field declarations
    #[serde(default)]
    pub field: Vec<FieldEntry>,

    /// Native method declarations
    #[serde(default)]
    pub method: Vec<MethodEntry>,
}

/// One field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FieldEntry {
    /// Field name
    pub name: String,

    /// Declared type
    #[serde(rename = "type")]
    pub ty: DeclaredType,

    /// Host property name (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,

    /// Host-side read-only
    #[serde(default)]
    pub read_only: bool,
}

/// One native method declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MethodEntry {
    /// Method name
    pub name: String,

    /// Parameter types
    #[serde(default)]
    pub params: Vec<DeclaredType>,

    /// Return type (defaults to void)
    #[serde(default = "void")]
    pub returns: DeclaredType,

    /// Host operation name (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

fn void() -> DeclaredType {
    DeclaredType::Void
}

impl Catalogue {
    /// Parse a TOML catalogue
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogueError> {
        let catalogue: Catalogue = toml::from_str(content)?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// Parse a JSON catalogue
    pub fn from_json_str(content: &str) -> Result<Self, CatalogueError> {
        let catalogue: Catalogue = serde_json::from_str(content)?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// Load a catalogue file; the extension selects the format
    pub fn from_file(path: &Path) -> Result<Self, CatalogueError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(CatalogueError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Check class ids are present and unique
    pub fn validate(&self) -> Result<(), CatalogueError> {
        let mut seen = rustc_hash::FxHashSet::default();
        for entry in &self.class {
            if entry.id.is_empty() {
                return Err(CatalogueError::ValidationError(
                    "class id cannot be empty".to_string(),
                ));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(CatalogueError::ValidationError(format!(
                    "class '{}' is declared more than once",
                    entry.id
                )));
            }
        }
        Ok(())
    }

    /// Build one descriptor per class, in document order
    pub fn to_descriptors(&self) -> Result<Vec<TypeDescriptor>, CatalogueError> {
        self.class
            .iter()
            .map(|entry| entry.to_descriptor().map_err(CatalogueError::from))
            .collect()
    }

    /// Register every class, supertypes before subtypes.
    ///
    /// Returns the number of classes registered. A class whose supertype is
    /// in neither the catalogue nor the registry fails `MissingSuperType`.
    pub fn register_into(&self, registry: &mut BindingRegistry) -> Result<usize, CatalogueError> {
        let mut pending = self.to_descriptors()?;
        let mut registered = 0;

        while !pending.is_empty() {
            let ready = pending.iter().position(|desc| {
                desc.super_class().map_or(true, |parent| {
                    registry.contains(parent)
                        || !pending.iter().any(|other| other.class_id() == parent)
                })
            });
            // Nothing ready means a cycle; registering anyway reports it
            let index = ready.unwrap_or(0);
            registry.register(pending.remove(index))?;
            registered += 1;
        }

        Ok(registered)
    }
}

impl ClassEntry {
    /// Build the descriptor for this class
    pub fn to_descriptor(&self) -> Result<TypeDescriptor, BindingError> {
        let mut builder = TypeDescriptor::builder(&self.id)
            .constructor_params(self.constructor.iter().cloned());
        if let Some(host) = &self.host {
            builder = builder.host_constructor(host);
        }
        if let Some(parent) = &self.extends {
            builder = builder.extends(parent);
        }
        for field in &self.field {
            let property = field.property.as_deref().unwrap_or(&field.name);
            builder = builder.push_field(&field.name, property, field.ty.clone(), field.read_only);
        }
        for method in &self.method {
            let operation = method.operation.as_deref().unwrap_or(&method.name);
            builder = builder.method_as(
                &method.name,
                operation,
                method.params.iter().cloned(),
                method.returns.clone(),
            );
        }
        builder.build()
    }
}
