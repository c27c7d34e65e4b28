//! Binding specifications and configuration tables
//!
//! A binding says where one visual attribute of one element type gets its value from. Bindings
//! are grouped per type-label into a [`TypeConfiguration`], and type configurations into a
//! [`ConfigurationTable`] (one table for nodes, one for relationships).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::graph::{Element, GraphError};

/// Type-label of the wildcard entry supplying per-attribute defaults
pub const WILDCARD: &str = "*";

/// Attribute names with special meaning to the resolver
pub mod attributes {
    /// Display text (the store's internal name)
    pub const LABEL: &str = "label";
    /// Public name of the display text attribute
    pub const TEXT: &str = "text";
    /// Grouping attribute producing synthetic parent nodes
    pub const PARENT_CONFIGURATION: &str = "parent_configuration";
    /// Heat attribute shared by nodes and relationships
    pub const HEAT: &str = "heat";
}

/// A unary function computing a value from an element at read time
pub type ComputedFn = Arc<dyn Fn(&dyn Element) -> Value + Send + Sync>;

/// A compiled per-attribute resolution function, as consulted by the renderer
pub type ResolutionFn<E> = Arc<dyn Fn(usize, &E) -> Result<Value, GraphError> + Send + Sync>;

/// One configured value for one (type-label, attribute) pair
#[derive(Clone)]
pub enum BindingSpec {
    /// Used verbatim
    Constant(Value),
    /// Name of a property; falls back to the name itself when the property is absent
    Property(String),
    /// Invoked with the element, result used verbatim
    Computed(ComputedFn),
    /// Group label plus a nested configuration for the group node
    Structured {
        text: String,
        configuration: TypeConfiguration,
    },
}

impl BindingSpec {
    /// A constant binding
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    /// A property reference binding
    pub fn property(name: impl Into<String>) -> Self {
        Self::Property(name.into())
    }

    /// A computed binding
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&dyn Element) -> Value + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    /// A structured parent binding
    pub fn structured(text: impl Into<String>, configuration: TypeConfiguration) -> Self {
        Self::Structured {
            text: text.into(),
            configuration,
        }
    }

    /// Interpret a configuration-document value for `attribute`.
    ///
    /// Strings become property references, mappings under `parent_configuration` become
    /// structured bindings, everything else is a constant.
    pub fn from_value(attribute: &str, value: Value) -> Self {
        match value {
            Value::String(name) => Self::Property(name),
            Value::Object(map) if attribute == attributes::PARENT_CONFIGURATION => {
                Self::structured_from_map(map)
            }
            other => Self::Constant(other),
        }
    }

    /// Split a `{text, ...}` mapping into a structured binding
    pub(crate) fn structured_from_map(map: serde_json::Map<String, Value>) -> Self {
        let mut text = String::new();
        let mut configuration = TypeConfiguration::new();
        for (key, value) in map {
            if key == attributes::TEXT {
                text = crate::graph::value_to_text(&value);
            } else {
                let spec = Self::from_value(&key, value);
                configuration.insert(key, spec);
            }
        }
        Self::Structured {
            text,
            configuration,
        }
    }
}

impl fmt::Debug for BindingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Property(name) => f.debug_tuple("Property").field(name).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
            Self::Structured {
                text,
                configuration,
            } => f
                .debug_struct("Structured")
                .field("text", text)
                .field("configuration", configuration)
                .finish(),
        }
    }
}

/// Attribute → binding record for one type-label
#[derive(Debug, Clone, Default)]
pub struct TypeConfiguration {
    bindings: BTreeMap<String, BindingSpec>,
}

impl TypeConfiguration {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding setter
    pub fn with(mut self, attribute: impl Into<String>, spec: BindingSpec) -> Self {
        self.insert(attribute, spec);
        self
    }

    /// Set the binding for an attribute, replacing any previous one
    pub fn insert(&mut self, attribute: impl Into<String>, spec: BindingSpec) {
        self.bindings.insert(attribute.into(), spec);
    }

    /// The binding for an attribute, if configured
    pub fn get(&self, attribute: &str) -> Option<&BindingSpec> {
        self.bindings.get(attribute)
    }

    /// Whether the attribute is configured
    pub fn contains(&self, attribute: &str) -> bool {
        self.bindings.contains_key(attribute)
    }

    /// Configured attribute names
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Number of configured attributes
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no attribute is configured
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Rename the public `text` attribute to the internal `label` attribute
    pub fn with_text_as_label(mut self) -> Self {
        if let Some(text) = self.bindings.remove(attributes::TEXT) {
            self.bindings.insert(attributes::LABEL.to_string(), text);
        }
        self
    }
}

impl<K: Into<String>> FromIterator<(K, BindingSpec)> for TypeConfiguration {
    fn from_iter<I: IntoIterator<Item = (K, BindingSpec)>>(iter: I) -> Self {
        let mut configuration = Self::new();
        for (attribute, spec) in iter {
            configuration.insert(attribute, spec);
        }
        configuration
    }
}

/// Type-label → configuration mapping for one element category
#[derive(Debug, Clone, Default)]
pub struct ConfigurationTable {
    entries: BTreeMap<String, TypeConfiguration>,
}

impl ConfigurationTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration for a type-label
    pub fn insert(&mut self, type_label: impl Into<String>, configuration: TypeConfiguration) {
        self.entries.insert(type_label.into(), configuration);
    }

    /// Remove the configuration for a type-label
    pub fn remove(&mut self, type_label: &str) -> Option<TypeConfiguration> {
        self.entries.remove(type_label)
    }

    /// The configuration registered for exactly this type-label
    pub fn get(&self, type_label: &str) -> Option<&TypeConfiguration> {
        self.entries.get(type_label)
    }

    /// Whether a type-label has its own entry
    pub fn contains(&self, type_label: &str) -> bool {
        self.entries.contains_key(type_label)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the binding of `attribute` for `type_label`.
    ///
    /// The type's own entry wins; otherwise the wildcard entry supplies the attribute. The
    /// wildcard never supplies `parent_configuration`.
    pub fn binding(&self, type_label: &str, attribute: &str) -> Option<&BindingSpec> {
        if let Some(spec) = self.get(type_label).and_then(|c| c.get(attribute)) {
            return Some(spec);
        }
        if attribute == attributes::PARENT_CONFIGURATION {
            return None;
        }
        self.get(WILDCARD).and_then(|c| c.get(attribute))
    }

    /// Combine two tables; entries of `other` replace entries of `self` with the same type-label
    pub fn merged(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (type_label, configuration) in &other.entries {
            entries.insert(type_label.clone(), configuration.clone());
        }
        Self { entries }
    }
}

/// A library-supplied default binding, declaring whether it takes the element index
pub enum DefaultBinding<E> {
    /// Called with `(index, element)`
    Indexed(Arc<dyn Fn(usize, &E) -> Value + Send + Sync>),
    /// Called with `element` only
    Plain(Arc<dyn Fn(&E) -> Value + Send + Sync>),
}

impl<E> DefaultBinding<E> {
    /// An index-aware default
    pub fn indexed<F>(f: F) -> Self
    where
        F: Fn(usize, &E) -> Value + Send + Sync + 'static,
    {
        Self::Indexed(Arc::new(f))
    }

    /// A default that ignores the index
    pub fn plain<F>(f: F) -> Self
    where
        F: Fn(&E) -> Value + Send + Sync + 'static,
    {
        Self::Plain(Arc::new(f))
    }

    /// A default that always yields null
    pub fn none() -> Self
    where
        E: 'static,
    {
        Self::Plain(Arc::new(|_: &E| Value::Null))
    }

    /// Evaluate the default for one element
    pub fn call(&self, index: usize, element: &E) -> Value {
        match self {
            Self::Indexed(f) => f(index, element),
            Self::Plain(f) => f(element),
        }
    }

    /// Whether the default takes the element index
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed(_))
    }
}

impl<E> Clone for DefaultBinding<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Indexed(f) => Self::Indexed(Arc::clone(f)),
            Self::Plain(f) => Self::Plain(Arc::clone(f)),
        }
    }
}

impl<E> fmt::Debug for DefaultBinding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indexed(_) => f.write_str("DefaultBinding::Indexed(..)"),
            Self::Plain(_) => f.write_str("DefaultBinding::Plain(..)"),
        }
    }
}
