//! Binding resolution
//!
//! Compiles the configuration of one attribute into a resolution function
//! `(index, element) -> value`. Precedence, first match wins:
//!
//! 1. a binding configured for the element's type-label (or, per attribute, the wildcard)
//! 2. for `label`, the first well-known display property of the element
//! 3. the renderer's default binding

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::binding::{BindingSpec, ConfigurationTable, DefaultBinding, ResolutionFn, attributes};
use crate::graph::{Element, GraphError, Properties, value_to_text};
use crate::grouping::group_target;

/// Property keys tried, in order, when deriving display text
pub const LABEL_KEYS: [&str; 6] = ["name", "title", "text", "description", "caption", "label"];

/// Resolver for one attribute over one configuration table
pub struct BindingResolver<E> {
    attribute: String,
    table: Arc<ConfigurationTable>,
    default: DefaultBinding<E>,
    _element: PhantomData<fn(&E)>,
}

impl<E: Element + 'static> BindingResolver<E> {
    /// Create a resolver for `attribute`
    pub fn new(
        attribute: impl Into<String>,
        table: Arc<ConfigurationTable>,
        default: DefaultBinding<E>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            table,
            default,
            _element: PhantomData,
        }
    }

    /// Resolve the attribute for one element
    pub fn resolve(&self, index: usize, element: &E) -> Result<Value, GraphError> {
        let type_label = element.type_label()?;

        if let Some(spec) = self.table.binding(type_label, &self.attribute) {
            if self.attribute == attributes::PARENT_CONFIGURATION {
                return Ok(group_target(spec, element)
                    .map(|target| Value::String(target.node_id()))
                    .unwrap_or(Value::Null));
            }
            return Ok(evaluate_binding(spec, element));
        }

        if self.attribute == attributes::LABEL {
            return Ok(derive_label(element.properties()).map_or(Value::Null, Value::String));
        }

        Ok(self.default.call(index, element))
    }

    /// Turn the resolver into a shareable resolution function
    pub fn into_resolution_fn(self) -> ResolutionFn<E> {
        Arc::new(move |index: usize, element: &E| self.resolve(index, element))
    }
}

/// Evaluate a binding against an element.
///
/// Computed bindings are invoked and their result used verbatim, property references read the
/// named property (or fall back to the name as a literal), constants are returned as-is.
/// Structured bindings evaluate to an object of their text and nested bindings.
pub fn evaluate_binding(spec: &BindingSpec, element: &dyn Element) -> Value {
    match spec {
        BindingSpec::Constant(value) => value.clone(),
        BindingSpec::Property(name) => element
            .properties()
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::String(name.clone())),
        BindingSpec::Computed(f) => f(element),
        BindingSpec::Structured {
            text,
            configuration,
        } => {
            let mut object = Map::new();
            object.insert(attributes::TEXT.to_string(), Value::String(text.clone()));
            for attribute in configuration.attributes() {
                if let Some(nested) = configuration.get(attribute) {
                    object.insert(attribute.to_string(), evaluate_binding(nested, element));
                }
            }
            Value::Object(object)
        }
    }
}

/// Evaluate a node cell binding.
///
/// A property reference yields the property's value or null; the name is never used as a
/// literal cell.
pub fn evaluate_cell_binding(spec: &BindingSpec, element: &dyn Element) -> Value {
    match spec {
        BindingSpec::Property(name) => element
            .properties()
            .get(name)
            .cloned()
            .unwrap_or(Value::Null),
        other => evaluate_binding(other, element),
    }
}

/// Derive display text from well-known property keys, matched case-insensitively
pub fn derive_label(properties: &Properties) -> Option<String> {
    LABEL_KEYS.iter().find_map(|wanted| {
        // a later key wins when several keys differ only in case
        properties
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value_to_text(value))
    })
}
