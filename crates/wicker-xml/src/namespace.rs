use std::collections::HashMap;
use std::sync::Arc;

use wicker_beans::{BeanDefinitionHolder, BeanValue};

use crate::context::ReaderContext;

/// Namespace of the built-in shorthand property vocabulary registered by
/// [`NamespaceHandlerRegistry::with_defaults`].
pub const SHORTHAND_PROPERTY_NAMESPACE: &str = "https://wicker-rs.dev/schema/p";

/// Consumes elements and attributes from one custom tag vocabulary.
///
/// Handlers either parse a free-standing element (registering whatever it
/// produces through the context) or decorate an already-parsed definition
/// based on foreign attributes/children attached to a standard bean element.
pub trait NamespaceHandler {
    /// Handle a free-standing element in this handler's namespace.
    fn parse_element(&self, element: roxmltree::Node<'_, '_>, ctx: &mut ReaderContext<'_>);

    /// Decorate a definition for an attribute in this namespace.
    fn decorate_attribute(
        &self,
        attribute: &roxmltree::Attribute<'_, '_>,
        holder: BeanDefinitionHolder,
        ctx: &mut ReaderContext<'_>,
    ) -> BeanDefinitionHolder {
        let _ = (attribute, ctx);
        holder
    }

    /// Decorate a definition for a child element in this namespace.
    fn decorate_element(
        &self,
        element: roxmltree::Node<'_, '_>,
        holder: BeanDefinitionHolder,
        ctx: &mut ReaderContext<'_>,
    ) -> BeanDefinitionHolder {
        let _ = (element, ctx);
        holder
    }
}

/// Handler that deliberately ignores a namespace.
///
/// Bind this to make "ignore that vocabulary" an explicit decision instead of
/// an unresolved-handler problem.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpNamespaceHandler;

impl NamespaceHandler for NoOpNamespaceHandler {
    fn parse_element(&self, element: roxmltree::Node<'_, '_>, _ctx: &mut ReaderContext<'_>) {
        tracing::trace!(
            element = element.tag_name().name(),
            "ignoring element bound to the no-op namespace handler"
        );
    }
}

/// Decorates standard bean elements from shorthand property attributes:
/// `p:host="x"` sets string property `host`, `p:peer-ref="other"` sets
/// reference property `peer`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShorthandPropertyHandler;

impl NamespaceHandler for ShorthandPropertyHandler {
    fn parse_element(&self, element: roxmltree::Node<'_, '_>, ctx: &mut ReaderContext<'_>) {
        ctx.error(
            "the shorthand property namespace defines attributes, not elements",
            Some(element),
        );
    }

    fn decorate_attribute(
        &self,
        attribute: &roxmltree::Attribute<'_, '_>,
        mut holder: BeanDefinitionHolder,
        _ctx: &mut ReaderContext<'_>,
    ) -> BeanDefinitionHolder {
        let value = attribute.value().to_string();
        match attribute.name().strip_suffix("-ref") {
            Some(property) => holder.definition.set_property(property, BeanValue::Ref(value)),
            None => holder
                .definition
                .set_property(attribute.name(), BeanValue::String(value)),
        }
        holder
    }
}

/// Namespace-URI to handler mappings, resolved once per element.
#[derive(Default)]
pub struct NamespaceHandlerRegistry {
    handlers: HashMap<String, Arc<dyn NamespaceHandler>>,
}

impl NamespaceHandlerRegistry {
    /// An empty registry: every custom namespace is unhandled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with the built-in handlers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(SHORTHAND_PROPERTY_NAMESPACE, Arc::new(ShorthandPropertyHandler));
        registry
    }

    pub fn register(&mut self, namespace: impl Into<String>, handler: Arc<dyn NamespaceHandler>) {
        self.handlers.insert(namespace.into(), handler);
    }

    #[must_use]
    pub fn resolve(&self, namespace: &str) -> Option<&dyn NamespaceHandler> {
        self.handlers.get(namespace).map(Arc::as_ref)
    }
}
