//! XML front end for the wicker container.
//!
//! This crate turns declarative XML object-graph descriptions into registered
//! bean definitions:
//! - Resources and a filesystem loader with pattern expansion
//! - A reader context threading the environment, registry, and problem/event
//!   sinks through one read (including recursive imports)
//! - A parser delegate for `bean` elements and inheritable scope defaults
//! - A namespace-handler registry for custom tag vocabularies
//! - The document reader itself: `import`/`alias`/`bean` directives, nested
//!   scope blocks, and profile gating
//!
//! Reading is collect-errors-and-continue: one malformed directive never
//! aborts the rest of a document. Everything recoverable lands in the
//! [`ProblemCollector`]; only failures that prevent a document from being
//! read at all surface as [`ReadError`].

mod context;
mod delegate;
mod namespace;
mod reader;
mod resource;

pub use context::{
    CollectingEventListener, NullEventListener, Problem, ProblemCollector, ReaderContext,
    ReaderEvent, ReaderEventListener, SourceInfo, SubtreeHook,
};
pub use delegate::{is_default_namespace, ParserDelegate, ScopeDefaults, BEANS_NAMESPACE, BEAN_ELEMENT};
pub use namespace::{
    NamespaceHandler, NamespaceHandlerRegistry, NoOpNamespaceHandler, ShorthandPropertyHandler,
    SHORTHAND_PROPERTY_NAMESPACE,
};
pub use reader::{
    read_file, read_resource, register_document, ReadError, ReadSummary, ALIAS_ATTRIBUTE,
    ALIAS_ELEMENT, IMPORT_ELEMENT, NAME_ATTRIBUTE, NESTED_BEANS_ELEMENT, PROFILE_ATTRIBUTE,
    RESOURCE_ATTRIBUTE,
};
pub use resource::{FileSystemResourceLoader, Resource, ResourceError, ResourceLoader};
