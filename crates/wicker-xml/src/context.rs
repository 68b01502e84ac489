use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use wicker_beans::{BeanDefinitionHolder, DefinitionRegistry};
use wicker_env::Environment;

use crate::namespace::NamespaceHandlerRegistry;
use crate::resource::{Resource, ResourceLoader};

/// Where in which document a directive came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub resource: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// A recoverable problem encountered while reading definitions.
///
/// Problems are collected, never thrown; one bad directive does not abort
/// the rest of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub message: String,
    pub resource: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub cause: Option<String>,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, ":{line}:{column}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " ({cause})")?;
        }
        Ok(())
    }
}

/// Accumulates problems across one read, including recursive imports.
#[derive(Debug, Default)]
pub struct ProblemCollector {
    problems: Vec<Problem>,
}

impl ProblemCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, problem: Problem) {
        tracing::debug!(%problem, "problem reported");
        self.problems.push(problem);
    }

    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn take(&mut self) -> Vec<Problem> {
        std::mem::take(&mut self.problems)
    }
}

/// Notifications emitted once per successfully processed directive.
pub trait ReaderEventListener {
    fn import_processed(&mut self, location: &str, resources: &[Resource], source: &SourceInfo) {
        let _ = (location, resources, source);
    }

    fn alias_registered(&mut self, name: &str, alias: &str, source: &SourceInfo) {
        let _ = (name, alias, source);
    }

    fn definition_registered(&mut self, holder: &BeanDefinitionHolder) {
        let _ = holder;
    }
}

/// Listener that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventListener;

impl ReaderEventListener for NullEventListener {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReaderEvent {
    ImportProcessed {
        location: String,
        resources: Vec<String>,
        source: SourceInfo,
    },
    AliasRegistered {
        name: String,
        alias: String,
        source: SourceInfo,
    },
    DefinitionRegistered {
        name: String,
        aliases: Vec<String>,
    },
}

/// Records events in arrival order.
#[derive(Debug, Default)]
pub struct CollectingEventListener {
    pub events: Vec<ReaderEvent>,
}

impl ReaderEventListener for CollectingEventListener {
    fn import_processed(&mut self, location: &str, resources: &[Resource], source: &SourceInfo) {
        self.events.push(ReaderEvent::ImportProcessed {
            location: location.to_string(),
            resources: resources.iter().map(Resource::description).collect(),
            source: source.clone(),
        });
    }

    fn alias_registered(&mut self, name: &str, alias: &str, source: &SourceInfo) {
        self.events.push(ReaderEvent::AliasRegistered {
            name: name.to_string(),
            alias: alias.to_string(),
            source: source.clone(),
        });
    }

    fn definition_registered(&mut self, holder: &BeanDefinitionHolder) {
        self.events.push(ReaderEvent::DefinitionRegistered {
            name: holder.name.clone(),
            aliases: holder.aliases.clone(),
        });
    }
}

/// Hook invoked before or after a scope block is processed, for callers that
/// convert non-standard content around standard parsing.
pub type SubtreeHook = Arc<dyn Fn(roxmltree::Node<'_, '_>, &mut ReaderContext<'_>)>;

/// State threaded through one top-level read, including every recursive
/// import it triggers. Not shared across independent reads.
pub struct ReaderContext<'a> {
    pub environment: &'a Environment,
    pub registry: &'a mut DefinitionRegistry,
    pub handlers: &'a NamespaceHandlerRegistry,
    pub loader: &'a dyn ResourceLoader,
    pub events: &'a mut dyn ReaderEventListener,
    pub problems: &'a mut ProblemCollector,
    pub pre_hook: Option<SubtreeHook>,
    pub post_hook: Option<SubtreeHook>,
    resource: Resource,
    import_chain: Vec<String>,
}

impl<'a> ReaderContext<'a> {
    pub fn new(
        resource: Resource,
        environment: &'a Environment,
        registry: &'a mut DefinitionRegistry,
        handlers: &'a NamespaceHandlerRegistry,
        loader: &'a dyn ResourceLoader,
        events: &'a mut dyn ReaderEventListener,
        problems: &'a mut ProblemCollector,
    ) -> Self {
        Self {
            environment,
            registry,
            handlers,
            loader,
            events,
            problems,
            pre_hook: None,
            post_hook: None,
            resource,
            import_chain: Vec::new(),
        }
    }

    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub(crate) fn swap_resource(&mut self, resource: Resource) -> Resource {
        std::mem::replace(&mut self.resource, resource)
    }

    pub(crate) fn in_import_chain(&self, description: &str) -> bool {
        self.import_chain.iter().any(|entry| entry == description)
    }

    pub(crate) fn push_import(&mut self, description: String) {
        self.import_chain.push(description);
    }

    pub(crate) fn pop_import(&mut self) {
        self.import_chain.pop();
    }

    /// Positional metadata for `node` within the current resource.
    #[must_use]
    pub fn source_info(&self, node: Option<roxmltree::Node<'_, '_>>) -> SourceInfo {
        let position = node.map(|n| n.document().text_pos_at(n.range().start));
        SourceInfo {
            resource: self.resource.description(),
            line: position.map(|p| p.row),
            column: position.map(|p| p.col),
        }
    }

    /// Report a problem positioned at `node`.
    pub fn error(&mut self, message: impl Into<String>, node: Option<roxmltree::Node<'_, '_>>) {
        self.report(message.into(), node, None);
    }

    /// Report a problem positioned at `node`, carrying an underlying cause.
    pub fn error_caused(
        &mut self,
        message: impl Into<String>,
        node: Option<roxmltree::Node<'_, '_>>,
        cause: &dyn fmt::Display,
    ) {
        self.report(message.into(), node, Some(cause.to_string()));
    }

    fn report(
        &mut self,
        message: String,
        node: Option<roxmltree::Node<'_, '_>>,
        cause: Option<String>,
    ) {
        let source = self.source_info(node);
        self.problems.report(Problem {
            message,
            resource: source.resource,
            line: source.line,
            column: source.column,
            cause,
        });
    }

    pub(crate) fn fire_import_processed(
        &mut self,
        location: &str,
        resources: &[Resource],
        source: SourceInfo,
    ) {
        self.events.import_processed(location, resources, &source);
    }

    pub(crate) fn fire_alias_registered(&mut self, name: &str, alias: &str, source: SourceInfo) {
        self.events.alias_registered(name, alias, &source);
    }

    pub(crate) fn fire_definition_registered(&mut self, holder: &BeanDefinitionHolder) {
        self.events.definition_registered(holder);
    }
}
