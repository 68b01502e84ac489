use std::path::Path;

use thiserror::Error;
use wicker_beans::DefinitionRegistry;
use wicker_env::Environment;

use crate::context::{
    CollectingEventListener, Problem, ProblemCollector, ReaderContext, ReaderEvent,
};
use crate::delegate::{is_default_namespace, tokenize, ParserDelegate, BEAN_ELEMENT};
use crate::namespace::NamespaceHandlerRegistry;
use crate::resource::{
    apply_relative_path, FileSystemResourceLoader, Resource, ResourceError, ResourceLoader as _,
};

pub const IMPORT_ELEMENT: &str = "import";
pub const RESOURCE_ATTRIBUTE: &str = "resource";
pub const ALIAS_ELEMENT: &str = "alias";
pub const NAME_ATTRIBUTE: &str = "name";
pub const ALIAS_ATTRIBUTE: &str = "alias";
pub const NESTED_BEANS_ELEMENT: &str = "beans";
pub const PROFILE_ATTRIBUTE: &str = "profile";

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("circular import of {resource}")]
    CircularImport { resource: String },

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("failed to parse XML in {resource}: {source}")]
    Xml {
        resource: String,
        #[source]
        source: roxmltree::Error,
    },
}

/// Read and register every definition in `resource`.
///
/// Problems inside the document (and inside anything it imports) are
/// collected through the context; the returned error covers only failures
/// that prevent the document from being read at all, so import directives
/// can attribute them to the importing element.
pub fn read_resource(
    resource: &Resource,
    ctx: &mut ReaderContext<'_>,
) -> Result<usize, ReadError> {
    let description = resource.description();
    if ctx.in_import_chain(&description) {
        return Err(ReadError::CircularImport {
            resource: description,
        });
    }

    let contents = resource.read_to_string()?;
    let document = roxmltree::Document::parse(&contents).map_err(|source| ReadError::Xml {
        resource: description.clone(),
        source,
    })?;

    let previous = ctx.swap_resource(resource.clone());
    ctx.push_import(description);
    let count = register_document(&document, ctx);
    ctx.pop_import();
    ctx.swap_resource(previous);
    Ok(count)
}

/// Register every definition in an already-parsed document.
///
/// Returns the number of names added to the registry; failures surface only
/// through the context's problem collector.
pub fn register_document(document: &roxmltree::Document<'_>, ctx: &mut ReaderContext<'_>) -> usize {
    let before = ctx.registry.len();
    register_subtree(document.root_element(), None, ctx);
    ctx.registry.len() - before
}

/// The recursive core: process one scope block.
///
/// The caller's delegate arrives as an explicit parameter; the child delegate
/// created here is a local, so sibling subtrees in the caller always see the
/// caller's own defaults.
fn register_subtree(
    root: roxmltree::Node<'_, '_>,
    parent: Option<&ParserDelegate>,
    ctx: &mut ReaderContext<'_>,
) {
    let mut delegate = ParserDelegate::for_element(root, parent, ctx);

    if is_default_namespace(root) {
        if let Some(profile_attr) = root.attribute(PROFILE_ATTRIBUTE) {
            if !profile_attr.trim().is_empty()
                && !ctx.environment.accepts_profiles(&tokenize(profile_attr))
            {
                // A deliberate skip, not an error.
                tracing::debug!(
                    resource = %ctx.resource(),
                    profiles = profile_attr,
                    "skipping definition subtree; no active profile matches"
                );
                return;
            }
        }
    }

    if let Some(hook) = ctx.pre_hook.clone() {
        hook(root, ctx);
    }

    if is_default_namespace(root) {
        for child in root.children().filter(|n| n.is_element()) {
            if is_default_namespace(child) {
                parse_default_element(child, &mut delegate, ctx);
            } else {
                handle_custom_element(child, ctx);
            }
        }
    } else {
        handle_custom_element(root, ctx);
    }

    if let Some(hook) = ctx.post_hook.clone() {
        hook(root, ctx);
    }
}

fn parse_default_element(
    element: roxmltree::Node<'_, '_>,
    delegate: &mut ParserDelegate,
    ctx: &mut ReaderContext<'_>,
) {
    match element.tag_name().name() {
        IMPORT_ELEMENT => import_resource(element, ctx),
        ALIAS_ELEMENT => process_alias(element, ctx),
        BEAN_ELEMENT => process_bean(element, delegate, ctx),
        NESTED_BEANS_ELEMENT => register_subtree(element, Some(&*delegate), ctx),
        other => {
            tracing::trace!(
                element = other,
                "ignoring unrecognized element in the default namespace"
            );
        }
    }
}

fn handle_custom_element(element: roxmltree::Node<'_, '_>, ctx: &mut ReaderContext<'_>) {
    let Some(namespace) = element.tag_name().namespace() else {
        return;
    };
    let handlers = ctx.handlers;
    match handlers.resolve(namespace) {
        Some(handler) => handler.parse_element(element, ctx),
        None => ctx.error(
            format!("no namespace handler registered for '{namespace}'"),
            Some(element),
        ),
    }
}

fn import_resource(element: roxmltree::Node<'_, '_>, ctx: &mut ReaderContext<'_>) {
    let raw_location = element.attribute(RESOURCE_ATTRIBUTE).unwrap_or_default();
    if raw_location.trim().is_empty() {
        ctx.error("import location must not be empty", Some(element));
        return;
    }

    let location = match ctx.environment.resolve_required_placeholders(raw_location) {
        Ok(location) => location,
        Err(err) => {
            ctx.error_caused(
                format!("failed to resolve placeholders in import location '{raw_location}'"),
                Some(element),
                &err,
            );
            return;
        }
    };

    let mut loaded = Vec::new();
    let result = if is_absolute_location(&location) {
        load_from_location(&location, ctx, &mut loaded)
    } else {
        load_relative(&location, ctx, &mut loaded)
    };

    match result {
        Ok(count) => {
            tracing::trace!(count, location = location.as_str(), "imported bean definitions");
            let source = ctx.source_info(Some(element));
            ctx.fire_import_processed(&location, &loaded, source);
        }
        Err(err) => {
            ctx.error_caused(
                format!("failed to import bean definitions from '{location}'"),
                Some(element),
                &err,
            );
        }
    }
}

/// Relative imports resolve in two tiers: directly against the current
/// resource when that yields an existing resource, otherwise by combining
/// the current resource's base location with the relative path. The second
/// tier is the live path for pattern locations (which never exist as a
/// direct file) and for resources without a notion of relatives.
fn load_relative(
    location: &str,
    ctx: &mut ReaderContext<'_>,
    loaded: &mut Vec<Resource>,
) -> Result<usize, ReadError> {
    if let Some(resource) = ctx.resource().create_relative(location) {
        if resource.exists() {
            let count = read_resource(&resource, ctx)?;
            loaded.push(resource);
            return Ok(count);
        }
    }

    let Some(base) = ctx.resource().base_location() else {
        return Err(ReadError::Resource(ResourceError::InvalidLocation {
            location: location.to_string(),
            reason: format!("cannot resolve a relative location from {}", ctx.resource()),
        }));
    };
    let absolute = apply_relative_path(&base, location);
    load_from_location(&absolute, ctx, loaded)
}

fn load_from_location(
    location: &str,
    ctx: &mut ReaderContext<'_>,
    loaded: &mut Vec<Resource>,
) -> Result<usize, ReadError> {
    let resources = ctx.loader.resolve(location)?;
    let mut count = 0;
    for resource in resources {
        count += read_resource(&resource, ctx)?;
        loaded.push(resource);
    }
    Ok(count)
}

fn is_absolute_location(location: &str) -> bool {
    location.starts_with("file:") || has_url_scheme(location) || Path::new(location).is_absolute()
}

fn has_url_scheme(location: &str) -> bool {
    let Some((scheme, rest)) = location.split_once(':') else {
        return false;
    };
    // A single letter is more likely a Windows drive than a URL scheme.
    scheme.len() > 1
        && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
}

fn process_alias(element: roxmltree::Node<'_, '_>, ctx: &mut ReaderContext<'_>) {
    let name = element.attribute(NAME_ATTRIBUTE).unwrap_or_default();
    let alias = element.attribute(ALIAS_ATTRIBUTE).unwrap_or_default();

    let mut valid = true;
    if name.trim().is_empty() {
        ctx.error("alias directive requires a non-empty 'name'", Some(element));
        valid = false;
    }
    if alias.trim().is_empty() {
        ctx.error("alias directive requires a non-empty 'alias'", Some(element));
        valid = false;
    }
    if !valid {
        return;
    }

    match ctx.registry.register_alias(name, alias) {
        Ok(()) => {
            let source = ctx.source_info(Some(element));
            ctx.fire_alias_registered(name, alias, source);
        }
        Err(err) => ctx.error_caused(
            format!("failed to register alias '{alias}' for bean '{name}'"),
            Some(element),
            &err,
        ),
    }
}

fn process_bean(
    element: roxmltree::Node<'_, '_>,
    delegate: &mut ParserDelegate,
    ctx: &mut ReaderContext<'_>,
) {
    let Some(holder) = delegate.parse_bean_element(element, ctx) else {
        return;
    };
    let holder = delegate.decorate_if_required(element, holder, ctx);

    match ctx.registry.register_holder(&holder) {
        Ok(()) => ctx.fire_definition_registered(&holder),
        Err(err) => ctx.error_caused(
            format!("failed to register bean definition '{}'", holder.name),
            Some(element),
            &err,
        ),
    }
}

/// Everything one read produced.
#[derive(Debug)]
pub struct ReadSummary {
    /// Number of definition names added to the registry.
    pub registered: usize,
    pub problems: Vec<Problem>,
    pub events: Vec<ReaderEvent>,
}

/// Read a definition document from a file with default collaborators: a
/// filesystem loader, the built-in namespace handlers, and collecting sinks.
pub fn read_file(
    path: &Path,
    registry: &mut DefinitionRegistry,
    environment: &Environment,
) -> ReadSummary {
    let handlers = NamespaceHandlerRegistry::with_defaults();
    let loader = FileSystemResourceLoader::new();
    let mut events = CollectingEventListener::default();
    let mut problems = ProblemCollector::new();
    let resource = Resource::file(path);

    let registered = {
        let mut ctx = ReaderContext::new(
            resource.clone(),
            environment,
            registry,
            &handlers,
            &loader,
            &mut events,
            &mut problems,
        );
        match read_resource(&resource, &mut ctx) {
            Ok(count) => count,
            Err(err) => {
                ctx.error_caused(
                    format!("failed to load bean definitions from {resource}"),
                    None,
                    &err,
                );
                0
            }
        }
    };

    ReadSummary {
        registered,
        problems: problems.take(),
        events: events.events,
    }
}
