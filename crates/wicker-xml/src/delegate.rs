use std::collections::HashSet;

use wicker_beans::{
    AutowireMode, BeanDefinition, BeanDefinitionHolder, BeanScope, BeanValue, ConstructorArg,
    MapEntry, PropertyValue,
};

use crate::context::ReaderContext;

/// Namespace of the built-in definition vocabulary. Elements with no
/// namespace at all are treated as built-in too.
pub const BEANS_NAMESPACE: &str = "https://wicker-rs.dev/schema/beans";

pub const BEAN_ELEMENT: &str = "bean";

pub(crate) const DEFAULT_TOKEN: &str = "default";

const MULTI_VALUE_DELIMITERS: &[char] = &[',', ';', ' '];

#[must_use]
pub fn is_default_namespace(node: roxmltree::Node<'_, '_>) -> bool {
    match node.tag_name().namespace() {
        None => true,
        Some(namespace) => namespace == BEANS_NAMESPACE,
    }
}

/// Split a delimited attribute value (comma, semicolon, or space separated).
#[must_use]
pub(crate) fn tokenize(value: &str) -> Vec<&str> {
    value
        .split(MULTI_VALUE_DELIMITERS)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

fn child_elements<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn attr_non_empty(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// `*`-wildcard matching for autowire-candidate patterns: `x*`, `*x`, `*x*`,
/// or an exact name.
fn simple_match(pattern: &str, value: &str) -> bool {
    if let Some(middle) = pattern
        .strip_prefix('*')
        .and_then(|p| p.strip_suffix('*'))
    {
        return value.contains(middle);
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return value.ends_with(suffix);
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return value.starts_with(prefix);
    }
    pattern == value
}

/// Defaults carried by one scope block, inherited by nested blocks unless
/// overridden locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeDefaults {
    pub lazy_init: bool,
    pub merge: bool,
    pub autowire: AutowireMode,
    pub autowire_candidates: Option<Vec<String>>,
    pub init_method: Option<String>,
    pub destroy_method: Option<String>,
}

impl ScopeDefaults {
    fn from_element(
        root: roxmltree::Node<'_, '_>,
        parent: Option<&ScopeDefaults>,
        ctx: &mut ReaderContext<'_>,
    ) -> Self {
        let fallback = parent.cloned().unwrap_or_default();
        let mut defaults = ScopeDefaults::default();

        defaults.lazy_init = parse_default_bool(
            root.attribute("default-lazy-init"),
            fallback.lazy_init,
            "default-lazy-init",
            root,
            ctx,
        );
        defaults.merge = parse_default_bool(
            root.attribute("default-merge"),
            fallback.merge,
            "default-merge",
            root,
            ctx,
        );

        defaults.autowire = match root.attribute("default-autowire") {
            None => fallback.autowire,
            Some(raw) if raw.is_empty() || raw == DEFAULT_TOKEN => fallback.autowire,
            Some(raw) => match parse_autowire(raw) {
                Some(mode) => mode,
                None => {
                    ctx.error(
                        format!("invalid default-autowire value '{raw}'"),
                        Some(root),
                    );
                    fallback.autowire
                }
            },
        };

        defaults.autowire_candidates = match root.attribute("default-autowire-candidates") {
            None => fallback.autowire_candidates,
            Some(raw) if raw.is_empty() || raw == DEFAULT_TOKEN => fallback.autowire_candidates,
            Some(raw) => Some(tokenize(raw).into_iter().map(str::to_string).collect()),
        };

        defaults.init_method = match root.attribute("default-init-method") {
            None => fallback.init_method,
            Some(raw) => non_empty(raw),
        };
        defaults.destroy_method = match root.attribute("default-destroy-method") {
            None => fallback.destroy_method,
            Some(raw) => non_empty(raw),
        };

        defaults
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_default_bool(
    raw: Option<&str>,
    fallback: bool,
    attribute: &str,
    root: roxmltree::Node<'_, '_>,
    ctx: &mut ReaderContext<'_>,
) -> bool {
    match raw {
        None => fallback,
        Some("") | Some(DEFAULT_TOKEN) => fallback,
        Some("true") => true,
        Some("false") => false,
        Some(other) => {
            ctx.error(format!("invalid {attribute} value '{other}'"), Some(root));
            fallback
        }
    }
}

fn parse_autowire(raw: &str) -> Option<AutowireMode> {
    match raw {
        "no" => Some(AutowireMode::No),
        "byName" => Some(AutowireMode::ByName),
        "byType" => Some(AutowireMode::ByType),
        "constructor" => Some(AutowireMode::Constructor),
        _ => None,
    }
}

/// Parses individual `bean` elements within one scope block.
///
/// Each nested scope block gets its own delegate; defaults cascade from the
/// parent delegate passed to [`ParserDelegate::for_element`]. The delegate
/// also tracks the names already used within its scope so in-document
/// duplicates are reported at parse time.
pub struct ParserDelegate {
    defaults: ScopeDefaults,
    used_names: HashSet<String>,
    anonymous_ordinal: usize,
}

impl ParserDelegate {
    pub fn for_element(
        root: roxmltree::Node<'_, '_>,
        parent: Option<&ParserDelegate>,
        ctx: &mut ReaderContext<'_>,
    ) -> Self {
        let defaults = ScopeDefaults::from_element(root, parent.map(|p| &p.defaults), ctx);
        Self {
            defaults,
            used_names: HashSet::new(),
            anonymous_ordinal: 0,
        }
    }

    #[must_use]
    pub fn defaults(&self) -> &ScopeDefaults {
        &self.defaults
    }

    /// Parse one `bean` element into a holder carrying its primary name,
    /// aliases, and definition. Problems are reported through the context;
    /// `None` means the element was structurally unusable.
    pub fn parse_bean_element(
        &mut self,
        element: roxmltree::Node<'_, '_>,
        ctx: &mut ReaderContext<'_>,
    ) -> Option<BeanDefinitionHolder> {
        let id = element.attribute("id").map(str::trim).unwrap_or("");
        let name_attr = element.attribute("name").unwrap_or("");
        let mut aliases: Vec<String> = tokenize(name_attr)
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut bean_name = id.to_string();
        if bean_name.is_empty() && !aliases.is_empty() {
            bean_name = aliases.remove(0);
            tracing::trace!(
                name = bean_name.as_str(),
                "no 'id' attribute, using the first name as the bean name"
            );
        }

        if !self.check_name_uniqueness(&bean_name, &aliases, element, ctx) {
            return None;
        }

        let mut definition = self.parse_definition(element, &bean_name, ctx)?;
        definition.origin = Some(ctx.resource().description());

        if bean_name.is_empty() {
            bean_name = self.generate_name(&definition);
            self.used_names.insert(bean_name.clone());
            tracing::trace!(name = bean_name.as_str(), "generated bean name");
        }

        Some(BeanDefinitionHolder {
            name: bean_name,
            aliases,
            definition,
        })
    }

    fn check_name_uniqueness(
        &mut self,
        name: &str,
        aliases: &[String],
        element: roxmltree::Node<'_, '_>,
        ctx: &mut ReaderContext<'_>,
    ) -> bool {
        let mut found: Option<&str> = None;
        if !name.is_empty() && self.used_names.contains(name) {
            found = Some(name);
        }
        if found.is_none() {
            found = aliases
                .iter()
                .find(|alias| self.used_names.contains(alias.as_str()))
                .map(String::as_str);
        }
        if let Some(duplicate) = found {
            ctx.error(
                format!("bean name '{duplicate}' is already used in this scope"),
                Some(element),
            );
            return false;
        }

        if !name.is_empty() {
            self.used_names.insert(name.to_string());
        }
        self.used_names.extend(aliases.iter().cloned());
        true
    }

    fn generate_name(&mut self, definition: &BeanDefinition) -> String {
        let stem = definition
            .class_name
            .as_deref()
            .or(definition.parent.as_deref())
            .or(definition.factory_bean.as_deref())
            .unwrap_or(BEAN_ELEMENT);
        loop {
            self.anonymous_ordinal += 1;
            let candidate = format!("{stem}#{}", self.anonymous_ordinal);
            if !self.used_names.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn parse_definition(
        &mut self,
        element: roxmltree::Node<'_, '_>,
        bean_name: &str,
        ctx: &mut ReaderContext<'_>,
    ) -> Option<BeanDefinition> {
        let mut definition = BeanDefinition::default();

        definition.class_name = attr_non_empty(element, "class");
        definition.parent = attr_non_empty(element, "parent");
        definition.factory_bean = attr_non_empty(element, "factory-bean");
        definition.factory_method = attr_non_empty(element, "factory-method");

        if definition.class_name.is_none()
            && definition.parent.is_none()
            && definition.factory_bean.is_none()
        {
            ctx.error(
                "bean must declare a 'class', 'parent', or 'factory-bean'",
                Some(element),
            );
            return None;
        }

        definition.scope = BeanScope::parse(element.attribute("scope").unwrap_or(""));
        definition.is_abstract = element.attribute("abstract") == Some("true");

        definition.lazy_init = match element.attribute("lazy-init").unwrap_or(DEFAULT_TOKEN) {
            "" | DEFAULT_TOKEN => self.defaults.lazy_init,
            other => other == "true",
        };

        definition.autowire = match element.attribute("autowire").unwrap_or(DEFAULT_TOKEN) {
            "" | DEFAULT_TOKEN => self.defaults.autowire,
            raw => match parse_autowire(raw) {
                Some(mode) => mode,
                None => {
                    ctx.error(format!("invalid autowire value '{raw}'"), Some(element));
                    self.defaults.autowire
                }
            },
        };

        definition.autowire_candidate =
            match element.attribute("autowire-candidate").unwrap_or(DEFAULT_TOKEN) {
                "" | DEFAULT_TOKEN => match &self.defaults.autowire_candidates {
                    Some(patterns) if !bean_name.is_empty() => patterns
                        .iter()
                        .any(|pattern| simple_match(pattern, bean_name)),
                    _ => true,
                },
                other => other == "true",
            };

        if let Some(depends) = element.attribute("depends-on") {
            definition.depends_on = tokenize(depends).into_iter().map(str::to_string).collect();
        }
        definition.primary = element.attribute("primary") == Some("true");

        definition.init_method = match element.attribute("init-method") {
            Some(value) => non_empty(value),
            None => self.defaults.init_method.clone(),
        };
        definition.destroy_method = match element.attribute("destroy-method") {
            Some(value) => non_empty(value),
            None => self.defaults.destroy_method.clone(),
        };

        for child in child_elements(element) {
            if !is_default_namespace(child) {
                // Foreign-namespace children are decoration concerns.
                continue;
            }
            match child.tag_name().name() {
                "description" => {
                    definition.description = child.text().map(str::trim).map(str::to_string);
                }
                "meta" => self.parse_meta(child, &mut definition, ctx),
                "constructor-arg" => self.parse_constructor_arg(child, &mut definition, ctx),
                "property" => self.parse_property(child, &mut definition, ctx),
                "lookup-method" | "replaced-method" | "qualifier" => {
                    // Instantiation-engine concerns; not interpreted at this layer.
                    tracing::trace!(
                        element = child.tag_name().name(),
                        "skipping bean child element outside this layer's scope"
                    );
                }
                other => {
                    tracing::trace!(element = other, "ignoring unrecognized bean child element");
                }
            }
        }

        Some(definition)
    }

    fn parse_meta(
        &mut self,
        element: roxmltree::Node<'_, '_>,
        definition: &mut BeanDefinition,
        ctx: &mut ReaderContext<'_>,
    ) {
        match (attr_non_empty(element, "key"), element.attribute("value")) {
            (Some(key), Some(value)) => {
                definition.metadata.insert(key, value.to_string());
            }
            _ => ctx.error(
                "meta element requires 'key' and 'value' attributes",
                Some(element),
            ),
        }
    }

    fn parse_constructor_arg(
        &mut self,
        element: roxmltree::Node<'_, '_>,
        definition: &mut BeanDefinition,
        ctx: &mut ReaderContext<'_>,
    ) {
        let index = match element.attribute("index") {
            None => None,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(index) => Some(index),
                Err(_) => {
                    ctx.error(
                        format!("constructor-arg index '{raw}' is not a non-negative integer"),
                        Some(element),
                    );
                    return;
                }
            },
        };

        let Some(value) = self.parse_value(element, ctx) else {
            return;
        };

        definition.constructor_args.push(ConstructorArg {
            index,
            name: attr_non_empty(element, "name"),
            type_name: attr_non_empty(element, "type"),
            value,
        });
    }

    fn parse_property(
        &mut self,
        element: roxmltree::Node<'_, '_>,
        definition: &mut BeanDefinition,
        ctx: &mut ReaderContext<'_>,
    ) {
        let Some(name) = attr_non_empty(element, "name") else {
            ctx.error("property element requires a 'name' attribute", Some(element));
            return;
        };
        if definition.property_values.iter().any(|p| p.name == name) {
            ctx.error(
                format!("multiple 'property' definitions for property '{name}'"),
                Some(element),
            );
            return;
        }

        let Some(value) = self.parse_value(element, ctx) else {
            return;
        };
        definition.property_values.push(PropertyValue { name, value });
    }

    /// A value is exactly one of: a `value` attribute, a `ref` attribute, or
    /// a single value sub-element.
    fn parse_value(
        &mut self,
        element: roxmltree::Node<'_, '_>,
        ctx: &mut ReaderContext<'_>,
    ) -> Option<BeanValue> {
        let ref_attr = element.attribute("ref");
        let value_attr = element.attribute("value");
        let sub_elements: Vec<roxmltree::Node<'_, '_>> = child_elements(element)
            .filter(|child| {
                is_default_namespace(*child)
                    && !matches!(child.tag_name().name(), "description" | "meta")
            })
            .collect();

        let sources =
            usize::from(ref_attr.is_some()) + usize::from(value_attr.is_some()) + usize::from(!sub_elements.is_empty());
        if sources != 1 || sub_elements.len() > 1 {
            ctx.error(
                "element must have exactly one of a 'ref' attribute, a 'value' attribute, \
                 or one value sub-element",
                Some(element),
            );
            return None;
        }

        if let Some(target) = ref_attr {
            if target.trim().is_empty() {
                ctx.error("'ref' attribute must not be empty", Some(element));
                return None;
            }
            return Some(BeanValue::Ref(target.to_string()));
        }
        if let Some(value) = value_attr {
            return Some(BeanValue::String(value.to_string()));
        }
        self.parse_value_element(sub_elements[0], ctx)
    }

    fn parse_value_element(
        &mut self,
        element: roxmltree::Node<'_, '_>,
        ctx: &mut ReaderContext<'_>,
    ) -> Option<BeanValue> {
        match element.tag_name().name() {
            BEAN_ELEMENT => self
                .parse_definition(element, "", ctx)
                .map(|mut definition| {
                    definition.origin = Some(ctx.resource().description());
                    BeanValue::Bean(Box::new(definition))
                }),
            "ref" => match attr_non_empty(element, "bean") {
                Some(target) => Some(BeanValue::Ref(target)),
                None => {
                    ctx.error("ref element requires a 'bean' attribute", Some(element));
                    None
                }
            },
            "idref" => match attr_non_empty(element, "bean") {
                Some(target) => Some(BeanValue::IdRef(target)),
                None => {
                    ctx.error("idref element requires a 'bean' attribute", Some(element));
                    None
                }
            },
            "value" => Some(BeanValue::String(
                element.text().unwrap_or_default().to_string(),
            )),
            "null" => Some(BeanValue::Null),
            "list" => {
                let merge = self.merge_attribute(element);
                Some(BeanValue::List {
                    items: self.parse_collection_items(element, ctx),
                    merge,
                })
            }
            "set" => {
                let merge = self.merge_attribute(element);
                Some(BeanValue::Set {
                    items: self.parse_collection_items(element, ctx),
                    merge,
                })
            }
            "map" => Some(self.parse_map(element, ctx)),
            "props" => Some(self.parse_props(element, ctx)),
            other => {
                ctx.error(format!("unknown value element '{other}'"), Some(element));
                None
            }
        }
    }

    fn merge_attribute(&self, element: roxmltree::Node<'_, '_>) -> bool {
        match element.attribute("merge").unwrap_or(DEFAULT_TOKEN) {
            "" | DEFAULT_TOKEN => self.defaults.merge,
            other => other == "true",
        }
    }

    fn parse_collection_items(
        &mut self,
        element: roxmltree::Node<'_, '_>,
        ctx: &mut ReaderContext<'_>,
    ) -> Vec<BeanValue> {
        child_elements(element)
            .filter(|child| is_default_namespace(*child) && child.tag_name().name() != "description")
            .filter_map(|child| self.parse_value_element(child, ctx))
            .collect()
    }

    fn parse_map(
        &mut self,
        element: roxmltree::Node<'_, '_>,
        ctx: &mut ReaderContext<'_>,
    ) -> BeanValue {
        let merge = self.merge_attribute(element);
        let mut entries = Vec::new();
        for entry in child_elements(element).filter(|c| c.tag_name().name() == "entry") {
            if let Some(entry) = self.parse_map_entry(entry, ctx) {
                entries.push(entry);
            }
        }
        BeanValue::Map { entries, merge }
    }

    fn parse_map_entry(
        &mut self,
        entry: roxmltree::Node<'_, '_>,
        ctx: &mut ReaderContext<'_>,
    ) -> Option<MapEntry> {
        let key_attr = entry.attribute("key");
        let key_ref = entry.attribute("key-ref");
        let key_elements: Vec<roxmltree::Node<'_, '_>> = child_elements(entry)
            .filter(|c| c.tag_name().name() == "key")
            .collect();

        let key_sources = usize::from(key_attr.is_some())
            + usize::from(key_ref.is_some())
            + usize::from(!key_elements.is_empty());
        if key_sources != 1 || key_elements.len() > 1 {
            ctx.error(
                "map entry must have exactly one of a 'key' attribute, a 'key-ref' attribute, \
                 or one key sub-element",
                Some(entry),
            );
            return None;
        }

        let key = if let Some(key) = key_attr {
            BeanValue::String(key.to_string())
        } else if let Some(target) = key_ref {
            BeanValue::Ref(target.to_string())
        } else {
            let inner: Vec<roxmltree::Node<'_, '_>> =
                child_elements(key_elements[0]).collect();
            if inner.len() != 1 {
                ctx.error(
                    "key sub-element must contain exactly one value element",
                    Some(key_elements[0]),
                );
                return None;
            }
            self.parse_value_element(inner[0], ctx)?
        };

        let value_attr = entry.attribute("value");
        let value_ref = entry.attribute("value-ref");
        let value_elements: Vec<roxmltree::Node<'_, '_>> = child_elements(entry)
            .filter(|c| c.tag_name().name() != "key")
            .collect();

        let value_sources = usize::from(value_attr.is_some())
            + usize::from(value_ref.is_some())
            + usize::from(!value_elements.is_empty());
        if value_sources != 1 || value_elements.len() > 1 {
            ctx.error(
                "map entry must have exactly one of a 'value' attribute, a 'value-ref' \
                 attribute, or one value sub-element",
                Some(entry),
            );
            return None;
        }

        let value = if let Some(value) = value_attr {
            BeanValue::String(value.to_string())
        } else if let Some(target) = value_ref {
            BeanValue::Ref(target.to_string())
        } else {
            self.parse_value_element(value_elements[0], ctx)?
        };

        Some(MapEntry { key, value })
    }

    fn parse_props(
        &mut self,
        element: roxmltree::Node<'_, '_>,
        ctx: &mut ReaderContext<'_>,
    ) -> BeanValue {
        let merge = self.merge_attribute(element);
        let mut entries = Vec::new();
        for prop in child_elements(element).filter(|c| c.tag_name().name() == "prop") {
            let Some(key) = attr_non_empty(prop, "key") else {
                ctx.error("prop element requires a 'key' attribute", Some(prop));
                continue;
            };
            let value = prop.text().map(str::trim).unwrap_or_default().to_string();
            entries.push((key, value));
        }
        BeanValue::Props { entries, merge }
    }

    /// Apply custom-namespace decoration from foreign attributes and child
    /// elements attached to an otherwise-standard bean element.
    pub fn decorate_if_required(
        &self,
        element: roxmltree::Node<'_, '_>,
        holder: BeanDefinitionHolder,
        ctx: &mut ReaderContext<'_>,
    ) -> BeanDefinitionHolder {
        let handlers = ctx.handlers;
        let mut holder = holder;

        for attribute in element.attributes() {
            let Some(namespace) = attribute.namespace() else {
                continue;
            };
            if namespace == BEANS_NAMESPACE {
                continue;
            }
            match handlers.resolve(namespace) {
                Some(handler) => {
                    holder = handler.decorate_attribute(&attribute, holder, ctx);
                }
                None => ctx.error(
                    format!("no namespace handler registered for '{namespace}'"),
                    Some(element),
                ),
            }
        }

        for child in child_elements(element) {
            let Some(namespace) = child.tag_name().namespace() else {
                continue;
            };
            if namespace == BEANS_NAMESPACE {
                continue;
            }
            match handlers.resolve(namespace) {
                Some(handler) => {
                    holder = handler.decorate_element(child, holder, ctx);
                }
                None => ctx.error(
                    format!("no namespace handler registered for '{namespace}'"),
                    Some(child),
                ),
            }
        }

        holder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{NullEventListener, Problem, ProblemCollector, ReaderContext};
    use crate::namespace::NamespaceHandlerRegistry;
    use crate::resource::{FileSystemResourceLoader, Resource};
    use pretty_assertions::assert_eq;
    use wicker_env::Environment;
    use wicker_beans::DefinitionRegistry;

    fn with_context<R>(f: impl FnOnce(&mut ReaderContext<'_>) -> R) -> (R, Vec<Problem>) {
        let environment = Environment::new();
        let mut registry = DefinitionRegistry::new();
        let handlers = NamespaceHandlerRegistry::with_defaults();
        let loader = FileSystemResourceLoader::new();
        let mut listener = NullEventListener;
        let mut problems = ProblemCollector::new();
        let result = {
            let mut ctx = ReaderContext::new(
                Resource::bytes("test", ""),
                &environment,
                &mut registry,
                &handlers,
                &loader,
                &mut listener,
                &mut problems,
            );
            f(&mut ctx)
        };
        (result, problems.take())
    }

    fn parse_single_bean(xml: &str) -> (Option<BeanDefinitionHolder>, Vec<Problem>) {
        let doc = roxmltree::Document::parse(xml).unwrap();
        with_context(|ctx| {
            let root = doc.root_element();
            let mut delegate = ParserDelegate::for_element(root, None, ctx);
            let bean = child_elements(root).next().unwrap();
            delegate.parse_bean_element(bean, ctx)
        })
    }

    #[test]
    fn tokenizes_on_all_recognized_delimiters() {
        assert_eq!(tokenize("a,b;c d"), vec!["a", "b", "c", "d"]);
        assert_eq!(tokenize(" a , b "), vec!["a", "b"]);
        assert_eq!(tokenize(""), Vec::<&str>::new());
    }

    #[test]
    fn parses_bean_attributes() {
        let (holder, problems) = parse_single_bean(
            r#"<beans>
                 <bean id="svc" class="com.example.Svc" scope="prototype" lazy-init="true"
                       depends-on="a b" primary="true" init-method="start"
                       destroy-method="stop" factory-method="create"/>
               </beans>"#,
        );
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");

        let holder = holder.unwrap();
        assert_eq!(holder.name, "svc");
        assert!(holder.aliases.is_empty());

        let def = &holder.definition;
        assert_eq!(def.class_name.as_deref(), Some("com.example.Svc"));
        assert_eq!(def.scope, BeanScope::Prototype);
        assert!(def.lazy_init);
        assert!(def.primary);
        assert_eq!(def.depends_on, vec!["a", "b"]);
        assert_eq!(def.init_method.as_deref(), Some("start"));
        assert_eq!(def.destroy_method.as_deref(), Some("stop"));
        assert_eq!(def.factory_method.as_deref(), Some("create"));
        assert_eq!(def.origin.as_deref(), Some("in-memory [test]"));
    }

    #[test]
    fn name_attribute_supplies_name_and_aliases() {
        let (holder, problems) =
            parse_single_bean(r#"<beans><bean name="a,b c" class="com.example.A"/></beans>"#);
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        let holder = holder.unwrap();
        assert_eq!(holder.name, "a");
        assert_eq!(holder.aliases, vec!["b", "c"]);
    }

    #[test]
    fn id_wins_and_names_become_aliases() {
        let (holder, problems) = parse_single_bean(
            r#"<beans><bean id="primary" name="alt1;alt2" class="com.example.A"/></beans>"#,
        );
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        let holder = holder.unwrap();
        assert_eq!(holder.name, "primary");
        assert_eq!(holder.aliases, vec!["alt1", "alt2"]);
    }

    #[test]
    fn bean_without_class_parent_or_factory_is_rejected() {
        let (holder, problems) = parse_single_bean(r#"<beans><bean id="x"/></beans>"#);
        assert!(holder.is_none());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].message.contains("'class'"));
        assert_eq!(problems[0].line, Some(1));
    }

    #[test]
    fn duplicate_names_within_a_scope_are_reported() {
        let doc = roxmltree::Document::parse(
            r#"<beans>
                 <bean id="a" class="com.example.First"/>
                 <bean id="a" class="com.example.Second"/>
               </beans>"#,
        )
        .unwrap();
        let ((first, second), problems) = with_context(|ctx| {
            let root = doc.root_element();
            let mut delegate = ParserDelegate::for_element(root, None, ctx);
            let mut beans = child_elements(root);
            let first = delegate.parse_bean_element(beans.next().unwrap(), ctx);
            let second = delegate.parse_bean_element(beans.next().unwrap(), ctx);
            (first, second)
        });

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].message.contains("already used"));
    }

    #[test]
    fn anonymous_beans_get_generated_names() {
        let doc = roxmltree::Document::parse(
            r#"<beans>
                 <bean class="com.example.A"/>
                 <bean class="com.example.A"/>
               </beans>"#,
        )
        .unwrap();
        let ((first, second), problems) = with_context(|ctx| {
            let root = doc.root_element();
            let mut delegate = ParserDelegate::for_element(root, None, ctx);
            let mut beans = child_elements(root);
            let first = delegate.parse_bean_element(beans.next().unwrap(), ctx).unwrap();
            let second = delegate.parse_bean_element(beans.next().unwrap(), ctx).unwrap();
            (first.name, second.name)
        });

        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        assert_eq!(first, "com.example.A#1");
        assert_eq!(second, "com.example.A#2");
    }

    #[test]
    fn scope_defaults_cascade_to_beans() {
        let (holder, problems) = parse_single_bean(
            r#"<beans default-lazy-init="true" default-autowire="byName"
                      default-init-method="boot">
                 <bean id="svc" class="com.example.Svc"/>
               </beans>"#,
        );
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        let def = holder.unwrap().definition;
        assert!(def.lazy_init);
        assert_eq!(def.autowire, AutowireMode::ByName);
        assert_eq!(def.init_method.as_deref(), Some("boot"));
    }

    #[test]
    fn bean_attributes_override_scope_defaults() {
        let (holder, problems) = parse_single_bean(
            r#"<beans default-lazy-init="true">
                 <bean id="svc" class="com.example.Svc" lazy-init="false"/>
               </beans>"#,
        );
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        assert!(!holder.unwrap().definition.lazy_init);
    }

    #[test]
    fn child_defaults_inherit_from_parent_delegate() {
        let doc = roxmltree::Document::parse(
            r#"<beans default-lazy-init="true" default-autowire="byType">
                 <beans default-autowire="no"/>
               </beans>"#,
        )
        .unwrap();
        let (defaults, problems) = with_context(|ctx| {
            let root = doc.root_element();
            let parent = ParserDelegate::for_element(root, None, ctx);
            let nested = child_elements(root).next().unwrap();
            let child = ParserDelegate::for_element(nested, Some(&parent), ctx);
            child.defaults().clone()
        });

        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        assert!(defaults.lazy_init);
        assert_eq!(defaults.autowire, AutowireMode::No);
    }

    #[test]
    fn default_autowire_candidates_pattern_gates_candidacy() {
        let (holder, problems) = parse_single_bean(
            r#"<beans default-autowire-candidates="*Service,core*">
                 <bean id="auditService" class="com.example.Audit"/>
               </beans>"#,
        );
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        assert!(holder.unwrap().definition.autowire_candidate);

        let (holder, _) = parse_single_bean(
            r#"<beans default-autowire-candidates="*Service">
                 <bean id="auditWorker" class="com.example.Audit"/>
               </beans>"#,
        );
        assert!(!holder.unwrap().definition.autowire_candidate);
    }

    #[test]
    fn parses_constructor_args() {
        let (holder, problems) = parse_single_bean(
            r#"<beans>
                 <bean id="svc" class="com.example.Svc">
                   <constructor-arg index="0" value="literal"/>
                   <constructor-arg name="peer" ref="other"/>
                   <constructor-arg type="int" value="7"/>
                 </bean>
               </beans>"#,
        );
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        let args = holder.unwrap().definition.constructor_args;
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].index, Some(0));
        assert_eq!(args[0].value, BeanValue::String("literal".to_string()));
        assert_eq!(args[1].name.as_deref(), Some("peer"));
        assert_eq!(args[1].value, BeanValue::Ref("other".to_string()));
        assert_eq!(args[2].type_name.as_deref(), Some("int"));
    }

    #[test]
    fn bad_constructor_arg_index_is_reported() {
        let (holder, problems) = parse_single_bean(
            r#"<beans>
                 <bean id="svc" class="com.example.Svc">
                   <constructor-arg index="-1" value="x"/>
                 </bean>
               </beans>"#,
        );
        let holder = holder.unwrap();
        assert!(holder.definition.constructor_args.is_empty());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].message.contains("index"));
    }

    #[test]
    fn parses_property_value_kinds() {
        let (holder, problems) = parse_single_bean(
            r#"<beans>
                 <bean id="svc" class="com.example.Svc">
                   <property name="host" value="localhost"/>
                   <property name="peer" ref="other"/>
                   <property name="none"><null/></property>
                   <property name="names">
                     <list><value>a</value><value>b</value></list>
                   </property>
                   <property name="lookup">
                     <map>
                       <entry key="first" value="1"/>
                       <entry key="second" value-ref="other"/>
                     </map>
                   </property>
                   <property name="settings">
                     <props><prop key="timeout">30</prop></props>
                   </property>
                 </bean>
               </beans>"#,
        );
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        let def = holder.unwrap().definition;

        assert_eq!(
            def.property("host"),
            Some(&BeanValue::String("localhost".to_string()))
        );
        assert_eq!(def.property("peer"), Some(&BeanValue::Ref("other".to_string())));
        assert_eq!(def.property("none"), Some(&BeanValue::Null));
        assert_eq!(
            def.property("names"),
            Some(&BeanValue::List {
                items: vec![
                    BeanValue::String("a".to_string()),
                    BeanValue::String("b".to_string()),
                ],
                merge: false,
            })
        );
        assert_eq!(
            def.property("lookup"),
            Some(&BeanValue::Map {
                entries: vec![
                    MapEntry {
                        key: BeanValue::String("first".to_string()),
                        value: BeanValue::String("1".to_string()),
                    },
                    MapEntry {
                        key: BeanValue::String("second".to_string()),
                        value: BeanValue::Ref("other".to_string()),
                    },
                ],
                merge: false,
            })
        );
        assert_eq!(
            def.property("settings"),
            Some(&BeanValue::Props {
                entries: vec![("timeout".to_string(), "30".to_string())],
                merge: false,
            })
        );
    }

    #[test]
    fn nested_bean_values_stay_anonymous() {
        let (holder, problems) = parse_single_bean(
            r#"<beans>
                 <bean id="svc" class="com.example.Svc">
                   <property name="inner">
                     <bean class="com.example.Inner">
                       <property name="depth" value="1"/>
                     </bean>
                   </property>
                 </bean>
               </beans>"#,
        );
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        let def = holder.unwrap().definition;
        let Some(BeanValue::Bean(inner)) = def.property("inner") else {
            panic!("expected a nested bean value");
        };
        assert_eq!(inner.class_name.as_deref(), Some("com.example.Inner"));
        assert_eq!(
            inner.property("depth"),
            Some(&BeanValue::String("1".to_string()))
        );
    }

    #[test]
    fn property_with_both_value_and_ref_is_rejected() {
        let (holder, problems) = parse_single_bean(
            r#"<beans>
                 <bean id="svc" class="com.example.Svc">
                   <property name="host" value="a" ref="b"/>
                 </bean>
               </beans>"#,
        );
        let def = holder.unwrap().definition;
        assert!(def.property_values.is_empty());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].message.contains("exactly one"));
    }

    #[test]
    fn duplicate_properties_are_rejected() {
        let (holder, problems) = parse_single_bean(
            r#"<beans>
                 <bean id="svc" class="com.example.Svc">
                   <property name="host" value="a"/>
                   <property name="host" value="b"/>
                 </bean>
               </beans>"#,
        );
        let def = holder.unwrap().definition;
        assert_eq!(
            def.property("host"),
            Some(&BeanValue::String("a".to_string()))
        );
        assert_eq!(problems.len(), 1);
        assert!(problems[0].message.contains("multiple 'property'"));
    }

    #[test]
    fn default_merge_cascades_to_collections() {
        let (holder, problems) = parse_single_bean(
            r#"<beans default-merge="true">
                 <bean id="svc" class="com.example.Svc">
                   <property name="names"><list><value>a</value></list></property>
                   <property name="other"><set merge="false"><value>b</value></set></property>
                 </bean>
               </beans>"#,
        );
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        let def = holder.unwrap().definition;
        assert!(matches!(
            def.property("names"),
            Some(BeanValue::List { merge: true, .. })
        ));
        assert!(matches!(
            def.property("other"),
            Some(BeanValue::Set { merge: false, .. })
        ));
    }

    #[test]
    fn meta_entries_attach_to_the_definition() {
        let (holder, problems) = parse_single_bean(
            r#"<beans>
                 <bean id="svc" class="com.example.Svc">
                   <meta key="origin" value="generated"/>
                 </bean>
               </beans>"#,
        );
        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        let def = holder.unwrap().definition;
        assert_eq!(def.metadata.get("origin").map(String::as_str), Some("generated"));
    }

    #[test]
    fn shorthand_attributes_decorate_the_definition() {
        let doc = roxmltree::Document::parse(
            r#"<beans xmlns:p="https://wicker-rs.dev/schema/p">
                 <bean id="svc" class="com.example.Svc" p:host="localhost" p:peer-ref="other"/>
               </beans>"#,
        )
        .unwrap();
        let (holder, problems) = with_context(|ctx| {
            let root = doc.root_element();
            let mut delegate = ParserDelegate::for_element(root, None, ctx);
            let bean = child_elements(root).next().unwrap();
            let holder = delegate.parse_bean_element(bean, ctx).unwrap();
            delegate.decorate_if_required(bean, holder, ctx)
        });

        assert!(problems.is_empty(), "unexpected problems: {problems:#?}");
        let def = holder.definition;
        assert_eq!(
            def.property("host"),
            Some(&BeanValue::String("localhost".to_string()))
        );
        assert_eq!(def.property("peer"), Some(&BeanValue::Ref("other".to_string())));
    }

    #[test]
    fn unknown_decoration_namespace_is_reported() {
        let doc = roxmltree::Document::parse(
            r#"<beans xmlns:q="https://example.com/unknown">
                 <bean id="svc" class="com.example.Svc" q:weight="3"/>
               </beans>"#,
        )
        .unwrap();
        let (_, problems) = with_context(|ctx| {
            let root = doc.root_element();
            let mut delegate = ParserDelegate::for_element(root, None, ctx);
            let bean = child_elements(root).next().unwrap();
            let holder = delegate.parse_bean_element(bean, ctx).unwrap();
            delegate.decorate_if_required(bean, holder, ctx)
        });

        assert_eq!(problems.len(), 1);
        assert!(problems[0]
            .message
            .contains("no namespace handler registered for 'https://example.com/unknown'"));
    }

    #[test]
    fn simple_match_supports_wildcard_positions() {
        assert!(simple_match("*", "anything"));
        assert!(simple_match("core*", "coreService"));
        assert!(simple_match("*Service", "coreService"));
        assert!(simple_match("*ore*", "coreService"));
        assert!(simple_match("exact", "exact"));
        assert!(!simple_match("core*", "service"));
    }
}
