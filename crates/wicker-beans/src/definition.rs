use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lifetime scope of a managed object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeanScope {
    #[default]
    Singleton,
    Prototype,
    /// A scope this layer does not interpret (request, session, ...).
    Custom(String),
}

impl BeanScope {
    #[must_use]
    pub fn parse(raw: &str) -> BeanScope {
        match raw.trim() {
            "" | "singleton" => BeanScope::Singleton,
            "prototype" => BeanScope::Prototype,
            other => BeanScope::Custom(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutowireMode {
    #[default]
    No,
    ByName,
    ByType,
    Constructor,
}

/// A configured value: the right-hand side of a property or constructor
/// argument.
///
/// Collection variants record their `merge` flag but merging itself happens
/// during definition resolution, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeanValue {
    String(String),
    /// Reference to another bean by name.
    Ref(String),
    /// The *name* of another bean as a string value.
    IdRef(String),
    Null,
    List { items: Vec<BeanValue>, merge: bool },
    Set { items: Vec<BeanValue>, merge: bool },
    Map { entries: Vec<MapEntry>, merge: bool },
    Props { entries: Vec<(String, String)>, merge: bool },
    /// A nested anonymous definition, held by value and never registered on
    /// its own.
    Bean(Box<BeanDefinition>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: BeanValue,
    pub value: BeanValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorArg {
    pub index: Option<usize>,
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub value: BeanValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub name: String,
    pub value: BeanValue,
}

/// The declarative recipe for constructing one managed object.
///
/// Immutable once registered; decoration by custom-namespace handlers happens
/// on the holder before hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanDefinition {
    pub class_name: Option<String>,
    pub parent: Option<String>,
    pub scope: BeanScope,
    pub is_abstract: bool,
    pub lazy_init: bool,
    pub autowire: AutowireMode,
    pub autowire_candidate: bool,
    pub primary: bool,
    pub depends_on: Vec<String>,
    pub init_method: Option<String>,
    pub destroy_method: Option<String>,
    pub factory_method: Option<String>,
    pub factory_bean: Option<String>,
    pub constructor_args: Vec<ConstructorArg>,
    pub property_values: Vec<PropertyValue>,
    /// Free-form key/value metadata (`meta` elements, handler decoration).
    pub metadata: BTreeMap<String, String>,
    pub description: Option<String>,
    /// Description of the declaring resource, for diagnostics only.
    pub origin: Option<String>,
}

impl Default for BeanDefinition {
    fn default() -> Self {
        Self {
            class_name: None,
            parent: None,
            scope: BeanScope::Singleton,
            is_abstract: false,
            lazy_init: false,
            autowire: AutowireMode::No,
            autowire_candidate: true,
            primary: false,
            depends_on: Vec::new(),
            init_method: None,
            destroy_method: None,
            factory_method: None,
            factory_bean: None,
            constructor_args: Vec::new(),
            property_values: Vec::new(),
            metadata: BTreeMap::new(),
            description: None,
            origin: None,
        }
    }
}

impl BeanDefinition {
    #[must_use]
    pub fn of_class(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::default()
        }
    }

    /// Set a property value, replacing an existing value of the same name.
    pub fn set_property(&mut self, name: impl Into<String>, value: BeanValue) {
        let name = name.into();
        if let Some(existing) = self.property_values.iter_mut().find(|p| p.name == name) {
            existing.value = value;
        } else {
            self.property_values.push(PropertyValue { name, value });
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&BeanValue> {
        self.property_values
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// Pairs a definition with its primary name and aliases during the
/// parse-to-register handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanDefinitionHolder {
    pub name: String,
    pub aliases: Vec<String>,
    pub definition: BeanDefinition,
}

impl BeanDefinitionHolder {
    #[must_use]
    pub fn new(name: impl Into<String>, definition: BeanDefinition) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            definition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_scope_names() {
        assert_eq!(BeanScope::parse(""), BeanScope::Singleton);
        assert_eq!(BeanScope::parse("singleton"), BeanScope::Singleton);
        assert_eq!(BeanScope::parse("prototype"), BeanScope::Prototype);
        assert_eq!(
            BeanScope::parse("request"),
            BeanScope::Custom("request".to_string())
        );
    }

    #[test]
    fn set_property_replaces_by_name() {
        let mut def = BeanDefinition::of_class("com.example.Service");
        def.set_property("host", BeanValue::String("a".to_string()));
        def.set_property("host", BeanValue::String("b".to_string()));

        assert_eq!(def.property_values.len(), 1);
        assert_eq!(
            def.property("host"),
            Some(&BeanValue::String("b".to_string()))
        );
    }

    #[test]
    fn definitions_round_trip_through_json() {
        let mut def = BeanDefinition::of_class("com.example.Service");
        def.scope = BeanScope::Prototype;
        def.set_property("peer", BeanValue::Ref("other".to_string()));
        def.constructor_args.push(ConstructorArg {
            index: Some(0),
            name: None,
            type_name: None,
            value: BeanValue::List {
                items: vec![BeanValue::String("x".to_string()), BeanValue::Null],
                merge: false,
            },
        });

        let json = serde_json::to_string(&def).unwrap();
        let back: BeanDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
    }
}
