use std::collections::HashMap;

use thiserror::Error;

use crate::{BeanDefinition, BeanDefinitionHolder};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("a definition named '{name}' is already registered and overriding is disabled")]
    DuplicateName { name: String },

    #[error("name '{name}' is already registered as an alias for '{target}'")]
    NameShadowsAlias { name: String, target: String },

    #[error("alias '{alias}' collides with a registered definition name")]
    AliasShadowsDefinition { alias: String },

    #[error("alias '{alias}' already points at '{existing}', cannot repoint it to '{name}'")]
    AliasConflict {
        alias: String,
        existing: String,
        name: String,
    },

    #[error("registering alias '{alias}' for '{name}' would create an alias cycle")]
    CyclicAlias { alias: String, name: String },
}

/// In-memory store mapping bean names to definitions and aliases to names.
///
/// Names are unique; re-registration follows the overwrite policy (last wins
/// with a warning by default, rejection when overriding is disabled).
/// Registration order is preserved for iteration. Single-writer access is
/// assumed during a registration pass; there is no internal locking.
#[derive(Debug)]
pub struct DefinitionRegistry {
    definitions: HashMap<String, BeanDefinition>,
    registration_order: Vec<String>,
    aliases: HashMap<String, String>,
    allow_overriding: bool,
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
            registration_order: Vec::new(),
            aliases: HashMap::new(),
            allow_overriding: true,
        }
    }

    pub fn set_allow_overriding(&mut self, allow: bool) {
        self.allow_overriding = allow;
    }

    pub fn register_definition(
        &mut self,
        name: &str,
        definition: BeanDefinition,
    ) -> Result<(), StoreError> {
        if let Some(target) = self.aliases.get(name) {
            return Err(StoreError::NameShadowsAlias {
                name: name.to_string(),
                target: target.clone(),
            });
        }

        if self.definitions.contains_key(name) {
            if !self.allow_overriding {
                return Err(StoreError::DuplicateName {
                    name: name.to_string(),
                });
            }
            tracing::warn!(name, "overriding existing bean definition");
            // Keep the original position in the registration order.
            self.definitions.insert(name.to_string(), definition);
            return Ok(());
        }

        self.registration_order.push(name.to_string());
        self.definitions.insert(name.to_string(), definition);
        Ok(())
    }

    /// Register `alias` as an alternate name for `name`.
    ///
    /// Re-registering the same pair is a no-op. An alias may point at a name
    /// that has no definition yet (the pair is logged as suspicious); it may
    /// not shadow a definition name, repoint to a different name, or close an
    /// alias cycle.
    pub fn register_alias(&mut self, name: &str, alias: &str) -> Result<(), StoreError> {
        if alias == name {
            // A self-alias carries no information.
            return Ok(());
        }

        if self.definitions.contains_key(alias) {
            return Err(StoreError::AliasShadowsDefinition {
                alias: alias.to_string(),
            });
        }

        if let Some(existing) = self.aliases.get(alias) {
            if existing == name {
                return Ok(());
            }
            return Err(StoreError::AliasConflict {
                alias: alias.to_string(),
                existing: existing.clone(),
                name: name.to_string(),
            });
        }

        let mut cursor = name;
        while let Some(next) = self.aliases.get(cursor) {
            if next == alias {
                return Err(StoreError::CyclicAlias {
                    alias: alias.to_string(),
                    name: name.to_string(),
                });
            }
            cursor = next;
        }

        if !self.definitions.contains_key(self.canonical_name(name)) {
            tracing::warn!(alias, name, "registering alias for a name with no definition");
        }

        self.aliases.insert(alias.to_string(), name.to_string());
        Ok(())
    }

    /// Register a holder: the primary name first, then each alias.
    pub fn register_holder(&mut self, holder: &BeanDefinitionHolder) -> Result<(), StoreError> {
        self.register_definition(&holder.name, holder.definition.clone())?;
        for alias in &holder.aliases {
            self.register_alias(&holder.name, alias)?;
        }
        Ok(())
    }

    /// Follow the alias chain from `name` to the name definitions live under.
    #[must_use]
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
        let mut cursor = name;
        while let Some(next) = self.aliases.get(cursor) {
            cursor = next.as_str();
        }
        cursor
    }

    #[must_use]
    pub fn contains_definition(&self, name: &str) -> bool {
        self.definitions.contains_key(self.canonical_name(name))
    }

    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&BeanDefinition> {
        self.definitions.get(self.canonical_name(name))
    }

    /// Definition names in registration order.
    pub fn definition_names(&self) -> impl Iterator<Item = &str> {
        self.registration_order.iter().map(String::as_str)
    }

    /// Every alias whose chain resolves to `name`, sorted.
    #[must_use]
    pub fn aliases_for(&self, name: &str) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .aliases
            .keys()
            .filter(|alias| self.canonical_name(alias) == name)
            .map(String::as_str)
            .collect();
        out.sort_unstable();
        out
    }

    #[must_use]
    pub fn alias_target(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .map(|(alias, name)| (alias.as_str(), name.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
