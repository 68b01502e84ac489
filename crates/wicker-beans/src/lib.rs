//! Bean definition model and the in-memory definition registry.
//!
//! A [`BeanDefinition`] is the declarative recipe for constructing one
//! managed object. Definitions are built by a front end (for example the XML
//! reader), handed over inside a [`BeanDefinitionHolder`], and owned by the
//! [`DefinitionRegistry`] from then on.

mod definition;
mod registry;

pub use definition::{
    AutowireMode, BeanDefinition, BeanDefinitionHolder, BeanScope, BeanValue, ConstructorArg,
    MapEntry, PropertyValue,
};
pub use registry::{DefinitionRegistry, StoreError};
