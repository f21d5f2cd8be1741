//! Model catalog: capability descriptors, lookup, and input validation.

mod descriptor;
mod registry;
mod validation;

pub use descriptor::{Backend, Capability, ModelDescriptor, ModelKind, ParameterOverrides};
pub use registry::ModelRegistry;
pub use validation::ValidationError;
