//! Consolidated integration tests for reflecta.

mod fixtures;

mod constructors;
mod enums;
mod functions;
mod methods;
mod properties;
mod scopes;
mod types;
mod values;
mod variables;
