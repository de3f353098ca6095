//! A pipeline executing GraphQL mutations.
//!
//! Mutations are declared with a [`MutationDescriptor`] and implement [`Mutation`]. The
//! [`MutationExecutor`] checks permissions, lets [plugins](plugin) intercept the call, resolves
//! global IDs into [`Node`]s and renders whatever the call ended with as a
//! [`graphql::Response`].

#![warn(unreachable_pub)]

#[macro_use]
pub mod json_ext;

mod configuration;
mod context;
mod descriptor;
pub mod error;
mod executor;
mod global_id;
pub mod graphql;
mod mutation;
mod node;
mod outcome;
mod permission;
pub mod plugin;
mod request;
mod schema;

pub use configuration::Configuration;
pub use configuration::PluginConfiguration;
pub use context::CallerContext;
pub use descriptor::Argument;
pub use descriptor::ArgumentType;
pub use descriptor::DEFAULT_ERROR_FIELD;
pub use descriptor::ErrorType;
pub use descriptor::MutationDescriptor;
pub use error::ConfigurationError;
pub use error::FieldError;
pub use error::GlobalIdError;
pub use error::MutationError;
pub use executor::MutationExecutor;
pub use global_id::GlobalId;
pub use mutation::Mutation;
pub use mutation::MutationContext;
pub use mutation::ResolvedArguments;
pub use node::InMemoryNodeStore;
pub use node::Node;
pub use node::NodeResolver;
pub use node::NodeStore;
pub use outcome::MutationOutcome;
pub use permission::Authorization;
pub use permission::PERMISSION_DENIED_MESSAGE;
pub use permission::Permission;
pub use permission::PermissionGate;
pub use permission::Principal;
pub use permission::PrincipalKind;
pub use request::MutationField;
pub use request::MutationRequest;
pub use schema::Schema;
