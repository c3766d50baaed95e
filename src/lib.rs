pub mod catalog;
pub mod cli;
pub mod config;
pub mod fitting;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod writer;

pub use catalog::Catalog;
pub use cli::{Cli, Commands};
pub use config::Settings;
pub use fitting::{extract, CanonicalFitting, Rejection};
pub use registry::{QueryKey, QueryRegistry, QueryStore, RegistryError};
