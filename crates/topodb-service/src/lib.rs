//! topodb service layer.
//!
//! Wires the core constraint lifecycle to an authorization gateway:
//! mutations are permission-gated before they take effect and mirrored into
//! the external permission registry after they commit.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod service;

pub use auth::{AllowAllGateway, AuthorizationGateway, UniqueAction};
pub use config::ServiceConfig;
pub use database::Database;
pub use error::Error;
pub use service::UniqueService;
