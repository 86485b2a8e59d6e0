#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod identity;
pub mod save_service;

pub use recall_core::Clock;

pub use error::{GenerateError, SaveError};
pub use generator::{GeneratorConfig, GeneratorService};
pub use identity::{Anonymous, IdentityProvider, StaticIdentity};
pub use save_service::SetSaveService;
