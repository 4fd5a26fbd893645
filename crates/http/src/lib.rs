//! HTTP helpers for Axum handlers: access guard, template store, encoders
//! and static files.

pub mod app;
pub mod config;
pub mod context;
pub mod encode;
pub mod errors;
pub mod files;
pub mod guard;
pub mod middleware;
pub mod templates;

pub use config::{ConfigError, HttpConfig};
pub use context::CurrentPrincipal;
pub use encode::{EncodeError, json, write_json, write_xml, write_xml_with_root, xml};
pub use errors::json_error;
pub use files::static_files;
pub use guard::{Access, Guard, PrincipalSource, plain_error};
pub use middleware::{GuardLayer, GuardService};
pub use templates::{Registry, TemplateError, Templates};
