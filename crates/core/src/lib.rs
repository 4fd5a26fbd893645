//! `minions-core`: plain data helpers shared by handlers and templates.
//!
//! Nothing here knows about HTTP.

pub mod binding;
pub mod vars;

pub use binding::BindingResult;
pub use vars::Vars;

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}
