//! `minions-auth`: principals and roles for access checks.
//!
//! This crate is decoupled from HTTP: it only answers "who is this and which
//! roles do they hold". Looking a principal up is the application's job.

pub mod principal;
pub mod roles;

pub use principal::{Anonymous, Principal, PrincipalId, User};
pub use roles::{Role, roles};
