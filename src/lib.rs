//! Account storage for a web application.
//!
//! This library persists user accounts, hashes and checks their passwords,
//! and generates random tokens for sessions and remember-me cookies.
//! Request handlers talk to a [UserService], which sits on top of any
//! [UserStore](stores::UserStore) backend.

#![warn(missing_docs)]

pub mod config;
pub mod db;
mod error;
mod password;
mod service;
mod services;
pub mod stores;
pub mod token;
mod user;

pub use config::{Config, Environment};
pub use error::Error;
pub use password::{PasswordHash, PlaintextPassword};
pub use service::UserService;
pub use services::Services;
pub use user::{User, UserID};
