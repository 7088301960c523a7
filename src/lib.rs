#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::missing_errors_doc)]

pub mod aws;
pub mod browser;
pub mod config;
pub mod configure;
pub mod error;
pub mod login;
pub mod prompt;
pub mod saml;
pub mod spinner;

pub use error::Error;
