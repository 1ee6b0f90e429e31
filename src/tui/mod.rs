//! Campaign dashboard terminal user interface
//!
//! Four screens (login, campaign list, campaign detail, new campaign) driven
//! by one [`App`] that owns the session and performs every API request.

pub mod app;
pub mod handlers;
pub mod screens;
pub mod traits;
pub mod ui;

pub use app::{App, Screen};
