//! # Stars shop server
//! This crate hosts the process that operates the shop through a chat bot. It is responsible for:
//! * Receiving bot API updates on a webhook and classifying them ([`inbound`]).
//! * Routing each one to the shop engine and rendering the result back to the user ([`dispatcher`], [`menus`]).
//! * Notifying administrators of purchases and deposits ([`notifications`]).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook`: The route the bot API delivers updates to.
pub mod actions;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod inbound;
pub mod menus;
pub mod messenger;
pub mod notifications;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
