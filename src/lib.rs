//! Guided morning and evening reflections kept in a local journal.

pub mod app;
pub mod calendar;
pub mod cipher;
pub mod config;
pub mod entries;
pub mod error;
pub mod search;
pub mod session;
pub mod settings;
pub mod store;
pub mod todo;
pub mod tracker;
pub mod vault;
pub mod wizard;
