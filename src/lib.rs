//! Test doubles for preferences, document stores, callbacks and filesystems,
//! plus the services exercised against them.

pub mod app;
pub mod config;
pub mod demo;
pub mod display;
pub mod docstore;
pub mod matchers;
pub mod services;
pub mod system;
