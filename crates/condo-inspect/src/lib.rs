//! Condominium registry, guided inspection wizard, inspection archive and
//! PDF report export, persisted locally as JSON collections.

pub mod app;
pub mod archive;
pub mod config;
pub mod domain;
pub mod error;
pub mod registry;
pub mod report;
pub mod router;
pub mod store;
pub mod telemetry;
pub mod wizard;
