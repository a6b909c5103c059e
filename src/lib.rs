//! Field diagnostic log: persisted visit records with fault-code lookup.
//!
//! # Examples
//!
//! In-memory usage with [`service::DiagnosticLog`]:
//! ```
//! use diaglog::{
//!     catalog::{Catalog, CatalogFormat, CatalogLoad},
//!     core::filter::RecordFilter,
//!     persist::memory::MemoryKv,
//!     record::RecordDraft,
//!     service::DiagnosticLog,
//! };
//!
//! let codes = br#"{ "items": [
//!     { "brand": "Midea", "code": "E6", "title": "Comm error", "severity": "Alta", "fix": "Check wiring" }
//! ] }"#;
//! let catalog = Catalog::from_slice(codes, CatalogFormat::Items);
//! let mut log = DiagnosticLog::open(MemoryKv::new(), "history")
//!     .with_catalog(CatalogLoad::from_result(catalog, "inline"));
//!
//! let rec = log.create(RecordDraft {
//!     client: "Hotel Playa".to_string(),
//!     equipment: "Midea split 12k".to_string(),
//!     code: "e6".to_string(),
//!     ..RecordDraft::default()
//! }).expect("create");
//! assert_eq!(rec.brand, "Midea");
//! assert_eq!(rec.diagnosis, "Código E6: Comm error");
//! assert_eq!(log.list(&RecordFilter::text("playa")).len(), 1);
//! ```
//!
//! Runtime usage with SQLite storage:
//! ```no_run
//! use diaglog::{
//!     config::Config,
//!     record::RecordDraft,
//!     runtime::handle::{spawn_diaglog, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cfg = Config { db_path: Some("diaglog.db".into()), ..Config::default() };
//! let log = cfg.open_log().expect("open sqlite");
//! let handle = spawn_diaglog(log, RuntimeConfig::default());
//! let status = handle.reload_catalog(&cfg.catalog_path, cfg.catalog_format).await.expect("reload");
//! println!("{}", status.label());
//! let _rec = handle.create(RecordDraft {
//!     client: "Hotel Playa".to_string(),
//!     equipment: "Gree 24k".to_string(),
//!     ..RecordDraft::default()
//! }).await.expect("create");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![warn(missing_docs)]

/// Fault-code catalog and brand inference.
pub mod catalog;
/// Runtime configuration.
pub mod config;
/// Core in-memory record book and filters.
pub mod core;
mod lenient;
/// Key-value storage abstraction and implementations.
pub mod persist;
/// Diagnostic record, draft and patch types.
pub mod record;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Service owning the book, the catalog and the storage.
pub mod service;
/// Shared primitive types and enums.
pub mod types;
