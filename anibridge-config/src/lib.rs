//! Shared configuration for AniBridge.
//!
//! This crate centralizes the bridge's tunables: catalog connection details,
//! library folder mappings, season ordering policies, dispatcher timing, and
//! cache lifetime. The host integration loads one [`BridgeConfig`] at startup
//! and hands the relevant sections to the core services, so there is a single
//! source of truth for defaults and validation rules.

pub mod loader;
pub mod models;

pub use loader::{ConfigLoadError, from_toml_str, load};
pub use models::{
    BridgeConfig, CacheConfig, CatalogConfig, CollectionKind, DispatchConfig, LibraryFolder,
    OrderingConfig, OrderingPolicy, SpecialsPlacement, TagConfig,
};
