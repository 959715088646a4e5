//! Tenant Primitives for Bulkhead
//!
//! Tenant entities, the lookup seam to the host's tenant-resolution layer,
//! and tenant-scoped cache isolation.
//!
//! # Features
//!
//! - 🏢 **Tenant Entity** - Plain data entity with explicit mutators
//! - 🔍 **Tenant Lookup** - Store trait the host implements with its database
//! - 💾 **Cache Isolation** - Automatic per-tenant cache key prefixing
//! - 🧹 **Tenant Flush** - Remove every cached key for one tenant, and only that tenant
//!
//! # Quick Start
//!
//! ```rust
//! use bulkhead_tenant::{InMemoryCacheStore, Tenant, TenantCache};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let tenant = Tenant::new("t-acme", "acme")
//!     .with_domain("acme.example.com")
//!     .with_metadata("plan", "professional");
//!
//! let cache = TenantCache::new(InMemoryCacheStore::new());
//! cache.set(&tenant.id, "users:1", b"alice".to_vec(), None).await.unwrap();
//!
//! // Keys are invisible across tenants.
//! assert!(cache.get("t-other", "users:1").await.unwrap().is_none());
//! # }
//! ```
//!
//! Mutating a tenant never invalidates caches or pools implicitly. The
//! caller that suspends or deletes a tenant makes the follow-up calls
//! itself (`TenantCache::flush_tenant`, pool removal), so every
//! invalidation is visible at the call site.

pub mod cache;
pub mod store;
pub mod tenant;

pub use cache::{CacheError, CacheStore, InMemoryCacheStore, TenantCache};
pub use store::{InMemoryTenantStore, TenantStore};
pub use tenant::{Tenant, TenantContext, TenantError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{CacheError, CacheStore, InMemoryCacheStore, TenantCache};
    pub use crate::store::{InMemoryTenantStore, TenantStore};
    pub use crate::tenant::{Tenant, TenantContext, TenantError};
}
