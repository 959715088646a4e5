// Bulkhead - per-tenant resource isolation for multi-tenant services
//
// This library bounds what any one tenant can hold or consume inside a
// shared process: tenant-scoped database connections behind a bounded
// LRU pool, and resource usage charged against quota records with an
// append-only audit ledger.

// Re-export tenant primitives (entities, lookup seam, cache isolation)
pub use bulkhead_tenant::*;

// Re-export the connection pool and the quota ledger under their own
// namespaces so call sites read as pool::... / quota::...
pub use bulkhead_pool as pool;
pub use bulkhead_quota as quota;

/// Prelude module for convenient imports
pub mod prelude {
    pub use bulkhead_pool::prelude::*;
    pub use bulkhead_quota::prelude::*;
    pub use bulkhead_tenant::prelude::*;
}
