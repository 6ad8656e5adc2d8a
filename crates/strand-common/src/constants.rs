//! System-wide constants for strand.

/// Name of the root resource served by `database_context()`.
pub const ROOT_RESOURCE_NAME: &str = "database";

/// Separator between resource name segments in the textual form.
pub const RESOURCE_SEPARATOR: char = '/';

/// Default initial capacity of the resource-entry map.
pub const DEFAULT_RESOURCE_CAPACITY: usize = 64;

/// Default initial capacity of the per-transaction lock map.
pub const DEFAULT_TXN_CAPACITY: usize = 16;
