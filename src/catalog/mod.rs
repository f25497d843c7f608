//! Static character catalog.

/// Catalog entries and the built-in animals.
pub mod character;
