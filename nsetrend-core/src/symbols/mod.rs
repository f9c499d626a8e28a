//! Symbol resolution and the listing directory.

pub mod directory;
pub mod resolver;

pub use directory::{Listing, SymbolDirectory};
pub use resolver::SymbolResolver;
