//! Scope model - worlds, name versions and definitions
//!
//! The symbol table only lives while a graph is being built. The world tree
//! and definitions registry can be rebuilt from any graph, which is what the
//! linker and injection rely on.

pub mod symbols;
pub mod worlds;

pub use symbols::{Binding, ProxyCache, SymbolTable};
pub use worlds::{Definitions, WorldTree};
