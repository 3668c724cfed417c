pub mod call_linker;

pub use call_linker::{link, CallLinker, LinkStats};
