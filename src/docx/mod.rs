pub mod package;
pub mod parts;
pub mod rewrite;
pub mod xml;
