pub mod catalog;
pub mod document;
pub mod node;

pub use catalog::*;
pub use document::*;
pub use node::*;
