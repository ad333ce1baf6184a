//! Interface boundary to the Lyra front end.
//!
//! The runtime core consumes the parser/compiler through the [`Frontend`]
//! trait and treats [`SyntaxTree`] and [`CodeUnit`] as opaque products.
mod code;
mod frontend;
mod tree;

pub use code::*;
pub use frontend::*;
pub use tree::*;
