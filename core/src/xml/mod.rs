//! XML sources.
//!
//! [`node`] holds a library-independent element tree; [`uddf`] runs the dive
//! heuristics over it.

pub mod duration;
pub mod fields;
pub mod node;
pub mod uddf;

pub use node::XmlNode;
