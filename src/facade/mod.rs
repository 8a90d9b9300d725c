//! The public read API: [`File`], [`Group`], [`Dataset`], and decoded
//! [`AttributeValue`]s, composed from the superblock/heap/message/object-header/
//! b-tree/layout layers underneath.

pub mod attribute_value;
pub mod dataset;
pub mod file;
pub mod group;

pub use attribute_value::AttributeValue;
pub use dataset::Dataset;
pub use file::{Entry, File, OpenOptions};
pub use group::Group;
