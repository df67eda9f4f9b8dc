pub mod block;
pub mod blocks;
pub mod bookmark;
pub mod boundaries;
pub mod category;
pub mod clean;
pub mod config;
pub mod contents;
pub mod editor;
pub mod events;
pub mod format;
pub mod history;
pub mod insert_delete;
pub mod merge_split;
pub mod node;
pub mod normalize;
pub mod range;
pub mod sanitize;
pub mod tree;
pub mod walk;

#[cfg(test)]
mod test_util;

pub use the_dom::{
  Attributes,
  Dom,
  NodeId,
  Tendril,
};
