//! The document tree together with its classification cache.

use std::ops::{
  Deref,
  DerefMut,
};

use the_dom::{
  Dom,
  DomError,
  NodeId,
};
use thiserror::Error;

use crate::category::{
  Category,
  Classifier,
};

/// Result type for structural operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors raised by structural operations. These signal a caller bug, not
/// malformed content: malformed content is always normalized instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
  #[error("offset must be a number to split text node {0:?}")]
  NonNumericOffset(NodeId),
  #[error("cannot split text node {0:?} with no parent")]
  NoParent(NodeId),
  #[error(transparent)]
  Dom(#[from] DomError),
}

/// A [`Dom`] plus the memoized inline/block/container classification of its
/// nodes. Dereferences to the `Dom` for raw tree access.
///
/// The classifier keys its cache on the `Dom` revision, so any mutation made
/// through this type (or through the `Dom` it derefs to) invalidates every
/// cached category before the next read.
#[derive(Debug, Default)]
pub struct Tree {
  dom:        Dom,
  classifier: Classifier,
}

impl Tree {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_dom(dom: Dom) -> Self {
    Self {
      dom,
      classifier: Classifier::default(),
    }
  }

  pub fn dom(&self) -> &Dom {
    &self.dom
  }

  pub fn dom_mut(&mut self) -> &mut Dom {
    &mut self.dom
  }

  pub fn into_dom(self) -> Dom {
    self.dom
  }

  pub fn category(&self, id: NodeId) -> Category {
    self.classifier.classify(&self.dom, id)
  }

  pub fn is_inline(&self, id: NodeId) -> bool {
    self.category(id) == Category::Inline
  }

  pub fn is_block(&self, id: NodeId) -> bool {
    self.category(id) == Category::Block
  }

  pub fn is_container(&self, id: NodeId) -> bool {
    self.category(id) == Category::Container
  }

  pub fn is_leaf(&self, id: NodeId) -> bool {
    crate::category::is_leaf(&self.dom, id)
  }

  /// Drops every cached category.
  pub fn invalidate_all(&self) {
    self.classifier.invalidate_all();
  }

  /// Nearest inclusive ancestor of `node` that is not inline.
  pub fn non_inline_ancestor(&self, node: NodeId) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(n) = current {
      if !self.is_inline(n) {
        return Some(n);
      }
      current = self.parent(n);
    }
    None
  }
}

impl Deref for Tree {
  type Target = Dom;

  fn deref(&self) -> &Dom {
    &self.dom
  }
}

impl DerefMut for Tree {
  fn deref_mut(&mut self) -> &mut Dom {
    &mut self.dom
  }
}
