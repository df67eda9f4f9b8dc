use std::{
  cell::RefCell,
  collections::HashMap,
};

use the_dom::{
  Dom,
  NodeId,
  NodeKind,
  tags,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
  /// Not a node the classifier knows about.
  Unknown,
  Inline,
  Block,
  Container,
}

/// Memoizes node categories for one [`Dom`].
///
/// Entries are only ever dropped all at once: either explicitly through
/// [`Classifier::invalidate_all`] or implicitly when the `Dom` revision moved
/// since the cache was filled.
#[derive(Debug, Default)]
pub struct Classifier {
  cache: RefCell<Cache>,
}

#[derive(Debug, Default)]
struct Cache {
  revision: Option<u64>,
  entries:  HashMap<NodeId, Category>,
}

impl Classifier {
  pub fn new() -> Self {
    Self::default()
  }

  /// Text is always inline. An element or fragment whose children are all
  /// inline is inline when its tag is an inline tag and a block otherwise;
  /// anything holding a non-inline child is a container, which keeps an
  /// inline tag wrapped around block content from being treated as inline.
  pub fn classify(&self, dom: &Dom, id: NodeId) -> Category {
    match dom.kind(id) {
      None => return Category::Unknown,
      Some(NodeKind::Text(_)) => return Category::Inline,
      Some(_) => {},
    }

    {
      let mut cache = self.cache.borrow_mut();
      if cache.revision != Some(dom.revision()) {
        cache.entries.clear();
        cache.revision = Some(dom.revision());
      }
      if let Some(&category) = cache.entries.get(&id) {
        return category;
      }
    }

    let all_inline = dom
      .children(id)
      .iter()
      .all(|&child| self.classify(dom, child) == Category::Inline);
    let category = if !all_inline {
      Category::Container
    } else if dom.tag(id).is_some_and(tags::is_inline_tag) {
      Category::Inline
    } else {
      Category::Block
    };

    self.cache.borrow_mut().entries.insert(id, category);
    category
  }

  pub fn invalidate_all(&self) {
    let mut cache = self.cache.borrow_mut();
    cache.entries.clear();
    cache.revision = None;
  }

  /// Number of memoized entries.
  pub fn cached(&self) -> usize {
    self.cache.borrow().entries.len()
  }
}

/// Line breaks, rules and images: atomic inline content.
pub fn is_leaf(dom: &Dom, id: NodeId) -> bool {
  dom.tag(id).is_some_and(tags::is_leaf_tag)
}
