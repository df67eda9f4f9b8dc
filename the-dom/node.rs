//! Arena-backed markup tree.
//!
//! Every node lives in a single [`HopSlotMap`] owned by the [`Dom`]. Nodes
//! hold a parent link and an ordered child list, so the structure is a strict
//! tree: inserting a node somewhere always detaches it from its old parent
//! first. Detached nodes stay in the arena until [`Dom::retain_reachable`]
//! sweeps them, which lets callers hold ids of nodes they temporarily pulled
//! out of the document.

use indexmap::IndexMap;
use slotmap::HopSlotMap;
use smallvec::SmallVec;
use the_core::text::{
  char_len,
  char_range_to_bytes,
  char_to_byte,
  split_at_char,
};
use thiserror::Error;

use crate::{
  Tendril,
  tags,
};

slotmap::new_key_type! {
  pub struct NodeId;
}

pub type Attributes = IndexMap<Tendril, String>;

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, DomError>;

/// Errors that can occur while mutating the tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
  #[error("node {0:?} does not exist")]
  Missing(NodeId),
  #[error("node {0:?} cannot hold children")]
  NotAContainer(NodeId),
  #[error("node {0:?} is not a text node")]
  NotText(NodeId),
  #[error("node {0:?} has no parent")]
  Detached(NodeId),
  #[error("{reference:?} is not a child of {parent:?}")]
  NotAChild { parent: NodeId, reference: NodeId },
  #[error("inserting {child:?} into {parent:?} would create a cycle")]
  Cycle { parent: NodeId, child: NodeId },
  #[error("offset {offset} is out of bounds (max: {max})")]
  OffsetOutOfBounds { offset: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
  /// Lower-case tag name.
  pub tag:        Tendril,
  pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
  Text(String),
  Element(Element),
  /// Unrooted staging container. Inserting a fragment moves its children.
  Fragment,
}

#[derive(Debug)]
struct Node {
  parent:   Option<NodeId>,
  children: Vec<NodeId>,
  kind:     NodeKind,
}

impl Node {
  fn new(kind: NodeKind) -> Self {
    Self {
      parent: None,
      children: Vec::new(),
      kind,
    }
  }
}

#[derive(Debug, Default)]
pub struct Dom {
  nodes:    HopSlotMap<NodeId, Node>,
  /// Bumped by every mutation, structural or textual.
  revision: u64,
}

impl Dom {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn revision(&self) -> u64 {
    self.revision
  }

  #[inline]
  fn touch(&mut self) {
    self.revision = self.revision.wrapping_add(1);
  }

  /// Number of nodes held by the arena, attached or not.
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn exists(&self, id: NodeId) -> bool {
    self.nodes.contains_key(id)
  }

  // Construction.

  pub fn create_text(&mut self, data: impl Into<String>) -> NodeId {
    self.touch();
    self.nodes.insert(Node::new(NodeKind::Text(data.into())))
  }

  pub fn create_element(&mut self, tag: &str) -> NodeId {
    self.create_element_with(tag, std::iter::empty::<(&str, &str)>())
  }

  pub fn create_element_with<K, V>(
    &mut self,
    tag: &str,
    attributes: impl IntoIterator<Item = (K, V)>,
  ) -> NodeId
  where
    K: AsRef<str>,
    V: Into<String>,
  {
    let attributes = attributes
      .into_iter()
      .map(|(k, v)| (Tendril::from(k.as_ref().to_ascii_lowercase()), v.into()))
      .collect();
    self.touch();
    self.nodes.insert(Node::new(NodeKind::Element(Element {
      tag: Tendril::from(tag.to_ascii_lowercase()),
      attributes,
    })))
  }

  pub fn create_fragment(&mut self) -> NodeId {
    self.touch();
    self.nodes.insert(Node::new(NodeKind::Fragment))
  }

  // Inspection.

  pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
    self.nodes.get(id).map(|node| &node.kind)
  }

  pub fn is_text(&self, id: NodeId) -> bool {
    matches!(self.kind(id), Some(NodeKind::Text(_)))
  }

  pub fn is_element(&self, id: NodeId) -> bool {
    matches!(self.kind(id), Some(NodeKind::Element(_)))
  }

  pub fn is_fragment(&self, id: NodeId) -> bool {
    matches!(self.kind(id), Some(NodeKind::Fragment))
  }

  pub fn element(&self, id: NodeId) -> Option<&Element> {
    match self.kind(id)? {
      NodeKind::Element(element) => Some(element),
      _ => None,
    }
  }

  /// Lower-case tag name of an element.
  pub fn tag(&self, id: NodeId) -> Option<&str> {
    self.element(id).map(|element| element.tag.as_str())
  }

  pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
    self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
  }

  /// `#text`, `#fragment`, or the tag name.
  pub fn node_name(&self, id: NodeId) -> &str {
    match self.kind(id) {
      Some(NodeKind::Text(_)) => "#text",
      Some(NodeKind::Element(element)) => element.tag.as_str(),
      Some(NodeKind::Fragment) | None => "#fragment",
    }
  }

  pub fn text(&self, id: NodeId) -> Option<&str> {
    match self.kind(id)? {
      NodeKind::Text(data) => Some(data.as_str()),
      _ => None,
    }
  }

  pub fn attributes(&self, id: NodeId) -> Option<&Attributes> {
    self.element(id).map(|element| &element.attributes)
  }

  pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
    self
      .attributes(id)?
      .get(name.to_ascii_lowercase().as_str())
      .map(String::as_str)
  }

  pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<()> {
    let element = self.element_mut(id)?;
    element
      .attributes
      .insert(Tendril::from(name.to_ascii_lowercase()), value.into());
    self.touch();
    Ok(())
  }

  pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
    let element = self.element_mut(id).ok()?;
    let removed = element
      .attributes
      .shift_remove(name.to_ascii_lowercase().as_str());
    if removed.is_some() {
      self.touch();
    }
    removed
  }

  fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
    match self.nodes.get_mut(id).map(|node| &mut node.kind) {
      Some(NodeKind::Element(element)) => Ok(element),
      Some(_) => Err(DomError::NotAContainer(id)),
      None => Err(DomError::Missing(id)),
    }
  }

  /// Text nodes and void elements cannot hold children.
  pub fn can_have_children(&self, id: NodeId) -> bool {
    match self.kind(id) {
      Some(NodeKind::Element(element)) => !tags::is_void_tag(&element.tag),
      Some(NodeKind::Fragment) => true,
      _ => false,
    }
  }

  // Navigation.

  pub fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.nodes.get(id)?.parent
  }

  pub fn children(&self, id: NodeId) -> &[NodeId] {
    self
      .nodes
      .get(id)
      .map(|node| node.children.as_slice())
      .unwrap_or(&[])
  }

  pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
    self.children(id).get(index).copied()
  }

  pub fn child_count(&self, id: NodeId) -> usize {
    self.children(id).len()
  }

  pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
    self.children(id).first().copied()
  }

  pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
    self.children(id).last().copied()
  }

  /// Position of `id` among its parent's children.
  pub fn index_of(&self, id: NodeId) -> Option<usize> {
    let parent = self.parent(id)?;
    self.children(parent).iter().position(|&child| child == id)
  }

  pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
    let parent = self.parent(id)?;
    let index = self.index_of(id)?;
    self.child(parent, index + 1)
  }

  pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
    let parent = self.parent(id)?;
    let index = self.index_of(id)?;
    index.checked_sub(1).and_then(|i| self.child(parent, i))
  }

  /// Chars of a text node, or children of anything else.
  pub fn len(&self, id: NodeId) -> usize {
    match self.kind(id) {
      Some(NodeKind::Text(data)) => char_len(data),
      Some(_) => self.child_count(id),
      None => 0,
    }
  }

  /// Strict ancestors, nearest first.
  pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(self.parent(id), move |&node| self.parent(node))
  }

  /// Inclusive containment: a node contains itself.
  pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
    node == ancestor || self.ancestors(node).any(|a| a == ancestor)
  }

  /// Topmost ancestor of `id`, or `id` itself when detached.
  pub fn top(&self, id: NodeId) -> NodeId {
    self.ancestors(id).last().unwrap_or(id)
  }

  /// Child indices leading from the topmost ancestor down to `id`.
  pub fn path_from_root(&self, id: NodeId) -> SmallVec<[usize; 16]> {
    let mut path = SmallVec::new();
    let mut node = id;
    while let Some(index) = self.index_of(node) {
      path.push(index);
      node = match self.parent(node) {
        Some(parent) => parent,
        None => break,
      };
    }
    path.reverse();
    path
  }

  /// Pre-order walk of everything below `id`, excluding `id`.
  pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
    let mut stack: Vec<NodeId> = self.children(id).to_vec();
    stack.reverse();
    Descendants { dom: self, stack }
  }

  /// Concatenated text of every descendant text node.
  pub fn text_content(&self, id: NodeId) -> String {
    if let Some(data) = self.text(id) {
      return data.to_owned();
    }
    self
      .descendants(id)
      .filter_map(|node| self.text(node))
      .collect()
  }

  // Structural mutation.

  /// Inserts `child` into `parent` before `reference`, or at the end when
  /// `reference` is `None`. A fragment contributes its children instead of
  /// itself and is left empty.
  pub fn insert_before(
    &mut self,
    parent: NodeId,
    child: NodeId,
    reference: Option<NodeId>,
  ) -> Result<()> {
    if !self.exists(parent) {
      return Err(DomError::Missing(parent));
    }
    if !self.exists(child) {
      return Err(DomError::Missing(child));
    }
    if !self.can_have_children(parent) {
      return Err(DomError::NotAContainer(parent));
    }
    if self.contains(child, parent) {
      return Err(DomError::Cycle { parent, child });
    }
    if let Some(reference) = reference
      && self.parent(reference) != Some(parent)
    {
      return Err(DomError::NotAChild { parent, reference });
    }

    let moving: Vec<NodeId> = if self.is_fragment(child) {
      std::mem::take(&mut self.nodes[child].children)
    } else {
      vec![child]
    };

    // Inserting a node before itself means inserting before its successor.
    let mut reference = reference;
    while let Some(r) = reference
      && moving.contains(&r)
    {
      reference = self.next_sibling(r);
    }

    for &node in &moving {
      self.unlink(node);
    }
    let mut index = match reference {
      Some(r) => self.index_of(r).unwrap_or(self.child_count(parent)),
      None => self.child_count(parent),
    };
    for node in moving {
      self.nodes[node].parent = Some(parent);
      self.nodes[parent].children.insert(index, node);
      index += 1;
    }
    self.touch();
    Ok(())
  }

  pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
    self.insert_before(parent, child, None)
  }

  /// Inserts at a child index; indices past the end append.
  pub fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
    let reference = self.child(parent, index);
    self.insert_before(parent, child, reference)
  }

  pub fn insert_after(&mut self, node: NodeId, new: NodeId) -> Result<()> {
    let parent = self.parent(node).ok_or(DomError::Detached(node))?;
    let reference = self.next_sibling(node);
    self.insert_before(parent, new, reference)
  }

  fn unlink(&mut self, id: NodeId) {
    let Some(parent) = self.nodes.get_mut(id).and_then(|node| node.parent.take()) else {
      return;
    };
    if let Some(parent) = self.nodes.get_mut(parent) {
      parent.children.retain(|&child| child != id);
    }
  }

  /// Removes `id` from its parent. The node and its subtree stay allocated.
  pub fn detach(&mut self, id: NodeId) {
    if self.parent(id).is_some() {
      self.unlink(id);
      self.touch();
    }
  }

  /// Detaches `id` and frees it along with its whole subtree.
  pub fn remove(&mut self, id: NodeId) {
    self.detach(id);
    let mut stack = vec![id];
    while let Some(node) = stack.pop() {
      if let Some(node) = self.nodes.remove(node) {
        stack.extend(node.children);
      }
    }
    self.touch();
  }

  /// Puts `new` where `old` is and detaches `old`.
  pub fn replace_with(&mut self, old: NodeId, new: NodeId) -> Result<()> {
    let parent = self.parent(old).ok_or(DomError::Detached(old))?;
    self.insert_before(parent, new, Some(old))?;
    self.detach(old);
    Ok(())
  }

  /// Moves every child of `id` into a new fragment and returns it.
  pub fn empty(&mut self, id: NodeId) -> Result<NodeId> {
    let fragment = self.create_fragment();
    self.move_children(id, fragment)?;
    Ok(fragment)
  }

  /// Appends all children of `from` to `to`, keeping their order.
  pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
    for child in self.children(from).to_vec() {
      self.append(to, child)?;
    }
    Ok(())
  }

  /// Replaces `id` by its children.
  pub fn unwrap(&mut self, id: NodeId) -> Result<()> {
    let fragment = self.empty(id)?;
    self.replace_with(id, fragment)
  }

  // Character data.

  fn text_mut(&mut self, id: NodeId) -> Result<&mut String> {
    match self.nodes.get_mut(id).map(|node| &mut node.kind) {
      Some(NodeKind::Text(data)) => Ok(data),
      Some(_) => Err(DomError::NotText(id)),
      None => Err(DomError::Missing(id)),
    }
  }

  pub fn set_text(&mut self, id: NodeId, data: impl Into<String>) -> Result<()> {
    *self.text_mut(id)? = data.into();
    self.touch();
    Ok(())
  }

  pub fn append_text(&mut self, id: NodeId, data: &str) -> Result<()> {
    self.text_mut(id)?.push_str(data);
    self.touch();
    Ok(())
  }

  pub fn insert_text(&mut self, id: NodeId, offset: usize, data: &str) -> Result<()> {
    let text = self.text_mut(id)?;
    let max = char_len(text);
    if offset > max {
      return Err(DomError::OffsetOutOfBounds { offset, max });
    }
    let byte = char_to_byte(text, offset);
    text.insert_str(byte, data);
    self.touch();
    Ok(())
  }

  /// Deletes chars `start..end`.
  pub fn delete_text(&mut self, id: NodeId, start: usize, end: usize) -> Result<()> {
    let text = self.text_mut(id)?;
    let max = char_len(text);
    if start > max {
      return Err(DomError::OffsetOutOfBounds { offset: start, max });
    }
    let range = char_range_to_bytes(text, start, end.min(max));
    text.replace_range(range, "");
    self.touch();
    Ok(())
  }

  /// Splits a text node at a char offset. The tail becomes a new text node
  /// inserted right after the original when it has a parent.
  pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId> {
    let text = self.text_mut(id)?;
    let max = char_len(text);
    if offset > max {
      return Err(DomError::OffsetOutOfBounds { offset, max });
    }
    let (head, tail) = split_at_char(text, offset);
    let (head, tail) = (head.to_owned(), tail.to_owned());
    *text = head;
    let new = self.create_text(tail);
    if self.parent(id).is_some() {
      self.insert_after(id, new)?;
    }
    Ok(new)
  }

  // Cloning.

  /// Copies the node without its children.
  pub fn clone_shallow(&mut self, id: NodeId) -> Result<NodeId> {
    let kind = self.kind(id).ok_or(DomError::Missing(id))?.clone();
    self.touch();
    Ok(self.nodes.insert(Node::new(kind)))
  }

  pub fn clone_deep(&mut self, id: NodeId) -> Result<NodeId> {
    let copy = self.clone_shallow(id)?;
    for child in self.children(id).to_vec() {
      let child = self.clone_deep(child)?;
      self.append(copy, child)?;
    }
    Ok(copy)
  }

  /// Frees every node that is not a descendant of one of `roots`' topmost
  /// ancestors.
  pub fn retain_reachable(&mut self, roots: &[NodeId]) {
    let mut keep = std::collections::HashSet::new();
    for &root in roots {
      let top = self.top(root);
      if !keep.insert(top) {
        continue;
      }
      keep.extend(self.descendants(top));
    }
    let before = self.nodes.len();
    self.nodes.retain(|id, _| keep.contains(&id));
    if self.nodes.len() != before {
      tracing::trace!(freed = before - self.nodes.len(), "swept detached nodes");
      self.touch();
    }
  }
}

pub struct Descendants<'a> {
  dom:   &'a Dom,
  stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
  type Item = NodeId;

  fn next(&mut self) -> Option<NodeId> {
    let node = self.stack.pop()?;
    self
      .stack
      .extend(self.dom.children(node).iter().rev().copied());
    Some(node)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn div_with_text(dom: &mut Dom, text: &str) -> (NodeId, NodeId) {
    let div = dom.create_element("DIV");
    let t = dom.create_text(text);
    dom.append(div, t).unwrap();
    (div, t)
  }

  #[test]
  fn tags_are_lowercased() {
    let mut dom = Dom::new();
    let el = dom.create_element_with("SPAN", [("Class", "x")]);
    assert_eq!(dom.tag(el), Some("span"));
    assert!(dom.has_tag(el, "SPAN"));
    assert_eq!(dom.attribute(el, "CLASS"), Some("x"));
    assert_eq!(dom.node_name(el), "span");
  }

  #[test]
  fn insert_moves_between_parents() {
    let mut dom = Dom::new();
    let (a, t) = div_with_text(&mut dom, "x");
    let b = dom.create_element("p");
    dom.append(b, t).unwrap();
    assert!(dom.children(a).is_empty());
    assert_eq!(dom.children(b), &[t]);
    assert_eq!(dom.parent(t), Some(b));
  }

  #[test]
  fn fragment_insertion_moves_children() {
    let mut dom = Dom::new();
    let (div, t) = div_with_text(&mut dom, "c");
    let frag = dom.create_fragment();
    let a = dom.create_text("a");
    let b = dom.create_text("b");
    dom.append(frag, a).unwrap();
    dom.append(frag, b).unwrap();
    dom.insert_before(div, frag, Some(t)).unwrap();
    assert_eq!(dom.children(div), &[a, b, t]);
    assert!(dom.children(frag).is_empty());
    assert_eq!(dom.text_content(div), "abc");
  }

  #[test]
  fn rejects_cycles_and_void_parents() {
    let mut dom = Dom::new();
    let (div, t) = div_with_text(&mut dom, "x");
    let inner = dom.create_element("b");
    dom.append(div, inner).unwrap();
    assert_eq!(
      dom.append(inner, div),
      Err(DomError::Cycle {
        parent: inner,
        child:  div,
      })
    );
    let br = dom.create_element("br");
    assert_eq!(dom.append(br, t), Err(DomError::NotAContainer(br)));
    assert_eq!(dom.append(t, br), Err(DomError::NotAContainer(t)));
  }

  #[test]
  fn insert_before_self_is_a_noop() {
    let mut dom = Dom::new();
    let (div, t) = div_with_text(&mut dom, "x");
    let u = dom.create_text("y");
    dom.append(div, u).unwrap();
    dom.insert_before(div, t, Some(t)).unwrap();
    assert_eq!(dom.children(div), &[t, u]);
  }

  #[test]
  fn split_text_inserts_tail() {
    let mut dom = Dom::new();
    let (div, t) = div_with_text(&mut dom, "héllo");
    let tail = dom.split_text(t, 2).unwrap();
    assert_eq!(dom.text(t), Some("hé"));
    assert_eq!(dom.text(tail), Some("llo"));
    assert_eq!(dom.children(div), &[t, tail]);
    assert_eq!(
      dom.split_text(t, 9),
      Err(DomError::OffsetOutOfBounds { offset: 9, max: 2 })
    );
  }

  #[test]
  fn text_edits() {
    let mut dom = Dom::new();
    let t = dom.create_text("abc");
    dom.insert_text(t, 1, "XY").unwrap();
    assert_eq!(dom.text(t), Some("aXYbc"));
    dom.delete_text(t, 1, 3).unwrap();
    assert_eq!(dom.text(t), Some("abc"));
    dom.append_text(t, "d").unwrap();
    assert_eq!(dom.len(t), 4);
  }

  #[test]
  fn siblings_and_paths() {
    let mut dom = Dom::new();
    let root = dom.create_element("div");
    let p1 = dom.create_element("p");
    let p2 = dom.create_element("p");
    let t = dom.create_text("x");
    dom.append(root, p1).unwrap();
    dom.append(root, p2).unwrap();
    dom.append(p2, t).unwrap();
    assert_eq!(dom.next_sibling(p1), Some(p2));
    assert_eq!(dom.previous_sibling(p2), Some(p1));
    assert_eq!(dom.previous_sibling(p1), None);
    assert_eq!(dom.path_from_root(t).as_slice(), &[1, 0]);
    assert!(dom.contains(root, t));
    assert!(!dom.contains(p1, t));
    assert_eq!(dom.top(t), root);
    assert_eq!(dom.descendants(root).collect::<Vec<_>>(), vec![p1, p2, t]);
  }

  #[test]
  fn unwrap_and_replace() {
    let mut dom = Dom::new();
    let root = dom.create_element("div");
    let b = dom.create_element("b");
    let t = dom.create_text("x");
    dom.append(root, b).unwrap();
    dom.append(b, t).unwrap();
    dom.unwrap(b).unwrap();
    assert_eq!(dom.children(root), &[t]);
    let i = dom.create_element("i");
    dom.replace_with(t, i).unwrap();
    assert_eq!(dom.children(root), &[i]);
    assert_eq!(dom.parent(t), None);
  }

  #[test]
  fn clones() {
    let mut dom = Dom::new();
    let (div, _) = div_with_text(&mut dom, "x");
    dom.set_attribute(div, "dir", "rtl").unwrap();
    let shallow = dom.clone_shallow(div).unwrap();
    assert!(dom.children(shallow).is_empty());
    assert_eq!(dom.attribute(shallow, "dir"), Some("rtl"));
    let deep = dom.clone_deep(div).unwrap();
    assert_eq!(dom.text_content(deep), "x");
  }

  #[test]
  fn sweep_keeps_reachable() {
    let mut dom = Dom::new();
    let (div, t) = div_with_text(&mut dom, "x");
    let stray = dom.create_text("gone");
    dom.retain_reachable(&[t]);
    assert!(dom.exists(div));
    assert!(dom.exists(t));
    assert!(!dom.exists(stray));
  }

  #[test]
  fn revision_moves_on_mutation() {
    let mut dom = Dom::new();
    let (_, t) = div_with_text(&mut dom, "x");
    let before = dom.revision();
    dom.append_text(t, "y").unwrap();
    assert!(dom.revision() > before);
  }

  quickcheck::quickcheck! {
    fn split_text_keeps_content(s: String, idx: usize) -> bool {
      let mut dom = Dom::new();
      let (div, t) = div_with_text(&mut dom, &s);
      let offset = idx % (dom.len(t) + 1);
      let tail = dom.split_text(t, offset).unwrap();
      dom.len(t) == offset && dom.text_content(div) == s && dom.children(div) == &[t, tail]
    }

    fn detached_nodes_are_swept(count: u8) -> bool {
      let mut dom = Dom::new();
      let (div, t) = div_with_text(&mut dom, "x");
      for _ in 0..count {
        let stray = dom.create_element("b");
        dom.append(div, stray).unwrap();
        dom.detach(stray);
      }
      dom.retain_reachable(&[div]);
      dom.node_count() == 2 && dom.exists(t)
    }
  }
}
