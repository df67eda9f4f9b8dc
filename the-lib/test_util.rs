//! Fixtures shared by the in-crate tests.

use the_dom::markup::{
  parse_fragment,
  serialize_children,
};

use crate::{
  NodeId,
  range::{
    Point,
    PseudoRange,
  },
  tree::Tree,
};

/// Builds a tree whose editable root is a `<div>` holding `markup`.
pub fn tree_from(markup: &str) -> (Tree, NodeId) {
  let mut tree = Tree::new();
  let root = tree.create_element("div");
  let frag = parse_fragment(&mut tree, markup).unwrap();
  tree.append(root, frag).unwrap();
  (tree, root)
}

pub fn html(tree: &Tree, root: NodeId) -> String {
  serialize_children(tree, root)
}

/// First text node under `root` whose data equals `data`.
pub fn text_node(tree: &Tree, root: NodeId, data: &str) -> NodeId {
  tree
    .descendants(root)
    .find(|&n| tree.text(n) == Some(data))
    .unwrap_or_else(|| panic!("no text node {data:?}"))
}

/// `nth` element with `tag` under `root`, in document order.
pub fn element(tree: &Tree, root: NodeId, tag: &str, nth: usize) -> NodeId {
  tree
    .descendants(root)
    .filter(|&n| tree.has_tag(n, tag))
    .nth(nth)
    .unwrap_or_else(|| panic!("no {tag} #{nth}"))
}

pub fn caret(node: NodeId, offset: usize) -> PseudoRange {
  PseudoRange::collapsed(Point::new(node, offset))
}

pub fn span(tree: &Tree, start: (NodeId, usize), end: (NodeId, usize)) -> PseudoRange {
  PseudoRange::new(tree, Point::new(start.0, start.1), Point::new(end.0, end.1))
}
