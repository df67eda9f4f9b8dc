//! Pre-order traversal as plain functions.
//!
//! Every walk is bounded by a `root` and never yields the root itself.
//! Nodes rejected by a predicate are skipped, not pruned: their descendants
//! are still visited.

use the_dom::{
  Dom,
  NodeId,
};

use crate::tree::Tree;

/// Next node after `node` in pre-order, staying inside `root`.
pub fn next_node(dom: &Dom, root: NodeId, node: NodeId) -> Option<NodeId> {
  if let Some(child) = dom.first_child(node) {
    return Some(child);
  }
  let mut current = node;
  while current != root {
    if let Some(next) = dom.next_sibling(current) {
      return Some(next);
    }
    current = dom.parent(current)?;
  }
  None
}

/// Previous node before `node` in pre-order, staying inside `root`.
pub fn previous_node(dom: &Dom, root: NodeId, node: NodeId) -> Option<NodeId> {
  if node == root {
    return None;
  }
  match dom.previous_sibling(node) {
    Some(mut previous) => {
      while let Some(last) = dom.last_child(previous) {
        previous = last;
      }
      Some(previous)
    },
    None => dom.parent(node).filter(|&parent| parent != root),
  }
}

pub fn next_matching(
  dom: &Dom,
  root: NodeId,
  node: NodeId,
  mut accept: impl FnMut(NodeId) -> bool,
) -> Option<NodeId> {
  let mut current = next_node(dom, root, node);
  while let Some(n) = current {
    if accept(n) {
      return Some(n);
    }
    current = next_node(dom, root, n);
  }
  None
}

pub fn previous_matching(
  dom: &Dom,
  root: NodeId,
  node: NodeId,
  mut accept: impl FnMut(NodeId) -> bool,
) -> Option<NodeId> {
  let mut current = previous_node(dom, root, node);
  while let Some(n) = current {
    if accept(n) {
      return Some(n);
    }
    current = previous_node(dom, root, n);
  }
  None
}

/// Previous node in post-order: the last child when there is one, else the
/// previous sibling of the nearest inclusive ancestor that has one.
pub fn previous_post_order(dom: &Dom, root: NodeId, node: NodeId) -> Option<NodeId> {
  if let Some(last) = dom.last_child(node) {
    return Some(last);
  }
  let mut current = node;
  while current != root {
    if let Some(previous) = dom.previous_sibling(current) {
      return Some(previous);
    }
    current = dom.parent(current)?;
  }
  None
}

/// Every node under `root` accepted by `accept`, in document order.
pub fn collect_matching(dom: &Dom, root: NodeId, accept: impl Fn(NodeId) -> bool) -> Vec<NodeId> {
  dom.descendants(root).filter(|&n| accept(n)).collect()
}

pub fn get_previous_block(tree: &Tree, node: NodeId, root: NodeId) -> Option<NodeId> {
  previous_matching(tree, root, node, |n| tree.is_element(n) && tree.is_block(n))
}

pub fn get_next_block(tree: &Tree, node: NodeId, root: NodeId) -> Option<NodeId> {
  next_matching(tree, root, node, |n| tree.is_element(n) && tree.is_block(n))
}

/// No text and no image anywhere below.
pub fn is_empty_block(dom: &Dom, block: NodeId) -> bool {
  dom.text_content(block).is_empty() && !dom.descendants(block).any(|n| dom.has_tag(n, "img"))
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::test_util::*;

  fn names(tree: &Tree, nodes: impl IntoIterator<Item = NodeId>) -> Vec<String> {
    nodes
      .into_iter()
      .map(|n| tree.text(n).map_or_else(|| tree.node_name(n).to_owned(), str::to_owned))
      .collect()
  }

  #[test]
  fn pre_order_both_ways() {
    let (tree, root) = tree_from("<p>a<b>b</b></p><p>c</p>");
    let forward: Vec<_> =
      std::iter::successors(next_node(&tree, root, root), |&n| next_node(&tree, root, n)).collect();
    assert_eq!(names(&tree, forward.iter().copied()), ["p", "a", "b", "b", "p", "c"]);

    let last = *forward.last().unwrap();
    let mut backward: Vec<_> =
      std::iter::successors(Some(last), |&n| previous_node(&tree, root, n)).collect();
    backward.reverse();
    assert_eq!(backward, forward);
  }

  #[test]
  fn walks_stay_inside_root() {
    let (tree, root) = tree_from("<p>a</p><p>b</p>");
    let p0 = element(&tree, root, "p", 0);
    let a = text_node(&tree, root, "a");
    assert_eq!(next_node(&tree, p0, a), None);
    assert_eq!(previous_node(&tree, p0, a), None);
  }

  #[test]
  fn post_order_backwards() {
    let (tree, root) = tree_from("<p>a<b>b</b></p><p>c</p>");
    let c = text_node(&tree, root, "c");
    let order: Vec<_> =
      std::iter::successors(Some(c), |&n| previous_post_order(&tree, root, n)).collect();
    assert_eq!(names(&tree, order), ["c", "p", "b", "b", "a"]);
  }

  #[test]
  fn blocks() {
    let (tree, root) = tree_from("<p>a</p><blockquote><p>b</p></blockquote><p><img></p><p></p>");
    let a = text_node(&tree, root, "a");
    let b = text_node(&tree, root, "b");
    let p0 = element(&tree, root, "p", 0);
    let p1 = element(&tree, root, "p", 1);
    assert_eq!(get_next_block(&tree, a, root), Some(p1));
    assert_eq!(get_previous_block(&tree, b, root), Some(p1));
    assert_eq!(get_previous_block(&tree, p1, root), Some(p0));
    assert!(!is_empty_block(&tree, element(&tree, root, "p", 2)));
    assert!(is_empty_block(&tree, element(&tree, root, "p", 3)));
  }
}
