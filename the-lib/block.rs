//! Blocks touched by a range and whether a range sits at a block edge.

use the_core::{
  chars::ZWS,
  text::has_visible_content,
};
use the_dom::NodeId;

use crate::{
  node::{
    get_node_after_offset,
    get_node_before_offset,
  },
  range::{
    PseudoRange,
    is_node_contained_in_range,
  },
  tree::Tree,
  walk::{
    get_next_block,
    get_previous_block,
    next_matching,
    previous_matching,
  },
};

/// First block at least partially inside `range`.
pub fn get_start_block_of_range(tree: &Tree, range: &PseudoRange, root: NodeId) -> Option<NodeId> {
  let container = range.start.node;
  let block = if tree.is_inline(container) {
    get_previous_block(tree, container, root)
  } else if container != root && tree.is_element(container) && tree.is_block(container) {
    Some(container)
  } else {
    let node = get_node_before_offset(tree, container, range.start.offset);
    get_next_block(tree, node, root)
  };
  block.filter(|&block| is_node_contained_in_range(tree, range, block, true))
}

/// Last block at least partially inside `range`.
pub fn get_end_block_of_range(tree: &Tree, range: &PseudoRange, root: NodeId) -> Option<NodeId> {
  let container = range.end.node;
  let block = if tree.is_inline(container) {
    get_previous_block(tree, container, root)
  } else if container != root && tree.is_element(container) && tree.is_block(container) {
    Some(container)
  } else {
    let node = match get_node_after_offset(tree, container, range.end.offset) {
      Some(node) if tree.contains(root, node) => node,
      _ => deepest_last(tree, root),
    };
    get_previous_block(tree, node, root)
  };
  block.filter(|&block| is_node_contained_in_range(tree, range, block, true))
}

fn deepest_last(tree: &Tree, node: NodeId) -> NodeId {
  let mut node = node;
  while let Some(last) = tree.last_child(node) {
    node = last;
  }
  node
}

// Content in the block-boundary sense: visible text or an image. Text made
// of whitespace and zero-width spaces renders as nothing.
fn is_content(tree: &Tree, node: NodeId) -> bool {
  match tree.text(node) {
    Some(data) => has_visible_content(data),
    None => tree.has_tag(node, "img"),
  }
}

/// No content precedes the start of `range` in its block. Zero-width spaces
/// don't count as content.
pub fn range_does_start_at_block_boundary(tree: &Tree, range: &PseudoRange, root: NodeId) -> bool {
  let container = range.start.node;
  let offset = range.start.offset;

  let node_after_cursor = if let Some(data) = tree.text(container) {
    if data.chars().take(offset).any(|ch| ch != ZWS) {
      return false;
    }
    container
  } else {
    match get_node_after_offset(tree, container, offset) {
      Some(node) if tree.contains(root, node) => node,
      _ => {
        // Right at the end of the document.
        let node = get_node_before_offset(tree, container, offset);
        if tree.text(node).is_some_and(|data| !data.is_empty()) {
          return false;
        }
        node
      },
    }
  };

  let Some(block) = get_start_block_of_range(tree, range, root) else {
    return false;
  };
  previous_matching(tree, block, node_after_cursor, |n| is_content(tree, n)).is_none()
}

/// No content follows the end of `range` in its block. Zero-width spaces
/// don't count as content.
pub fn range_does_end_at_block_boundary(tree: &Tree, range: &PseudoRange, root: NodeId) -> bool {
  let container = range.end.node;
  let offset = range.end.offset;

  let current = if let Some(data) = tree.text(container) {
    if data.chars().skip(offset).any(|ch| ch != ZWS) {
      return false;
    }
    container
  } else {
    get_node_before_offset(tree, container, offset)
  };

  let Some(block) = get_end_block_of_range(tree, range, root) else {
    return false;
  };
  next_matching(tree, block, current, |n| is_content(tree, n)).is_none()
}

/// Widens `range` to wholly include the blocks holding its start and end.
pub fn expand_range_to_block_boundaries(tree: &Tree, range: &mut PseudoRange, root: NodeId) {
  let start = get_start_block_of_range(tree, range, root);
  let end = get_end_block_of_range(tree, range, root);
  if let (Some(start), Some(end)) = (start, end) {
    range.set_start_before(tree, start);
    range.set_end_after(tree, end);
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::test_util::*;

  #[test]
  fn start_and_end_blocks() {
    let (tree, root) = tree_from("<p>ab</p><p><b>cd</b></p><p>ef</p>");
    let p0 = element(&tree, root, "p", 0);
    let p1 = element(&tree, root, "p", 1);
    let p2 = element(&tree, root, "p", 2);
    let ab = text_node(&tree, root, "ab");
    let cd = text_node(&tree, root, "cd");
    let ef = text_node(&tree, root, "ef");

    let range = span(&tree, (ab, 1), (cd, 1));
    assert_eq!(get_start_block_of_range(&tree, &range, root), Some(p0));
    assert_eq!(get_end_block_of_range(&tree, &range, root), Some(p1));

    let range = span(&tree, (root, 1), (root, 3));
    assert_eq!(get_start_block_of_range(&tree, &range, root), Some(p1));
    assert_eq!(get_end_block_of_range(&tree, &range, root), Some(p2));

    let range = caret(ef, 0);
    assert_eq!(get_start_block_of_range(&tree, &range, root), Some(p2));
  }

  #[test]
  fn block_edges() {
    let (tree, root) = tree_from("<p>\u{200B}ab<b>cd</b>\u{200B}</p>");
    let ab = text_node(&tree, root, "\u{200B}ab");
    let cd = text_node(&tree, root, "cd");
    let tail = text_node(&tree, root, "\u{200B}");

    assert!(range_does_start_at_block_boundary(&tree, &caret(ab, 1), root));
    assert!(!range_does_start_at_block_boundary(&tree, &caret(ab, 2), root));
    assert!(!range_does_start_at_block_boundary(&tree, &caret(cd, 0), root));

    assert!(range_does_end_at_block_boundary(&tree, &caret(cd, 2), root));
    assert!(range_does_end_at_block_boundary(&tree, &caret(tail, 0), root));
    assert!(!range_does_end_at_block_boundary(&tree, &caret(cd, 1), root));
  }

  #[test]
  fn expand_to_blocks() {
    let (tree, root) = tree_from("<p>ab</p><p>cd</p><p>ef</p>");
    let ab = text_node(&tree, root, "ab");
    let cd = text_node(&tree, root, "cd");
    let mut range = span(&tree, (ab, 1), (cd, 1));
    expand_range_to_block_boundaries(&tree, &mut range, root);
    assert_eq!(range, span(&tree, (root, 0), (root, 2)));
  }
}
