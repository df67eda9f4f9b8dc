//! Selection bookmarks: a pair of hidden marker elements that carry a range
//! across mutations (and serialization) that can't track offsets.

use std::cmp::Ordering;

use the_dom::NodeId;

use crate::{
  insert_delete::insert_node_in_range,
  merge_split::merge_inlines,
  range::{
    Point,
    PseudoRange,
    compare_points,
  },
  tree::{
    Result,
    Tree,
  },
};

pub const START_SELECTION_ID: &str = "rte-selection-start";
pub const END_SELECTION_ID: &str = "rte-selection-end";

pub(crate) fn create_marker(tree: &mut Tree, id: &str) -> NodeId {
  tree.create_element_with("input", [("id", id), ("type", "hidden")])
}

/// Whether `node` is one of the two bookmark markers.
pub fn is_marker(tree: &Tree, node: NodeId) -> bool {
  tree.has_tag(node, "input")
    && matches!(
      tree.attribute(node, "id"),
      Some(START_SELECTION_ID | END_SELECTION_ID)
    )
}

fn find_marker(tree: &Tree, root: NodeId, id: &str) -> Option<NodeId> {
  tree
    .descendants(root)
    .find(|&n| tree.has_tag(n, "input") && tree.attribute(n, "id") == Some(id))
}

/// Inserts the markers at both ends of `range`, which is then moved to sit
/// between them.
pub fn save_range_to_bookmark(tree: &mut Tree, range: &mut PseudoRange) -> Result<()> {
  let mut start = create_marker(tree, START_SELECTION_ID);
  let mut end = create_marker(tree, END_SELECTION_ID);

  insert_node_in_range(tree, range, start)?;
  range.collapse(false);
  insert_node_in_range(tree, range, end)?;

  // Inserting at a collapsed point can leave the start marker after the
  // end marker.
  if let (Some(a), Some(b)) = (Point::before(tree, start), Point::before(tree, end))
    && compare_points(tree, a, b) == Ordering::Greater
  {
    tree.set_attribute(start, "id", END_SELECTION_ID)?;
    tree.set_attribute(end, "id", START_SELECTION_ID)?;
    std::mem::swap(&mut start, &mut end);
  }

  range.set_start_after(tree, start);
  range.set_end_before(tree, end);
  Ok(())
}

/// Removes the markers under `root` and returns the range they delimited,
/// with any text split by the markers merged back. `None` when either
/// marker is missing; a lone marker is removed all the same.
pub fn get_range_and_remove_bookmark(tree: &mut Tree, root: NodeId) -> Result<Option<PseudoRange>> {
  let start = find_marker(tree, root, START_SELECTION_ID);
  let end = find_marker(tree, root, END_SELECTION_ID);
  let (Some(start), Some(end)) = (start, end) else {
    for marker in start.into_iter().chain(end) {
      tree.detach(marker);
    }
    return Ok(None);
  };

  let (Some(start_container), Some(end_container)) = (tree.parent(start), tree.parent(end)) else {
    return Ok(None);
  };
  let start_offset = tree.index_of(start).unwrap_or(0);
  let mut end_offset = tree.index_of(end).unwrap_or(0);
  if start_container == end_container {
    end_offset = end_offset.saturating_sub(1);
  }

  tree.detach(start);
  tree.detach(end);

  let mut range = PseudoRange::new(
    tree,
    Point::new(start_container, start_offset),
    Point::new(end_container, end_offset),
  );

  merge_inlines(tree, start_container, &mut range)?;
  if start_container != end_container {
    merge_inlines(tree, end_container, &mut range)?;
  }

  // Nothing was split: step into adjacent text so typing joins it.
  if range.is_collapsed() && !tree.is_text(range.start.node) {
    let Point { node, offset } = range.start;
    let after = tree.child(node, offset).filter(|&n| tree.is_text(n));
    let before = offset.checked_sub(1).and_then(|i| tree.child(node, i)).filter(|&n| tree.is_text(n));
    if let Some(text) = after {
      range = PseudoRange::collapsed(Point::new(text, 0));
    } else if let Some(text) = before {
      range = PseudoRange::collapsed(Point::new(text, tree.len(text)));
    }
  }

  tracing::debug!(?range, "resolved bookmark");
  Ok(Some(range))
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    merge_split::{
      SplitAt,
      merge_containers,
      split,
    },
    test_util::*,
  };

  #[test]
  fn markers_wrap_the_selection() {
    let (mut tree, root) = tree_from("<p>abcd</p>");
    let t = text_node(&tree, root, "abcd");
    let p = element(&tree, root, "p", 0);
    let mut range = span(&tree, (t, 1), (t, 3));
    save_range_to_bookmark(&mut tree, &mut range).unwrap();
    assert_eq!(
      html(&tree, root),
      "<p>a<input id=\"rte-selection-start\" type=\"hidden\">bc<input id=\"rte-selection-end\" \
       type=\"hidden\">d</p>"
    );
    assert_eq!(range, span(&tree, (p, 2), (p, 3)));
  }

  #[test]
  fn round_trip_restores_range() {
    let (mut tree, root) = tree_from("<p>abcd</p>");
    let t = text_node(&tree, root, "abcd");
    let original = span(&tree, (t, 1), (t, 3));
    let mut range = original;
    save_range_to_bookmark(&mut tree, &mut range).unwrap();
    let restored = get_range_and_remove_bookmark(&mut tree, root).unwrap();
    assert_eq!(html(&tree, root), "<p>abcd</p>");
    assert_eq!(restored, Some(original));
  }

  #[test]
  fn collapsed_round_trip() {
    let (mut tree, root) = tree_from("<p>abcd</p>");
    let t = text_node(&tree, root, "abcd");
    let mut range = caret(t, 2);
    save_range_to_bookmark(&mut tree, &mut range).unwrap();
    let start = find_marker(&tree, root, START_SELECTION_ID).unwrap();
    let end = find_marker(&tree, root, END_SELECTION_ID).unwrap();
    assert_eq!(tree.next_sibling(start), Some(end));
    let restored = get_range_and_remove_bookmark(&mut tree, root).unwrap();
    assert_eq!(html(&tree, root), "<p>abcd</p>");
    assert_eq!(restored, Some(caret(t, 2)));
  }

  #[test]
  fn survives_a_block_split() {
    let (mut tree, root) = tree_from("<p>abcd</p>");
    let t = text_node(&tree, root, "abcd");
    let p = element(&tree, root, "p", 0);
    let mut range = caret(t, 3);
    save_range_to_bookmark(&mut tree, &mut range).unwrap();
    // Children are now [abc, start, end, d].
    split(&mut tree, p, SplitAt::Offset(1), root, root).unwrap();
    let restored = get_range_and_remove_bookmark(&mut tree, root).unwrap().unwrap();
    assert_eq!(html(&tree, root), "<p>abc<br></p><p>d<br></p>");
    let d = text_node(&tree, root, "d");
    assert_eq!(restored, caret(d, 0));
  }

  #[test]
  fn survives_a_container_merge() {
    let (mut tree, root) =
      tree_from("<blockquote><p>ab</p></blockquote><blockquote><p>cd</p></blockquote>");
    let t = text_node(&tree, root, "cd");
    let second = element(&tree, root, "blockquote", 1);
    let mut range = caret(t, 1);
    save_range_to_bookmark(&mut tree, &mut range).unwrap();
    merge_containers(&mut tree, second, root, "div").unwrap();
    let restored = get_range_and_remove_bookmark(&mut tree, root).unwrap().unwrap();
    assert_eq!(html(&tree, root), "<blockquote><p>ab</p><p>cd</p></blockquote>");
    let cd = text_node(&tree, root, "cd");
    assert_eq!(restored, caret(cd, 1));
  }

  #[test]
  fn lone_marker_is_dropped() {
    let (mut tree, root) = tree_from("<p>ab<input id=\"rte-selection-start\" type=\"hidden\"></p>");
    assert_eq!(get_range_and_remove_bookmark(&mut tree, root).unwrap(), None);
    assert_eq!(html(&tree, root), "<p>ab</p>");
  }
}
