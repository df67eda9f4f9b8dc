//! Moving range boundaries to equivalent positions up or down the tree.

use the_dom::NodeId;

use crate::{
  node::get_nearest,
  normalize::is_line_break,
  range::{
    Point,
    PseudoRange,
  },
  tree::Tree,
};

/// Pushes both boundaries as deep as they go without changing what the
/// range covers: the start lands in the deepest text node (or before a
/// leaf), the end after the deepest content. Empty text nodes next to other
/// text nodes are dropped on the way, and `<br>`s that don't break a line
/// are skipped at the end.
pub fn move_range_boundaries_down_tree(tree: &mut Tree, range: &mut PseudoRange) {
  let Point {
    node: mut start_node,
    offset: mut start_offset,
  } = range.start;
  let Point {
    node: mut end_node,
    offset: mut end_offset,
  } = range.end;

  while !tree.is_text(start_node) {
    match tree.child(start_node, start_offset) {
      Some(child) if !tree.is_leaf(child) => {
        start_node = child;
        start_offset = 0;
      },
      _ => {
        if let Some(mut child) = start_offset.checked_sub(1).and_then(|i| tree.child(start_node, i))
          && tree.is_text(child)
        {
          while tree.len(child) == 0
            && let Some(prev) = tree.previous_sibling(child)
            && tree.is_text(prev)
          {
            tree.detach(child);
            child = prev;
          }
          start_node = child;
          start_offset = tree.len(child);
        }
        break;
      },
    }
  }

  if end_offset > 0 {
    while !tree.is_text(end_node) {
      match end_offset.checked_sub(1).and_then(|i| tree.child(end_node, i)) {
        Some(child) if !tree.is_leaf(child) => {
          end_node = child;
          end_offset = tree.len(child);
        },
        Some(child) if tree.has_tag(child, "br") && !is_line_break(tree, child, false) => {
          end_offset -= 1;
        },
        _ => break,
      }
    }
  } else {
    while !tree.is_text(end_node) {
      match tree.first_child(end_node) {
        Some(child) if !tree.is_leaf(child) => end_node = child,
        _ => break,
      }
    }
  }

  range.set_start(tree, Point::new(start_node, start_offset));
  range.set_end(tree, Point::new(end_node, end_offset));
}

/// Lifts both boundaries as high as they go without changing what the
/// range covers. The start climbs while it sits at offset 0, the end while
/// it sits at its container's full length (a trailing `<br>` that doesn't
/// break a line counts as nothing). Neither climbs past its ceiling or
/// `root`; the start ceiling defaults to the common ancestor and the end
/// ceiling to the start ceiling.
pub fn move_range_boundaries_up_tree(
  tree: &Tree,
  range: &mut PseudoRange,
  start_max: Option<NodeId>,
  end_max: Option<NodeId>,
  root: NodeId,
) {
  let start_max = start_max.unwrap_or_else(|| range.common_ancestor(tree));
  let end_max = end_max.unwrap_or(start_max);
  let Point {
    node: mut start_node,
    offset: mut start_offset,
  } = range.start;
  let Point {
    node: mut end_node,
    offset: mut end_offset,
  } = range.end;

  while start_offset == 0 && start_node != start_max && start_node != root {
    let (Some(parent), Some(index)) = (tree.parent(start_node), tree.index_of(start_node)) else {
      break;
    };
    start_node = parent;
    start_offset = index;
  }

  while end_node != end_max && end_node != root {
    if !tree.is_text(end_node)
      && let Some(child) = tree.child(end_node, end_offset)
      && tree.has_tag(child, "br")
      && !is_line_break(tree, child, false)
    {
      end_offset += 1;
    }
    if end_offset != tree.len(end_node) {
      break;
    }
    let (Some(parent), Some(index)) = (tree.parent(end_node), tree.index_of(end_node)) else {
      break;
    };
    end_node = parent;
    end_offset = index + 1;
  }

  range.set_start(tree, Point::new(start_node, start_offset));
  range.set_end(tree, Point::new(end_node, end_offset));
}

/// If the range ends inside a `tag` element and nothing of that element
/// follows the end, collapses the range to right after the element, so
/// typing continues outside it.
pub fn move_range_boundary_out_of(tree: &Tree, range: &mut PseudoRange, tag: &str, root: NodeId) {
  let Some(parent) = get_nearest(tree, range.end.node, root, tag, None).and_then(|n| tree.parent(n)) else {
    return;
  };
  let mut clone = *range;
  move_range_boundaries_up_tree(tree, &mut clone, Some(parent), Some(parent), root);
  if clone.end.node == parent {
    *range = PseudoRange::collapsed(clone.end);
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::test_util::*;

  #[test]
  fn down_into_text() {
    let (mut tree, root) = tree_from("<p><b>ab</b>cd</p>");
    let p = element(&tree, root, "p", 0);
    let ab = text_node(&tree, root, "ab");
    let cd = text_node(&tree, root, "cd");
    let mut range = span(&tree, (root, 0), (p, 2));
    move_range_boundaries_down_tree(&mut tree, &mut range);
    assert_eq!(range, span(&tree, (ab, 0), (cd, 2)));
  }

  #[test]
  fn down_stops_before_leaves() {
    let (mut tree, root) = tree_from("<p>ab<img>cd</p>");
    let p = element(&tree, root, "p", 0);
    let ab = text_node(&tree, root, "ab");
    let mut range = caret(p, 1);
    move_range_boundaries_down_tree(&mut tree, &mut range);
    // Right before the image is the end of the preceding text.
    assert_eq!(range.start(), Point::new(ab, 2));
  }

  #[test]
  fn down_drops_empty_text() {
    let (mut tree, root) = tree_from("<p>ab<img></p>");
    let p = element(&tree, root, "p", 0);
    let ab = text_node(&tree, root, "ab");
    let img = element(&tree, root, "img", 0);
    let empty = tree.create_text("");
    tree.insert_before(p, empty, Some(img)).unwrap();
    let mut range = caret(p, 2);
    move_range_boundaries_down_tree(&mut tree, &mut range);
    assert_eq!(range.start(), Point::new(ab, 2));
    assert_eq!(tree.parent(empty), None);
  }

  #[test]
  fn down_skips_trailing_br() {
    let (mut tree, root) = tree_from("<p>ab<br></p>");
    let p = element(&tree, root, "p", 0);
    let ab = text_node(&tree, root, "ab");
    let mut range = span(&tree, (p, 0), (p, 2));
    move_range_boundaries_down_tree(&mut tree, &mut range);
    assert_eq!(range, span(&tree, (ab, 0), (ab, 2)));
  }

  #[test]
  fn up_tree() {
    let (tree, root) = tree_from("<p><b>ab</b></p><p>cd<br></p>");
    let ab = text_node(&tree, root, "ab");
    let cd = text_node(&tree, root, "cd");
    let mut range = span(&tree, (ab, 0), (cd, 2));
    move_range_boundaries_up_tree(&tree, &mut range, None, None, root);
    assert_eq!(range, span(&tree, (root, 0), (root, 2)));

    // A boundary in the middle of content stays put.
    let mut range = span(&tree, (ab, 1), (cd, 1));
    move_range_boundaries_up_tree(&tree, &mut range, None, None, root);
    assert_eq!(range, span(&tree, (ab, 1), (cd, 1)));
  }

  #[test]
  fn out_of_link() {
    let (tree, root) = tree_from("<p><a href=\"x\">ab</a>cd</p>");
    let p = element(&tree, root, "p", 0);
    let ab = text_node(&tree, root, "ab");
    let mut range = caret(ab, 2);
    move_range_boundary_out_of(&tree, &mut range, "a", root);
    assert_eq!(range, caret(p, 1));

    let mut range = caret(ab, 1);
    move_range_boundary_out_of(&tree, &mut range, "a", root);
    assert_eq!(range, caret(ab, 1));
  }
}
