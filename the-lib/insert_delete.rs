//! Inserting nodes into, and removing content from, a range.

use the_core::chars::NBSP;
use the_dom::NodeId;

use crate::{
  block::{
    get_end_block_of_range,
    get_start_block_of_range,
    range_does_end_at_block_boundary,
    range_does_start_at_block_boundary,
  },
  boundaries::{
    move_range_boundaries_down_tree,
    move_range_boundaries_up_tree,
  },
  clean::cleanup_brs,
  merge_split::{
    SplitAt,
    merge_containers,
    merge_with_block,
    split,
  },
  node::get_nearest,
  normalize::{
    fix_container,
    fix_cursor,
    fix_root,
  },
  range::{
    Point,
    PseudoRange,
  },
  tree::{
    Result,
    Tree,
    TreeError,
  },
  walk::{
    get_next_block,
    get_previous_block,
    is_empty_block,
    next_node,
    previous_post_order,
  },
};

/// Inserts `node` at the start of `range`, splitting a text boundary when
/// the start falls inside one. The range then starts right before `node`
/// and still ends where it did, so a collapsed range ends up around it.
pub fn insert_node_in_range(tree: &mut Tree, range: &mut PseudoRange, node: NodeId) -> Result<()> {
  let Point {
    node: mut start_node,
    offset: mut start_offset,
  } = range.start;
  let Point {
    node: mut end_node,
    offset: mut end_offset,
  } = range.end;

  if tree.is_text(start_node) {
    let parent = tree
      .parent(start_node)
      .ok_or(TreeError::NoParent(start_node))?;
    if start_offset == tree.len(start_node) {
      start_offset = tree.index_of(start_node).unwrap_or(0) + 1;
      if range.is_collapsed() {
        end_node = parent;
        end_offset = start_offset;
      }
    } else {
      if start_offset > 0 {
        let after = tree.split_text(start_node, start_offset)?;
        if end_node == start_node {
          end_offset -= start_offset;
          end_node = after;
        } else if end_node == parent {
          end_offset += 1;
        }
        start_node = after;
      }
      start_offset = tree.index_of(start_node).unwrap_or(0);
    }
    start_node = parent;
  }

  let child_count = tree.child_count(start_node);
  tree.insert_at(start_node, start_offset, node)?;
  if start_node == end_node {
    end_offset += tree.child_count(start_node) - child_count;
  }

  range.set_start(tree, Point::new(start_node, start_offset));
  range.set_end(tree, Point::new(end_node, end_offset));
  Ok(())
}

/// Moves everything inside `range` into a new fragment, splitting the
/// boundaries up to `common` (by default the range's common ancestor). Text
/// halves left on both sides are joined again. The range collapses onto the
/// gap.
pub fn extract_contents_of_range(
  tree: &mut Tree,
  range: &mut PseudoRange,
  common: Option<NodeId>,
  root: NodeId,
) -> Result<NodeId> {
  let frag = tree.create_fragment();
  if range.is_collapsed() {
    return Ok(frag);
  }

  let mut common = common.unwrap_or_else(|| range.common_ancestor(tree));
  if tree.is_text(common)
    && let Some(parent) = tree.parent(common)
  {
    common = parent;
  }

  let Point {
    node: start_node,
    offset: start_offset,
  } = range.start;

  let mut end_node = split(tree, range.end.node, SplitAt::Offset(range.end.offset), common, root)?;
  let mut end_offset = 0;

  let mut node = split(tree, start_node, SplitAt::Offset(start_offset), common, root)?;
  while let Some(n) = node
    && Some(n) != end_node
  {
    node = tree.next_sibling(n);
    tree.append(frag, n)?;
  }

  if tree.is_text(start_node)
    && let Some(end) = end_node
    && let Some(data) = tree.text(end).map(str::to_owned)
  {
    tree.append_text(start_node, &data)?;
    tree.detach(end);
    end_node = Some(start_node);
    end_offset = start_offset;
  }

  range.set_start(tree, Point::new(start_node, start_offset));
  match end_node {
    Some(end) => range.set_end(tree, Point::new(end, end_offset)),
    None => range.set_end(tree, Point::new(common, tree.child_count(common))),
  }

  fix_cursor(tree, common);
  Ok(frag)
}

// Nearest text or leaf in the same run of inline content, walking forward
// in pre-order or backward in post-order.
fn adjacent_inline_node(tree: &Tree, root: NodeId, node: NodeId, forward: bool) -> Option<NodeId> {
  let step = |n| {
    if forward {
      next_node(tree, root, n)
    } else {
      previous_post_order(tree, root, n)
    }
  };
  let mut current = step(node);
  while let Some(n) = current {
    if tree.is_text(n) || tree.is_leaf(n) {
      return Some(n);
    }
    if !tree.is_inline(n) {
      return None;
    }
    current = step(n);
  }
  None
}

/// Deletes the contents of `range` and returns them as a fragment.
///
/// When the range spans blocks, the block holding the end is merged into
/// the block holding the start. Afterwards the range is collapsed at the
/// deletion point, and a space that would now collapse away at that point
/// becomes a non-breaking space.
pub fn delete_contents_of_range(
  tree: &mut Tree,
  range: &mut PseudoRange,
  root: NodeId,
  block_tag: &str,
) -> Result<NodeId> {
  let start_block = get_start_block_of_range(tree, range, root);
  let end_block = get_end_block_of_range(tree, range, root);
  let needs_merge = start_block != end_block;

  if let (Some(start), Some(end)) = (start_block, end_block) {
    move_range_boundaries_down_tree(tree, range);
    move_range_boundaries_up_tree(tree, range, Some(start), Some(end), root);
  }

  let frag = extract_contents_of_range(tree, range, None, root)?;

  move_range_boundaries_down_tree(tree, range);

  if needs_merge {
    // The end block was split, so look it up again.
    let end_block = get_end_block_of_range(tree, range, root);
    if let (Some(start), Some(end)) = (start_block, end_block)
      && start != end
    {
      merge_with_block(tree, start, end, range, root)?;
    }
  }

  if let Some(start) = start_block {
    fix_cursor(tree, start);
  }

  if tree.first_child(root).is_none_or(|child| tree.has_tag(child, "br")) {
    fix_root(tree, root, block_tag);
    if let Some(first) = tree.first_child(root) {
      *range = PseudoRange::contents(tree, first);
    }
  }

  range.collapse(true);
  keep_space_at_cursor(tree, range, root)?;
  Ok(frag)
}

// A plain space right at the cursor would be collapsed by the renderer when
// it ends up at a block edge or next to another space.
fn keep_space_at_cursor(tree: &mut Tree, range: &PseudoRange, root: NodeId) -> Result<()> {
  let Point {
    node: start_node,
    offset: start_offset,
  } = range.start;
  let char_at = |tree: &Tree, node: NodeId, offset: usize| tree.text(node).and_then(|data| data.chars().nth(offset));

  let (after_node, after_offset) = match tree.text(start_node) {
    Some(data) if start_offset < data.chars().count() => (Some(start_node), start_offset),
    _ => (adjacent_inline_node(tree, root, start_node, true), 0),
  };

  let (before_node, before_offset) = if tree.is_text(start_node) && start_offset > 0 {
    (Some(start_node), start_offset - 1)
  } else {
    let from = after_node.unwrap_or_else(|| {
      if tree.is_text(start_node) {
        start_node
      } else {
        tree.child(start_node, start_offset).unwrap_or(start_node)
      }
    });
    let before = adjacent_inline_node(tree, root, from, false);
    let offset = before.map_or(0, |n| tree.len(n).saturating_sub(1));
    (before, offset)
  };

  let after_is_space = after_node.and_then(|n| char_at(tree, n, after_offset)) == Some(' ');
  let before_is_space = before_node.and_then(|n| char_at(tree, n, before_offset)) == Some(' ');

  let target = if after_is_space && range_does_start_at_block_boundary(tree, range, root) {
    after_node.map(|n| (n, after_offset))
  } else if before_is_space && (after_is_space || range_does_end_at_block_boundary(tree, range, root)) {
    before_node.map(|n| (n, before_offset))
  } else {
    None
  };

  if let Some((node, offset)) = target {
    tree.delete_text(node, offset, offset + 1)?;
    tree.insert_text(node, offset, &NBSP.to_string())?;
  }
  Ok(())
}

/// Pastes `frag` at `range`, deleting the selection first.
///
/// Inline content of the first pasted block is merged into the block at the
/// cursor, and whatever followed the cursor in that block is appended to the
/// last pasted block, so the surrounding formatting carries over. Pasted
/// blocks go in after splitting up to the nearest `<blockquote>` (or the
/// root), and alike containers on either edge are merged. An empty block at
/// the cursor is replaced outright when the paste starts with a block.
/// Afterwards the range surrounds the inserted content.
pub fn insert_tree_fragment_into_range(
  tree: &mut Tree,
  range: &mut PseudoRange,
  frag: NodeId,
  root: NodeId,
  block_tag: &str,
) -> Result<()> {
  let first_in_frag_is_inline = tree.first_child(frag).is_some_and(|first| tree.is_inline(first));

  fix_container(tree, frag, block_tag);
  let mut node = frag;
  while let Some(block) = get_next_block(tree, node, frag) {
    fix_cursor(tree, block);
    node = block;
  }

  if !range.is_collapsed() {
    delete_contents_of_range(tree, range, root, block_tag)?;
  }

  move_range_boundaries_down_tree(tree, range);
  range.collapse(false);

  let stop_point = get_nearest(tree, range.end.node, root, "blockquote", None).unwrap_or(root);

  let mut block = get_start_block_of_range(tree, range, root);
  let mut block_contents_after_split: Option<NodeId> = None;
  let first_block_in_frag = get_next_block(tree, frag, frag);
  let replace_block = !first_in_frag_is_inline && block.is_some_and(|b| is_empty_block(tree, b));

  if let (Some(target), Some(first_block)) = (block, first_block_in_frag)
    && !replace_block
    && get_nearest(tree, first_block, frag, "pre", None).is_none()
    && get_nearest(tree, first_block, frag, "table", None).is_none()
  {
    move_range_boundaries_up_tree(tree, range, Some(target), Some(target), root);
    range.collapse(true);
    let mut container = range.end.node;
    let mut offset = range.end.offset;

    // The trailing <br> is not content to carry over.
    cleanup_brs(tree, target);

    if tree.is_inline(container) {
      let stop = get_previous_block(tree, container, root).unwrap_or(root);
      match split(tree, container, SplitAt::Offset(offset), stop, root)? {
        Some(after) => {
          container = tree.parent(after).unwrap_or(stop);
          offset = tree.index_of(after).unwrap_or(0);
        },
        None => {
          container = stop;
          offset = tree.child_count(stop);
        },
      }
    }
    offset = offset.min(tree.len(container));

    if offset != tree.len(container) {
      let rest = tree.create_fragment();
      while let Some(child) = tree.child(container, offset) {
        tree.append(rest, child)?;
      }
      block_contents_after_split = Some(rest);
    }

    merge_with_block(tree, container, first_block, range, root)?;

    if let Some(point) = Point::after(tree, container) {
      range.set_end(tree, point);
    }
  }

  if tree.child_count(frag) > 0 {
    if replace_block && let Some(empty) = block {
      range.set_end_before(tree, empty);
      range.collapse(false);
      tree.detach(empty);
    }
    move_range_boundaries_up_tree(tree, range, Some(stop_point), Some(stop_point), root);

    let node_after_split = split(tree, range.end.node, SplitAt::Offset(range.end.offset), stop_point, root)?;
    let node_before_split = match node_after_split {
      Some(after) => tree.previous_sibling(after),
      None => tree.last_child(stop_point),
    };
    tree.insert_before(stop_point, frag, node_after_split)?;
    match node_after_split {
      Some(after) => range.set_end_before(tree, after),
      None => range.set_end(tree, Point::new(stop_point, tree.child_count(stop_point))),
    }
    block = get_end_block_of_range(tree, range, root);

    // A position inside content, which merging containers won't move.
    move_range_boundaries_down_tree(tree, range);
    let end = range.end;

    if let Some(after) = node_after_split
      && tree.is_container(after)
    {
      merge_containers(tree, after, root, block_tag)?;
    }
    let first_inserted = match node_before_split {
      Some(before) => tree.next_sibling(before),
      None => tree.first_child(stop_point),
    };
    if let Some(first) = first_inserted
      && tree.is_container(first)
    {
      merge_containers(tree, first, root, block_tag)?;
    }
    range.set_end(tree, end);
  }

  if let (Some(rest), Some(last)) = (block_contents_after_split, block) {
    let mut temp = *range;
    fix_cursor(tree, rest);
    merge_with_block(tree, last, rest, &mut temp, root)?;
    range.set_end(tree, temp.end);
  }

  move_range_boundaries_down_tree(tree, range);
  tracing::trace!(?frag, "inserted fragment");
  Ok(())
}

#[cfg(test)]
mod test {
  use the_dom::markup::parse_fragment;

  use super::*;
  use crate::test_util::*;

  #[test]
  fn insert_node_splits_text() {
    let (mut tree, root) = tree_from("<p>abcd</p>");
    let t = text_node(&tree, root, "abcd");
    let p = element(&tree, root, "p", 0);
    let img = tree.create_element("img");
    let mut range = caret(t, 2);
    insert_node_in_range(&mut tree, &mut range, img).unwrap();
    assert_eq!(html(&tree, root), "<p>ab<img>cd</p>");
    let cd = text_node(&tree, root, "cd");
    assert_eq!(range, span(&tree, (p, 1), (cd, 0)));
  }

  #[test]
  fn insert_node_at_text_end() {
    let (mut tree, root) = tree_from("<p>ab</p>");
    let t = text_node(&tree, root, "ab");
    let p = element(&tree, root, "p", 0);
    let br = tree.create_element("br");
    let mut range = caret(t, 2);
    insert_node_in_range(&mut tree, &mut range, br).unwrap();
    assert_eq!(html(&tree, root), "<p>ab<br></p>");
    assert_eq!(range, span(&tree, (p, 1), (p, 2)));
  }

  #[test]
  fn extract_within_text() {
    let (mut tree, root) = tree_from("<p>abcdef</p>");
    let t = text_node(&tree, root, "abcdef");
    let mut range = span(&tree, (t, 2), (t, 4));
    let frag = extract_contents_of_range(&mut tree, &mut range, None, root).unwrap();
    assert_eq!(html(&tree, frag), "cd");
    assert_eq!(html(&tree, root), "<p>abef<br></p>");
    assert_eq!(range, caret(t, 2));
  }

  #[test]
  fn delete_across_blocks_merges() {
    let (mut tree, root) = tree_from("<div>abc<br></div><div>def<br></div>");
    let abc = text_node(&tree, root, "abc");
    let def = text_node(&tree, root, "def");
    let mut range = span(&tree, (abc, 1), (def, 2));
    delete_contents_of_range(&mut tree, &mut range, root, "div").unwrap();
    assert_eq!(html(&tree, root), "<div>af<br></div>");
    assert_eq!(range, caret(abc, 1));
  }

  #[test]
  fn delete_everything_leaves_a_block() {
    let (mut tree, root) = tree_from("<div>abc<br></div>");
    let mut range = span(&tree, (root, 0), (root, 1));
    delete_contents_of_range(&mut tree, &mut range, root, "div").unwrap();
    assert_eq!(html(&tree, root), "<div><br></div>");
    let div = element(&tree, root, "div", 0);
    assert_eq!(range, caret(div, 0));
  }

  #[test]
  fn delete_keeps_space_visible() {
    let (mut tree, root) = tree_from("<div>a bc<br></div>");
    let t = text_node(&tree, root, "a bc");
    let mut range = span(&tree, (t, 2), (t, 4));
    delete_contents_of_range(&mut tree, &mut range, root, "div").unwrap();
    assert_eq!(html(&tree, root), "<div>a&nbsp;<br></div>");
  }

  fn paste(markup: &str, into: &str, at: (&str, usize)) -> String {
    let (mut tree, root) = tree_from(into);
    let t = text_node(&tree, root, at.0);
    let frag = parse_fragment(&mut tree, markup).unwrap();
    let mut range = caret(t, at.1);
    insert_tree_fragment_into_range(&mut tree, &mut range, frag, root, "div").unwrap();
    html(&tree, root)
  }

  #[test]
  fn paste_inline() {
    assert_eq!(
      paste("<b>X</b>", "<div>abcd<br></div>", ("abcd", 2)),
      "<div>ab<b>X</b>cd<br></div>"
    );
  }

  #[test]
  fn paste_blocks() {
    assert_eq!(
      paste("<p>X</p><p>Y</p>", "<div>abcd<br></div>", ("abcd", 2)),
      "<div>abX<br></div><p>Ycd<br></p>"
    );
  }
}
