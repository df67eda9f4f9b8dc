//! Structural surgery: splitting nodes apart and merging siblings back.
//!
//! Every merge rewrites the caller's [`PseudoRange`] in lock-step, so a
//! selection that pointed into a merged-away node ends up at the same
//! logical position inside the survivor.

use the_dom::{
  NodeId,
  NodeKind,
};

use crate::{
  node::{
    are_alike,
    get_nearest,
  },
  normalize::{
    fix_container,
    fix_cursor,
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
};

/// Where to split a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAt {
  /// A char offset for text, a child index for elements.
  Offset(usize),
  /// Split right before this child; `None` splits after the last child.
  Node(Option<NodeId>),
}

/// Splits `node` at `at`, then keeps splitting each ancestor right before
/// the new half until `stop` (or the top of the tree) is reached.
///
/// Each element split clones the element without children, moves everything
/// from the split point on into the clone and inserts the clone after the
/// original; both halves then get [`fix_cursor`]. The parent is never fixed
/// here, since that could undo a fixup made further down.
///
/// Returns the node that starts the second half at the level where
/// splitting stopped.
pub fn split(tree: &mut Tree, node: NodeId, at: SplitAt, stop: NodeId, root: NodeId) -> Result<Option<NodeId>> {
  if tree.is_text(node) && node != stop {
    let SplitAt::Offset(offset) = at else {
      return Err(TreeError::NonNumericOffset(node));
    };
    let parent = tree.parent(node).ok_or(TreeError::NoParent(node))?;
    let tail = tree.split_text(node, offset)?;
    return split(tree, parent, SplitAt::Node(Some(tail)), stop, root);
  }

  let after = match at {
    SplitAt::Offset(offset) => tree.child(node, offset),
    SplitAt::Node(child) => child,
  };
  let Some(parent) = tree.parent(node) else {
    return Ok(after);
  };
  if node == stop || !tree.is_element(node) {
    return Ok(after);
  }

  let clone = tree.clone_shallow(node)?;
  let mut next = after;
  while let Some(child) = next {
    next = tree.next_sibling(child);
    tree.append(clone, child)?;
  }

  if tree.has_tag(node, "ol") && get_nearest(tree, node, root, "blockquote", None).is_some() {
    let start = tree
      .attribute(node, "start")
      .and_then(|s| s.trim().parse::<i64>().ok())
      .filter(|&s| s != 0)
      .unwrap_or(1);
    let start = start + tree.child_count(node) as i64 - 1;
    tree.set_attribute(clone, "start", start.to_string())?;
  }

  fix_cursor(tree, node);
  fix_cursor(tree, clone);
  tree.insert_after(node, clone)?;
  tracing::trace!(?node, ?clone, "split element");

  split(tree, parent, SplitAt::Node(Some(clone)), stop, root)
}

/// Merges adjacent alike inline siblings anywhere below `node` (or below
/// the parent of a text `node`), keeping `range` on the same content.
pub fn merge_inlines(tree: &mut Tree, node: NodeId, range: &mut PseudoRange) -> Result<()> {
  let element = if tree.is_text(node) {
    match tree.parent(node) {
      Some(parent) => parent,
      None => return Ok(()),
    }
  } else {
    node
  };
  if !tree.is_element(element) {
    return Ok(());
  }
  let mut raw = *range;
  merge_children(tree, element, &mut raw)?;
  range.set_start(tree, raw.start);
  range.set_end(tree, raw.end);
  Ok(())
}

// Right to left, depth first. Children emptied out of merged elements are
// parked on `frags` until the surviving element is reached.
fn merge_children(tree: &mut Tree, node: NodeId, raw: &mut PseudoRange) -> Result<()> {
  let mut frags: Vec<NodeId> = Vec::new();
  let mut l = tree.child_count(node);
  while l > 0 {
    l -= 1;
    let Some(child) = tree.child(node, l) else {
      continue;
    };
    let prev = l.checked_sub(1).and_then(|i| tree.child(node, i));
    match prev {
      Some(prev) if tree.is_inline(child) && are_alike(tree, child, prev) => {
        let prev_len = tree.len(prev);
        for point in [&mut raw.start, &mut raw.end] {
          if point.node == child {
            *point = Point::new(prev, point.offset + prev_len);
          }
          if point.node == node {
            if point.offset > l {
              point.offset -= 1;
            } else if point.offset == l {
              *point = Point::new(prev, prev_len);
            }
          }
        }
        tree.detach(child);
        match tree.kind(child) {
          Some(NodeKind::Text(data)) => {
            let data = data.clone();
            tree.append_text(prev, &data)?;
          },
          _ => frags.push(tree.empty(child)?),
        }
        tracing::trace!(?prev, ?child, "merged inline siblings");
      },
      _ if tree.is_element(child) => {
        while let Some(frag) = frags.pop() {
          tree.append(child, frag)?;
        }
        merge_children(tree, child, raw)?;
      },
      _ => {},
    }
  }
  Ok(())
}

/// Joins the block `next` onto the end of `block` and collapses `range` at
/// the seam.
///
/// `next` is detached together with every ancestor it is the only child of,
/// so no empty shells stay behind. A trailing `<br>` fixup in `block` is
/// dropped first.
pub fn merge_with_block(
  tree: &mut Tree,
  block: NodeId,
  next: NodeId,
  range: &mut PseudoRange,
  root: NodeId,
) -> Result<()> {
  let mut container = next;
  while let Some(parent) = tree.parent(container)
    && parent != root
    && tree.is_element(parent)
    && tree.child_count(parent) == 1
  {
    container = parent;
  }
  tree.detach(container);

  let mut offset = tree.child_count(block);
  if let Some(last) = tree.last_child(block)
    && tree.has_tag(last, "br")
  {
    tree.detach(last);
    offset -= 1;
  }

  let contents = tree.empty(next)?;
  tree.append(block, contents)?;

  *range = PseudoRange::collapsed(Point::new(block, offset));
  merge_inlines(tree, block, range)
}

/// Merges `node` into its previous sibling when both are alike containers,
/// then continues with `node`'s first child.
///
/// List items only take part when their first child is a nested list. A
/// list item whose previous sibling is not mergeable gets an empty block in
/// front of its nested list so it stays focusable.
pub fn merge_containers(tree: &mut Tree, node: NodeId, root: NodeId, block_tag: &str) -> Result<()> {
  let prev = tree.previous_sibling(node);
  let first = tree.first_child(node);
  let is_list_item = tree.has_tag(node, "li");

  if is_list_item && !first.is_some_and(|f| tree.has_tag(f, "ul") || tree.has_tag(f, "ol")) {
    return Ok(());
  }

  match prev {
    Some(prev) if are_alike(tree, prev, node) => {
      if !tree.is_container(prev) {
        if !is_list_item {
          return Ok(());
        }
        let block = tree.create_element(block_tag);
        let contents = tree.empty(prev)?;
        tree.append(block, contents)?;
        tree.append(prev, block)?;
      }
      tree.detach(node);
      let needs_fix = !tree.is_container(node);
      let contents = tree.empty(node)?;
      tree.append(prev, contents)?;
      if needs_fix {
        fix_container(tree, prev, block_tag);
      }
      tracing::trace!(?prev, ?node, "merged containers");
      if let Some(first) = first {
        merge_containers(tree, first, root, block_tag)?;
      }
    },
    _ if is_list_item => {
      let block = tree.create_element(block_tag);
      tree.insert_before(node, block, first)?;
      fix_cursor(tree, block);
    },
    _ => {},
  }
  Ok(())
}
