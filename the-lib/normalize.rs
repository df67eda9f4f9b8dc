//! Focusability fixups and container wrapping.
//!
//! A block the cursor can land in must render with some height, and an
//! inline element the cursor sits in must hold some text. These functions
//! add the minimal content for that: a trailing `<br>` in blocks and a
//! zero-width space in empty inlines. All of them are idempotent.

use the_core::{
  chars::ZWS,
  text::{
    has_non_whitespace,
    strip_zws,
  },
};
use the_dom::NodeId;

use crate::{
  tree::Tree,
  walk::{
    get_next_block,
    next_matching,
    previous_matching,
  },
};

/// Makes `node` focusable.
///
/// Inline elements with no children (after dropping empty text) receive a
/// zero-width-space text node. Blocks and containers without any `<br>`
/// descendant receive one, appended to the last block down the chain of
/// trailing non-inline children. Text and void elements are left alone.
pub fn fix_cursor(tree: &mut Tree, node: NodeId) {
  if !tree.can_have_children(node) {
    return;
  }

  let (target, fixer) = if tree.is_inline(node) {
    while let Some(first) = tree.first_child(node)
      && tree.text(first).is_some_and(str::is_empty)
    {
      tree.detach(first);
    }
    if tree.first_child(node).is_some() {
      return;
    }
    (node, tree.create_text(ZWS.to_string()))
  } else {
    if tree.descendants(node).any(|n| tree.has_tag(n, "br")) {
      return;
    }
    let mut target = node;
    while let Some(last) = last_element_child(tree, target)
      && !tree.is_inline(last)
    {
      target = last;
    }
    (target, tree.create_element("br"))
  };

  if let Err(err) = tree.append(target, fixer) {
    tracing::warn!(?target, %err, "could not append cursor fixer");
  }
}

fn last_element_child(tree: &Tree, node: NodeId) -> Option<NodeId> {
  tree
    .children(node)
    .iter()
    .rev()
    .copied()
    .find(|&child| tree.is_element(child))
}

/// Wraps every run of inline children of `container` in a new `block_tag`
/// element, so the container only holds blocks. A `<br>` ends the current
/// run and is replaced by it (an empty run still yields an empty block).
/// Containers found among the children are fixed recursively.
pub fn fix_container(tree: &mut Tree, container: NodeId, block_tag: &str) {
  let mut wrapper: Option<NodeId> = None;
  for child in tree.children(container).to_vec() {
    let is_br = tree.has_tag(child, "br");
    if !is_br && tree.is_inline(child) {
      let block = *wrapper.get_or_insert_with(|| tree.create_element(block_tag));
      if let Err(err) = tree.append(block, child) {
        tracing::warn!(%err, "could not wrap inline child");
      }
    } else if is_br || wrapper.is_some() {
      let block = match wrapper.take() {
        Some(block) => block,
        None => tree.create_element(block_tag),
      };
      fix_cursor(tree, block);
      let placed = if is_br {
        tree.replace_with(child, block)
      } else {
        tree.insert_before(container, block, Some(child))
      };
      if let Err(err) = placed {
        tracing::warn!(%err, "could not place wrapper block");
      }
      tracing::trace!(?container, "wrapped inline run");
    }
    if tree.is_container(child) {
      fix_container(tree, child, block_tag);
    }
  }
  if let Some(block) = wrapper {
    fix_cursor(tree, block);
    if let Err(err) = tree.append(container, block) {
      tracing::warn!(%err, "could not place wrapper block");
    }
  }
}

/// Gives the editable root a block to type into and makes every block
/// under it focusable.
pub fn fix_root(tree: &mut Tree, root: NodeId, block_tag: &str) {
  let first = tree.first_child(root);
  if first.is_none_or(|child| tree.has_tag(child, "br")) {
    let block = tree.create_element(block_tag);
    fix_cursor(tree, block);
    let placed = match first {
      Some(br) => tree.replace_with(br, block),
      None => tree.append(root, block),
    };
    if let Err(err) = placed {
      tracing::warn!(%err, "could not insert default block");
    }
    return;
  }
  let mut node = root;
  while let Some(block) = get_next_block(tree, node, root) {
    fix_cursor(tree, block);
    node = block;
  }
}

/// Strips zero-width spaces from every text node under `root`, except text
/// directly inside `keep`. Text left empty is detached, and so is any
/// inline ancestor it leaves empty, up to `root`.
pub fn remove_zws(tree: &mut Tree, root: NodeId, keep: Option<NodeId>) {
  let texts: Vec<NodeId> = tree
    .descendants(root)
    .filter(|&n| tree.text(n).is_some_and(|data| data.contains(ZWS)))
    .collect();
  for text in texts {
    if keep.is_some() && tree.parent(text) == keep {
      continue;
    }
    let stripped = match tree.text(text) {
      Some(data) => strip_zws(data).into_owned(),
      None => continue,
    };
    if !stripped.is_empty() {
      let _ = tree.set_text(text, stripped);
      continue;
    }
    let mut node = text;
    while let Some(parent) = tree.parent(node) {
      tree.detach(node);
      if parent == root || !tree.is_inline(parent) || tree.child_count(parent) > 0 {
        break;
      }
      node = parent;
    }
  }
}

/// Whether `br` ends a rendered line: some non-whitespace text or another
/// `<br>` follows it inside its block. With `if_empty_block`, a `<br>` with
/// nothing before it counts too.
pub fn is_line_break(tree: &Tree, br: NodeId, if_empty_block: bool) -> bool {
  let Some(block) = tree.parent(br).and_then(|parent| tree.non_inline_ancestor(parent)) else {
    return false;
  };
  let accept = |n: NodeId| match tree.text(n) {
    Some(data) => has_non_whitespace(data),
    None => tree.has_tag(n, "br"),
  };
  next_matching(tree, block, br, accept).is_some()
    || (if_empty_block && previous_matching(tree, block, br, accept).is_none())
}
