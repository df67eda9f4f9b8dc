//! Block-level commands: line breaks, alignment, direction, quotes and
//! lists.
//!
//! Most of these go through [`Editor::modify_blocks`], which lifts the
//! selected blocks out of the document into a fragment, lets the command
//! rewrite it, and puts the result back merging alike containers at both
//! seams.

use the_core::text::strip_zws;
use the_dom::{
  NodeId,
  style::Declarations,
};

use crate::{
  block::{
    expand_range_to_block_boundaries,
    get_end_block_of_range,
    get_start_block_of_range,
    range_does_end_at_block_boundary,
    range_does_start_at_block_boundary,
  },
  bookmark::{
    END_SELECTION_ID,
    START_SELECTION_ID,
    create_marker,
  },
  boundaries::{
    move_range_boundaries_down_tree,
    move_range_boundaries_up_tree,
    move_range_boundary_out_of,
  },
  clean::remove_empty_inlines,
  editor::{
    Editor,
    Result,
  },
  insert_delete::{
    delete_contents_of_range,
    extract_contents_of_range,
    insert_node_in_range,
  },
  merge_split::{
    SplitAt,
    merge_containers,
    split,
  },
  node::{
    create_element,
    get_nearest,
    has_tag_attributes,
  },
  normalize::{
    fix_container,
    fix_cursor,
    remove_zws,
  },
  range::{
    Point,
    PseudoRange,
  },
  tree::{
    Tree,
    TreeError,
  },
  walk::{
    get_next_block,
    is_empty_block,
  },
};

/// Tag of the block created when Enter splits a block of the given tag.
/// Anything else continues as the default block.
fn tag_after_split(tag: &str) -> Option<&'static str> {
  match tag {
    "dt" => Some("dd"),
    "dd" => Some("dt"),
    "li" => Some("li"),
    "pre" => Some("pre"),
    _ => None,
  }
}

/// Removes `br` children of the root. Extracting every block leaves the
/// emptied root with a fixup `br` that must not end up beside the blocks.
fn drop_root_breaks(tree: &mut Tree, root: NodeId, range: &mut PseudoRange) {
  let breaks: Vec<NodeId> = tree
    .children(root)
    .iter()
    .copied()
    .filter(|&child| tree.has_tag(child, "br"))
    .collect();
  for br in breaks.into_iter().rev() {
    let Some(index) = tree.index_of(br) else {
      continue;
    };
    tree.detach(br);
    for point in [&mut range.start, &mut range.end] {
      if point.node == root && point.offset > index {
        point.offset -= 1;
      }
    }
  }
}

fn is_list(tree: &Tree, node: NodeId) -> bool {
  tree.has_tag(node, "ul") || tree.has_tag(node, "ol")
}

impl Editor {
  fn create_configured(&mut self, tag: &str, children: &[NodeId]) -> Result<NodeId> {
    let attrs = self.config().attributes_for(tag);
    Ok(create_element(self.tree_mut(), tag, attrs.as_ref(), children)?)
  }

  /// Breaks the line at the selection, deleting selected content first.
  ///
  /// Inside `pre` a newline character is inserted, or on an empty line the
  /// `pre` is split around a new default block. With `line_break_only`,
  /// outside any block, or in a table cell, a `<br>` is inserted.
  /// Otherwise the block is split; an empty list item leaves its list and
  /// an empty block in a quote leaves the quote.
  pub fn split_block(&mut self, line_break_only: bool) -> Result<()> {
    let root = self.root();
    let block_tag = self.config().block_tag.clone();
    let mut range = self.get_selection();
    self.record_undo_state(&mut range, true)?;
    self.remove_zws();
    self.restore_bookmark(&mut range)?;
    if !range.is_collapsed() {
      delete_contents_of_range(self.tree_mut(), &mut range, root, &block_tag)?;
    }

    let block = get_start_block_of_range(self.tree(), &range, root);
    if let Some(pre) = block.and_then(|block| get_nearest(self.tree(), block, root, "pre", None)) {
      return self.break_pre(pre, range, line_break_only);
    }

    let block = block.filter(|&block| {
      !line_break_only && !self.tree().has_tag(block, "th") && !self.tree().has_tag(block, "td")
    });
    let Some(mut block) = block else {
      move_range_boundary_out_of(self.tree(), &mut range, "a", root);
      let br = self.tree_mut().create_element("br");
      insert_node_in_range(self.tree_mut(), &mut range, br)?;
      range.collapse(false);
      self.finish(range);
      return Ok(());
    };

    if let Some(li) = get_nearest(self.tree(), block, root, "li", None) {
      block = li;
    }
    if is_empty_block(self.tree(), block) {
      if get_nearest(self.tree(), block, root, "ul", None).is_some()
        || get_nearest(self.tree(), block, root, "ol", None).is_some()
      {
        return self.decrease_list_level(Some(range));
      }
      if get_nearest(self.tree(), block, root, "blockquote", None).is_some() {
        return self.remove_quote(Some(range));
      }
    }

    let (split_tag, split_attrs) = match self.tree().tag(block).and_then(tag_after_split) {
      Some(tag) => (tag.to_owned(), None),
      None => {
        let attrs = self.config().attributes_for(&block_tag);
        (block_tag, attrs)
      },
    };
    let parent = self.tree().parent(block).unwrap_or(root);
    let Point { node, offset } = range.start;
    let tree = self.tree_mut();
    let mut after = split(tree, node, SplitAt::Offset(offset), parent, root)?.ok_or(TreeError::NoParent(block))?;

    if !has_tag_attributes(tree, after, &split_tag, split_attrs.as_ref()) {
      let replacement = create_element(tree, &split_tag, split_attrs.as_ref(), &[])?;
      if let Some(dir) = tree.attribute(after, "dir").map(str::to_owned) {
        tree.set_attribute(replacement, "dir", dir)?;
      }
      tree.replace_with(after, replacement)?;
      let contents = tree.empty(after)?;
      tree.append(replacement, contents)?;
      after = replacement;
    }

    remove_zws(tree, block, None);
    remove_empty_inlines(tree, block);
    fix_cursor(tree, block);

    // Land inside leading inline formatting of the new block, but never
    // inside an empty link.
    let mut focus = after;
    while tree.is_element(focus) {
      if tree.has_tag(focus, "a") && strip_zws(&tree.text_content(focus)).is_empty() {
        let text = tree.create_text("");
        tree.replace_with(focus, text)?;
        focus = text;
        break;
      }
      let mut child = tree.first_child(focus);
      while let Some(c) = child
        && tree.text(c).is_some_and(str::is_empty)
      {
        let next = tree.next_sibling(c);
        if next.is_none_or(|next| tree.has_tag(next, "br")) {
          break;
        }
        tree.detach(c);
        child = next;
      }
      match child {
        Some(c) if !tree.has_tag(c, "br") && !tree.is_text(c) => focus = c,
        _ => break,
      }
    }
    tracing::trace!(?block, ?after, "split block");

    self.finish(PseudoRange::collapsed(Point::new(focus, 0)));
    Ok(())
  }

  fn break_pre(&mut self, pre: NodeId, range: PseudoRange, line_break_only: bool) -> Result<()> {
    let root = self.root();
    let mut range = range;
    let tree = self.tree_mut();
    move_range_boundaries_down_tree(tree, &mut range);
    let Point { node, mut offset } = range.start;
    let text = if tree.is_text(node) {
      node
    } else {
      let text = tree.create_text("");
      insert_node_in_range(tree, &mut range, text)?;
      offset = 0;
      text
    };

    let data = tree.text(text).unwrap_or_default();
    let before = offset.checked_sub(1).and_then(|i| data.chars().nth(i));
    let at = data.chars().nth(offset);
    let caret = PseudoRange::collapsed(Point::new(text, offset));
    let blank_line = !line_break_only
      && (before == Some('\n') || range_does_start_at_block_boundary(tree, &caret, root))
      && (at == Some('\n') || range_does_end_at_block_boundary(tree, &caret, root));

    let range = if blank_line {
      let start = offset.saturating_sub(1);
      let end = if offset > 0 { start + 2 } else { start + 1 };
      tree.delete_text(text, start, end)?;
      let after = split(tree, text, SplitAt::Offset(start), root, root)?;
      if let Some(first) = after.and_then(|after| tree.previous_sibling(after))
        && tree.text_content(first).is_empty()
      {
        tree.detach(first);
      }
      let parent = after.and_then(|after| tree.parent(after)).unwrap_or(root);
      let block = self.create_default_block(&[])?;
      let tree = self.tree_mut();
      tree.insert_before(parent, block, after)?;
      if let Some(after) = after
        && tree.text_content(after).is_empty()
      {
        tree.detach(after);
      }
      PseudoRange::collapsed(Point::new(block, 0))
    } else {
      tree.insert_text(text, offset, "\n")?;
      fix_cursor(tree, pre);
      if tree.len(text) == offset + 1 {
        let mut range = PseudoRange::collapsed(Point::new(text, 0));
        range.set_start_after(tree, text);
        range.collapse(true);
        range
      } else {
        PseudoRange::collapsed(Point::new(text, offset + 1))
      }
    };

    self.finish(range);
    Ok(())
  }

  /// Calls `f` on each block the selection (or `range`) touches, in
  /// document order, until it returns `true`. With `mutates` the call is
  /// an undoable change.
  pub fn for_each_block(
    &mut self,
    mutates: bool,
    range: Option<PseudoRange>,
    mut f: impl FnMut(&mut Tree, NodeId) -> Result<bool>,
  ) -> Result<()> {
    let root = self.root();
    let mut range = range.unwrap_or_else(|| self.get_selection());
    if mutates {
      range = self.checkpoint(range)?;
    }

    let start = get_start_block_of_range(self.tree(), &range, root);
    let end = get_end_block_of_range(self.tree(), &range, root);
    if let (Some(mut block), Some(end)) = (start, end) {
      loop {
        if f(self.tree_mut(), block)? || block == end {
          break;
        }
        match get_next_block(self.tree(), block, root) {
          Some(next) => block = next,
          None => break,
        }
      }
    }

    if mutates {
      self.finish(range);
    }
    Ok(())
  }

  /// Moves the blocks the selection (or `range`) touches into a fragment,
  /// hands it to `modify` and inserts whatever node it returns in their
  /// place.
  pub fn modify_blocks(
    &mut self,
    range: Option<PseudoRange>,
    modify: impl FnOnce(&mut Self, NodeId) -> Result<NodeId>,
  ) -> Result<()> {
    let root = self.root();
    let block_tag = self.config().block_tag.clone();
    let mut range = range.unwrap_or_else(|| self.get_selection());
    self.record_undo_state(&mut range, true)?;

    let tree = self.tree_mut();
    expand_range_to_block_boundaries(tree, &mut range, root);
    move_range_boundaries_up_tree(tree, &mut range, Some(root), Some(root), root);
    let frag = extract_contents_of_range(tree, &mut range, Some(root), root)?;

    // The gap may still be below the root; reinsert directly in it.
    if !range.is_collapsed() {
      let mut node = range.end.node;
      if node == root {
        range.collapse(false);
      } else {
        while let Some(parent) = tree.parent(node)
          && parent != root
        {
          node = parent;
        }
        range.set_start_before(tree, node);
        range.collapse(true);
      }
    }

    let replacement = modify(self, frag)?;
    let tree = self.tree_mut();
    drop_root_breaks(tree, root, &mut range);
    insert_node_in_range(tree, &mut range, replacement)?;

    if let Some(next) = tree.child(range.end.node, range.end.offset) {
      merge_containers(tree, next, root, &block_tag)?;
    }
    if let Some(first) = tree.child(range.start.node, range.start.offset) {
      merge_containers(tree, first, root, &block_tag)?;
    }

    self.restore_bookmark(&mut range)?;
    self.finish(range);
    Ok(())
  }

  /// Aligns the selected blocks with an `align-*` class and a `text-align`
  /// declaration. `None` removes both.
  pub fn set_text_alignment(&mut self, alignment: Option<&str>) -> Result<()> {
    self.for_each_block(true, None, |tree, block| {
      let mut classes: Vec<String> = tree
        .attribute(block, "class")
        .unwrap_or_default()
        .split_whitespace()
        .filter(|class| !class.starts_with("align"))
        .map(str::to_owned)
        .collect();
      let mut style = Declarations::parse(tree.attribute(block, "style").unwrap_or_default());
      match alignment {
        Some(alignment) => {
          classes.push(format!("align-{alignment}"));
          style.set("text-align", alignment);
        },
        None => {
          style.remove("text-align");
        },
      }

      if classes.is_empty() {
        tree.remove_attribute(block, "class");
      } else {
        tree.set_attribute(block, "class", classes.join(" "))?;
      }
      if style.is_empty() {
        tree.remove_attribute(block, "style");
      } else {
        tree.set_attribute(block, "style", style.to_string())?;
      }
      Ok(false)
    })
  }

  pub fn set_text_direction(&mut self, direction: Option<&str>) -> Result<()> {
    self.for_each_block(true, None, |tree, block| {
      match direction {
        Some(direction) => tree.set_attribute(block, "dir", direction)?,
        None => {
          tree.remove_attribute(block, "dir");
        },
      }
      Ok(false)
    })
  }

  // Quotes.

  pub fn increase_quote_level(&mut self, range: Option<PseudoRange>) -> Result<()> {
    self.modify_blocks(range, |editor, frag| editor.create_configured("blockquote", &[frag]))
  }

  /// Unwraps the outermost quotes around the selected blocks.
  pub fn decrease_quote_level(&mut self, range: Option<PseudoRange>) -> Result<()> {
    self.modify_blocks(range, |editor, frag| {
      let tree = editor.tree_mut();
      let outermost: Vec<NodeId> = tree
        .descendants(frag)
        .filter(|&n| tree.has_tag(n, "blockquote"))
        .filter(|&n| {
          tree
            .parent(n)
            .is_none_or(|parent| get_nearest(tree, parent, frag, "blockquote", None).is_none())
        })
        .collect();
      for quote in outermost {
        tree.unwrap(quote)?;
      }
      Ok(frag)
    })
  }

  /// Replaces the selected blocks with one empty default block holding the
  /// cursor, outside any quote.
  pub fn remove_quote(&mut self, range: Option<PseudoRange>) -> Result<()> {
    self.modify_blocks(range, |editor, _| {
      let start = create_marker(editor.tree_mut(), START_SELECTION_ID);
      let end = create_marker(editor.tree_mut(), END_SELECTION_ID);
      editor.create_default_block(&[start, end])
    })
  }

  // Lists.

  /// The list holding the selection, and its items containing the start
  /// and end.
  pub fn get_list_selection(&self, range: &PseudoRange) -> Option<(NodeId, Option<NodeId>, Option<NodeId>)> {
    let tree = self.tree();
    let root = self.root();
    let mut list = range.common_ancestor(tree);
    while list != root && !is_list(tree, list) {
      list = tree.parent(list)?;
    }
    if list == root {
      return None;
    }

    let item = |point: Point| {
      let mut node = if point.node == list {
        tree.child(list, point.offset)
      } else {
        Some(point.node)
      };
      while let Some(n) = node
        && tree.parent(n) != Some(list)
      {
        node = tree.parent(n);
      }
      node
    };
    Some((list, item(range.start), item(range.end)))
  }

  /// Nests the selected list items one level deeper, into the list right
  /// before them or a new one.
  pub fn increase_list_level(&mut self, range: Option<PseudoRange>) -> Result<()> {
    let root = self.root();
    let block_tag = self.config().block_tag.clone();
    let mut range = range.unwrap_or_else(|| self.get_selection());
    let Some((list, Some(mut start_li), end_li)) = self.get_list_selection(&range) else {
      return Ok(());
    };
    if self.tree().first_child(list) == Some(start_li) {
      return Ok(());
    }
    self.record_undo_state(&mut range, true)?;

    let list_tag = self.tree().tag(list).unwrap_or("ul").to_owned();
    let new_parent = match self.tree().previous_sibling(start_li) {
      Some(prev) if self.tree().has_tag(prev, &list_tag) => prev,
      _ => {
        let nested = self.create_configured(&list_tag, &[])?;
        self.tree_mut().insert_before(list, nested, Some(start_li))?;
        nested
      },
    };

    let tree = self.tree_mut();
    loop {
      let next = if Some(start_li) == end_li {
        None
      } else {
        tree.next_sibling(start_li)
      };
      tree.append(new_parent, start_li)?;
      match next {
        Some(next) => start_li = next,
        None => break,
      }
    }
    if let Some(next) = tree.next_sibling(new_parent) {
      merge_containers(tree, next, root, &block_tag)?;
    }

    self.restore_bookmark(&mut range)?;
    self.finish(range);
    Ok(())
  }

  /// Moves the selected list items one level out. Items leaving the
  /// outermost list become default blocks.
  pub fn decrease_list_level(&mut self, range: Option<PseudoRange>) -> Result<()> {
    let root = self.root();
    let block_tag = self.config().block_tag.clone();
    let mut range = range.unwrap_or_else(|| self.get_selection());
    let Some((list, start_li, end_li)) = self.get_list_selection(&range) else {
      return Ok(());
    };
    let start_li = start_li.or_else(|| self.tree().first_child(list));
    let end_li = end_li.or_else(|| self.tree().last_child(list));
    self.record_undo_state(&mut range, true)?;

    let mut insert_before = None;
    if let (Some(mut start_li), Some(end_li)) = (start_li, end_li) {
      let tree = self.tree_mut();
      let mut new_parent = tree.parent(list).unwrap_or(root);
      insert_before = match tree.next_sibling(end_li) {
        None => tree.next_sibling(list),
        Some(next) => split(tree, list, SplitAt::Node(Some(next)), new_parent, root)?,
      };

      if new_parent != root && tree.has_tag(new_parent, "li") {
        new_parent = tree.parent(new_parent).unwrap_or(root);
        while let Some(node) = insert_before {
          insert_before = tree.next_sibling(node);
          tree.append(end_li, node)?;
        }
        insert_before = tree.parent(list).and_then(|item| tree.next_sibling(item));
      }

      let make_not_list = !is_list(tree, new_parent);
      loop {
        let next = if start_li == end_li {
          None
        } else {
          self.tree().next_sibling(start_li)
        };
        self.tree_mut().detach(start_li);
        let mut node = start_li;
        if make_not_list && self.tree().has_tag(start_li, "li") {
          let contents = self.tree_mut().empty(start_li)?;
          node = self.create_default_block(&[contents])?;
        }
        self.tree_mut().insert_before(new_parent, node, insert_before)?;
        match next {
          Some(next) => start_li = next,
          None => break,
        }
      }
    }

    let tree = self.tree_mut();
    if tree.first_child(list).is_none() {
      tree.detach(list);
    }
    if let Some(next) = insert_before {
      merge_containers(tree, next, root, &block_tag)?;
    }

    self.restore_bookmark(&mut range)?;
    self.finish(range);
    Ok(())
  }

  // Turns every block in `frag` into an item of a `list_tag` list, joining
  // consecutive items into one list and retagging lists of the other kind.
  fn make_list(&mut self, frag: NodeId, list_tag: &str) -> Result<NodeId> {
    let list_attrs = self.config().attributes_for(list_tag);
    let item_attrs = self.config().attributes_for("li");
    let tree = self.tree_mut();

    let mut cursor = frag;
    while let Some(mut node) = get_next_block(tree, cursor, frag) {
      cursor = node;
      if let Some(item) = tree.parent(node).filter(|&p| tree.has_tag(p, "li")) {
        node = item;
        cursor = tree.last_child(item).unwrap_or(item);
      }

      if !tree.has_tag(node, "li") {
        let item = create_element(tree, "li", item_attrs.as_ref(), &[])?;
        if let Some(dir) = tree.attribute(node, "dir").map(str::to_owned) {
          tree.set_attribute(item, "dir", dir)?;
        }
        match tree.previous_sibling(node) {
          Some(prev) if tree.has_tag(prev, list_tag) => {
            tree.append(prev, item)?;
            tree.detach(node);
          },
          _ => {
            let list = create_element(tree, list_tag, list_attrs.as_ref(), &[item])?;
            tree.replace_with(node, list)?;
          },
        }
        let contents = tree.empty(node)?;
        tree.append(item, contents)?;
        cursor = item;
      } else if let Some(list) = tree.parent(node)
        && !tree.has_tag(list, list_tag)
        && is_list(tree, list)
      {
        let contents = tree.empty(list)?;
        let retagged = create_element(tree, list_tag, list_attrs.as_ref(), &[contents])?;
        tree.replace_with(list, retagged)?;
      }
    }
    Ok(frag)
  }

  pub fn make_unordered_list(&mut self) -> Result<()> {
    self.modify_blocks(None, |editor, frag| editor.make_list(frag, "ul"))
  }

  pub fn make_ordered_list(&mut self) -> Result<()> {
    self.modify_blocks(None, |editor, frag| editor.make_list(frag, "ol"))
  }

  /// Turns the selected list items back into default blocks and drops the
  /// lists around them.
  pub fn remove_list(&mut self) -> Result<()> {
    self.modify_blocks(None, |editor, frag| {
      let block_tag = editor.config().block_tag.clone();
      let items: Vec<NodeId> = {
        let tree = editor.tree();
        tree.descendants(frag).filter(|&n| tree.has_tag(n, "li")).collect()
      };
      for item in items {
        if editor.tree().is_block(item) {
          let contents = editor.tree_mut().empty(item)?;
          let block = editor.create_default_block(&[contents])?;
          editor.tree_mut().replace_with(item, block)?;
        } else {
          let tree = editor.tree_mut();
          fix_container(tree, item, &block_tag);
          let contents = tree.empty(item)?;
          tree.replace_with(item, contents)?;
        }
      }

      let tree = editor.tree_mut();
      let lists: Vec<NodeId> = tree.descendants(frag).filter(|&n| is_list(tree, n)).collect();
      for list in lists {
        let contents = tree.empty(list)?;
        fix_container(tree, contents, &block_tag);
        tree.replace_with(list, contents)?;
      }
      Ok(frag)
    })
  }
}
