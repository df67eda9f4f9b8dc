//! The editing surface: one editable root inside a [`Tree`], plus the
//! selection, history and listeners that commands work against.
//!
//! Every mutating command follows the same shape: take an undo checkpoint,
//! mutate the tree through the structural modules, store the resulting
//! selection, then report a single change. Hosts that mutate the tree
//! directly report it with [`Editor::tree_was_mutated`].

use std::fmt;

use the_core::text::strip_zws;
use the_dom::{
  DomError,
  NodeId,
  markup::{
    parse_fragment,
    serialize_children,
  },
};
use thiserror::Error;

use crate::{
  Attributes,
  block::{
    expand_range_to_block_boundaries,
    get_start_block_of_range,
  },
  bookmark::{
    get_range_and_remove_bookmark,
    save_range_to_bookmark,
  },
  boundaries::{
    move_range_boundaries_down_tree,
    move_range_boundaries_up_tree,
    move_range_boundary_out_of,
  },
  clean::{
    clean_tree,
    cleanup_brs,
    remove_empty_inlines,
  },
  config::{
    ConfigError,
    EditorConfig,
  },
  contents::get_text_contents_of_range,
  events::{
    ErrorSink,
    Event,
    EventDetail,
    EventKind,
    EventRegistry,
    HandlerError,
    ListenerId,
  },
  format::{
    self,
    Format,
    add_format,
    remove_format,
  },
  history::{
    HistoryError,
    HistoryJump,
    UndoStack,
    UndoState,
  },
  insert_delete::{
    insert_node_in_range,
    insert_tree_fragment_into_range,
  },
  merge_split::{
    SplitAt,
    merge_inlines,
    split,
  },
  node::{
    attributes,
    create_element,
  },
  normalize::{
    fix_container,
    fix_cursor,
    fix_root,
    remove_zws,
  },
  range::{
    Point,
    PseudoRange,
  },
  sanitize::{
    Sanitizer,
    TrustedMarkup,
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

/// Result type for editor commands.
pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Error)]
pub enum EditorError {
  #[error(transparent)]
  Tree(#[from] TreeError),
  #[error(transparent)]
  Dom(#[from] DomError),
  #[error(transparent)]
  History(#[from] HistoryError),
  #[error(transparent)]
  Config(#[from] ConfigError),
}

pub struct Editor {
  tree:               Tree,
  root:               NodeId,
  config:             EditorConfig,
  sanitizer:          Box<dyn Sanitizer>,
  selection:          Option<PseudoRange>,
  history:            UndoStack,
  events:             EventRegistry,
  ignore_all_changes: bool,
  may_have_zws:       bool,
  path:               String,
  last_anchor:        Option<NodeId>,
  last_focus:         Option<NodeId>,
}

impl fmt::Debug for Editor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Editor")
      .field("root", &self.root)
      .field("config", &self.config)
      .field("selection", &self.selection)
      .field("history", &self.history)
      .field("events", &self.events)
      .field("path", &self.path)
      .finish_non_exhaustive()
  }
}

impl Editor {
  /// An editor holding one empty default block, parsing markup as trusted.
  pub fn new(config: EditorConfig) -> Result<Self> {
    Self::with_sanitizer(config, TrustedMarkup)
  }

  pub fn with_sanitizer(config: EditorConfig, sanitizer: impl Sanitizer + 'static) -> Result<Self> {
    let mut tree = Tree::new();
    let root = tree.create_element("div");
    let history = UndoStack::new(config.undo);
    let mut editor = Self {
      tree,
      root,
      config,
      sanitizer: Box::new(sanitizer),
      selection: None,
      history,
      events: EventRegistry::new(),
      ignore_all_changes: false,
      may_have_zws: false,
      path: String::new(),
      last_anchor: None,
      last_focus: None,
    };
    editor.set_html("")?;
    Ok(editor)
  }

  /// An editor configured from a TOML document.
  pub fn from_toml_str(input: &str) -> Result<Self> {
    Self::new(EditorConfig::from_toml_str(input)?)
  }

  #[inline]
  pub fn tree(&self) -> &Tree {
    &self.tree
  }

  /// Raw access for host-side mutations. Report them afterwards with
  /// [`tree_was_mutated`](Self::tree_was_mutated).
  #[inline]
  pub fn tree_mut(&mut self) -> &mut Tree {
    &mut self.tree
  }

  #[inline]
  pub fn root(&self) -> NodeId {
    self.root
  }

  #[inline]
  pub fn config(&self) -> &EditorConfig {
    &self.config
  }

  // Events.

  pub fn add_event_listener(
    &mut self,
    kind: EventKind,
    listener: impl FnMut(&mut Event) -> std::result::Result<(), HandlerError> + 'static,
  ) -> ListenerId {
    self.events.add(kind, Box::new(listener))
  }

  pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
    self.events.remove(id)
  }

  pub fn set_error_sink(&mut self, sink: ErrorSink) {
    self.events.set_error_sink(sink);
  }

  pub fn fire_event(&mut self, event: &mut Event) {
    self.events.fire(event);
  }

  fn fire(&mut self, kind: EventKind, detail: EventDetail) -> Event {
    let mut event = Event::new(kind, detail);
    self.events.fire(&mut event);
    event
  }

  // Selection.

  fn is_valid(&self, range: &PseudoRange) -> bool {
    range.is_within(&self.tree, self.root)
      && range.start.offset <= self.tree.len(range.start.node)
      && range.end.offset <= self.tree.len(range.end.node)
  }

  /// The stored selection, or the start of the first block when it no
  /// longer points into the document.
  pub fn get_selection(&self) -> PseudoRange {
    if let Some(mut range) = self.selection
      && self.is_valid(&range)
    {
      if self.tree.is_leaf(range.start.node) {
        range.set_start_before(&self.tree, range.start.node);
      }
      if self.tree.is_leaf(range.end.node) {
        range.set_end_before(&self.tree, range.end.node);
      }
      return range;
    }
    let first = self
      .tree
      .children(self.root)
      .iter()
      .copied()
      .find(|&n| self.tree.is_element(n))
      .unwrap_or(self.root);
    PseudoRange::collapsed(Point::new(first, 0))
  }

  pub fn set_selection(&mut self, range: PseudoRange) {
    self.selection = Some(range);
    self.update_path(range, false);
  }

  pub(crate) fn select(&mut self, range: PseudoRange) {
    self.selection = Some(range);
    self.update_path(range, true);
  }

  fn move_cursor_to(&mut self, to_start: bool) {
    let offset = if to_start { 0 } else { self.tree.child_count(self.root) };
    let mut range = PseudoRange::collapsed(Point::new(self.root, offset));
    move_range_boundaries_down_tree(&mut self.tree, &mut range);
    self.set_selection(range);
  }

  pub fn move_cursor_to_start(&mut self) {
    self.move_cursor_to(true);
  }

  pub fn move_cursor_to_end(&mut self) {
    self.move_cursor_to(false);
  }

  // Path.

  /// Element path from the root down to the selection, e.g.
  /// `BLOCKQUOTE>P.intro>B`, or `(selection)` when the selection spans
  /// containers.
  pub fn get_path(&self) -> &str {
    &self.path
  }

  fn update_path(&mut self, range: PseudoRange, force: bool) {
    let anchor = range.start.node;
    let focus = range.end.node;
    if force || self.last_anchor != Some(anchor) || self.last_focus != Some(focus) {
      self.last_anchor = Some(anchor);
      self.last_focus = Some(focus);
      let path = if anchor == focus {
        self.path_of(focus)
      } else {
        "(selection)".to_owned()
      };
      if path != self.path {
        self.path = path.clone();
        self.fire(EventKind::PathChange, EventDetail::Path(path));
      }
    }
    let kind = if range.is_collapsed() {
      EventKind::Cursor
    } else {
      EventKind::Select
    };
    self.fire(kind, EventDetail::Range(range));
  }

  fn path_of(&self, node: NodeId) -> String {
    let mut parts = Vec::new();
    let mut current = Some(node);
    while let Some(n) = current
      && n != self.root
    {
      if let Some(tag) = self.tree.tag(n) {
        let mut part = tag.to_ascii_uppercase();
        if let Some(id) = self.tree.attribute(n, "id").filter(|id| !id.is_empty()) {
          part.push('#');
          part.push_str(id);
        }
        let mut classes: Vec<&str> = self
          .tree
          .attribute(n, "class")
          .map(|c| c.split_whitespace().collect())
          .unwrap_or_default();
        if !classes.is_empty() {
          classes.sort_unstable();
          part.push('.');
          part.push_str(&classes.join("."));
        }
        if let Some(dir) = self.tree.attribute(n, "dir").filter(|dir| !dir.is_empty()) {
          part.push_str(&format!("[dir={dir}]"));
        }
        parts.push(part);
      }
      current = self.tree.parent(n);
    }
    parts.reverse();
    parts.join(">")
  }

  // Change notification.

  pub(crate) fn doc_was_changed(&mut self) {
    self.tree.invalidate_all();
    self.may_have_zws = true;
    if self.ignore_all_changes {
      return;
    }
    if self.history.leave_undo_state() {
      self.fire(
        EventKind::UndoStateChange,
        EventDetail::UndoState(UndoState {
          can_undo: true,
          can_redo: false,
        }),
      );
    }
    self.fire(EventKind::Input, EventDetail::None);
  }

  /// Reports a mutation the host made through [`tree_mut`](Self::tree_mut):
  /// drops cached classifications, leaves the undo state and fires `input`.
  pub fn tree_was_mutated(&mut self) {
    self.doc_was_changed();
  }

  /// Runs `modify` with change notifications switched off, for bulk edits
  /// that shouldn't create undo entries or `input` events.
  pub fn modify_document<R>(&mut self, modify: impl FnOnce(&mut Self) -> R) -> R {
    let previous = std::mem::replace(&mut self.ignore_all_changes, true);
    let result = modify(self);
    self.ignore_all_changes = previous;
    result
  }

  pub(crate) fn finish(&mut self, range: PseudoRange) {
    self.select(range);
    self.doc_was_changed();
  }

  // History.

  fn raw_html(&self) -> String {
    serialize_children(&self.tree, self.root)
  }

  fn set_raw_html(&mut self, html: &str) -> Result<()> {
    let frag = parse_fragment(&mut self.tree, html)?;
    self.tree.empty(self.root)?;
    self.tree.append(self.root, frag)?;
    fix_root(&mut self.tree, self.root, &self.config.block_tag);
    self.tree.retain_reachable(&[self.root]);
    Ok(())
  }

  /// Marks `range` with a bookmark and, unless the document is unchanged
  /// since the last entry, records it. With `replace`, a bookmark is placed
  /// even when nothing is recorded. The bookmark stays in the tree.
  pub(crate) fn record_undo_state(&mut self, range: &mut PseudoRange, replace: bool) -> Result<()> {
    let in_undo_state = self.history.is_in_undo_state();
    if in_undo_state && !replace {
      return Ok(());
    }
    self.history.truncate_redo();
    save_range_to_bookmark(&mut self.tree, range)?;
    if in_undo_state {
      return Ok(());
    }
    let html = self.raw_html();
    self.history.push(html);
    Ok(())
  }

  /// Resolves the bookmark left by [`record_undo_state`](Self::record_undo_state)
  /// into `range`.
  pub(crate) fn restore_bookmark(&mut self, range: &mut PseudoRange) -> Result<()> {
    if let Some(restored) = get_range_and_remove_bookmark(&mut self.tree, self.root)? {
      *range = restored;
    }
    Ok(())
  }

  /// Takes an undo checkpoint around `range` and returns the same
  /// selection after the bookmark is gone.
  pub(crate) fn checkpoint(&mut self, range: PseudoRange) -> Result<PseudoRange> {
    let mut range = range;
    let replace = self.history.is_in_undo_state();
    self.record_undo_state(&mut range, replace)?;
    self.restore_bookmark(&mut range)?;
    Ok(range)
  }

  pub fn save_undo_state(&mut self) -> Result<()> {
    let range = self.get_selection();
    let range = self.checkpoint(range)?;
    self.selection = Some(range);
    Ok(())
  }

  #[inline]
  pub fn can_undo(&self) -> bool {
    self.history.can_undo()
  }

  #[inline]
  pub fn can_redo(&self) -> bool {
    self.history.can_redo()
  }

  fn restore_snapshot(&mut self, jump: &HistoryJump) -> Result<()> {
    self.set_raw_html(&jump.html)?;
    self.history.apply_jump(jump)?;
    if let Some(range) = get_range_and_remove_bookmark(&mut self.tree, self.root)? {
      self.select(range);
    }
    self.fire(
      EventKind::UndoStateChange,
      EventDetail::UndoState(self.history.state()),
    );
    self.fire(EventKind::Input, EventDetail::None);
    Ok(())
  }

  /// Restores the previous snapshot. Changes since the last checkpoint are
  /// recorded first, so they can be redone.
  pub fn undo(&mut self) -> Result<()> {
    if !self.history.can_undo() {
      return Ok(());
    }
    let mut range = self.get_selection();
    self.record_undo_state(&mut range, false)?;
    let Some(jump) = self.history.undo() else {
      return Ok(());
    };
    tracing::debug!(index = jump.target, "undo");
    self.restore_snapshot(&jump)
  }

  pub fn redo(&mut self) -> Result<()> {
    let Some(jump) = self.history.redo() else {
      return Ok(());
    };
    tracing::debug!(index = jump.target, "redo");
    self.restore_snapshot(&jump)
  }

  // Content.

  pub(crate) fn create_default_block(&mut self, children: &[NodeId]) -> Result<NodeId> {
    let block = create_element(&mut self.tree, &self.config.block_tag, None, children)?;
    fix_cursor(&mut self.tree, block);
    Ok(block)
  }

  pub(crate) fn remove_zws(&mut self) {
    if std::mem::take(&mut self.may_have_zws) {
      remove_zws(&mut self.tree, self.root, None);
    }
  }

  // Typing at the very end must land in a default block.
  fn ensure_bottom_line(&mut self) -> Result<()> {
    let last = self
      .tree
      .children(self.root)
      .iter()
      .rev()
      .copied()
      .find(|&n| self.tree.is_element(n));
    let missing = last.is_none_or(|last| {
      !self.tree.has_tag(last, &self.config.block_tag) || !self.tree.is_block(last)
    });
    if missing {
      let block = self.create_default_block(&[])?;
      self.tree.append(self.root, block)?;
    }
    Ok(())
  }

  /// Replaces the whole document. The undo history starts over with the
  /// new content, and bookmark markers in `html` become the selection.
  pub fn set_html(&mut self, html: &str) -> Result<()> {
    let frag = self.sanitizer.sanitize(&mut self.tree, html)?;
    clean_tree(&mut self.tree, frag, &self.config.class_names, false)?;
    cleanup_brs(&mut self.tree, frag);
    fix_container(&mut self.tree, frag, &self.config.block_tag);
    fix_root(&mut self.tree, frag, &self.config.block_tag);

    self.tree.empty(self.root)?;
    self.tree.append(self.root, frag)?;
    self.tree.retain_reachable(&[self.root]);
    self.tree.invalidate_all();

    self.history.reset();
    let range = match get_range_and_remove_bookmark(&mut self.tree, self.root)? {
      Some(range) => range,
      None => {
        let first = self
          .tree
          .children(self.root)
          .iter()
          .copied()
          .find(|&n| self.tree.is_element(n))
          .unwrap_or(self.root);
        PseudoRange::collapsed(Point::new(first, 0))
      },
    };
    let range = self.checkpoint(range)?;
    self.select(range);
    Ok(())
  }

  /// Markup of the document with zero-width spaces stripped. With
  /// `with_bookmark` the selection is embedded as marker elements.
  pub fn get_html(&mut self, with_bookmark: bool) -> Result<String> {
    if !with_bookmark {
      return Ok(strip_zws(&self.raw_html()).into_owned());
    }
    let mut range = self.get_selection();
    save_range_to_bookmark(&mut self.tree, &mut range)?;
    let html = strip_zws(&self.raw_html()).into_owned();
    self.restore_bookmark(&mut range)?;
    self.selection = Some(range);
    Ok(html)
  }

  /// Inserts `html` at the selection, replacing selected content. With
  /// `is_paste`, `will-paste` listeners see the cleaned fragment first and
  /// can cancel the insertion.
  pub fn insert_html(&mut self, html: &str, is_paste: bool) -> Result<()> {
    let frag = self.sanitizer.sanitize(&mut self.tree, html)?;
    let range = self.get_selection();
    let mut range = self.checkpoint(range)?;

    clean_tree(&mut self.tree, frag, &self.config.class_names, false)?;
    cleanup_brs(&mut self.tree, frag);
    remove_empty_inlines(&mut self.tree, frag);
    let mut node = frag;
    while let Some(block) = get_next_block(&self.tree, node, frag) {
      fix_cursor(&mut self.tree, block);
      node = block;
    }

    if is_paste {
      let event = self.fire(EventKind::WillPaste, EventDetail::Paste(frag));
      if event.is_default_prevented() {
        tracing::debug!("paste cancelled by listener");
        self.select(range);
        return Ok(());
      }
    }

    insert_tree_fragment_into_range(&mut self.tree, &mut range, frag, self.root, &self.config.block_tag)?;
    range.collapse(false);
    move_range_boundary_out_of(&self.tree, &mut range, "a", self.root);
    self.ensure_bottom_line()?;
    self.finish(range);
    Ok(())
  }

  /// Inserts a detached element at the start of the selection. Inline
  /// elements go in place; anything else splits the blocks up to the root
  /// and is followed by an empty line holding the cursor.
  pub fn insert_element(&mut self, el: NodeId) -> Result<()> {
    let range = self.get_selection();
    let mut range = self.checkpoint(range)?;
    range.collapse(true);

    if self.tree.is_inline(el) {
      insert_node_in_range(&mut self.tree, &mut range, el)?;
      range.set_start_after(&self.tree, el);
      range.collapse(true);
    } else {
      let root = self.root;
      let start = get_start_block_of_range(&self.tree, &range, root);
      let mut split_node = start.unwrap_or(root);
      while split_node != root && self.tree.next_sibling(split_node).is_none() {
        split_node = self.tree.parent(split_node).unwrap_or(root);
      }
      let mut after = None;
      if split_node != root
        && let Some(parent) = self.tree.parent(split_node)
      {
        let next = self.tree.next_sibling(split_node);
        after = split(&mut self.tree, parent, SplitAt::Node(next), root, root)?;
      }
      if let Some(start) = start
        && is_empty_block(&self.tree, start)
      {
        self.tree.detach(start);
      }

      self.tree.insert_before(root, el, after)?;
      let blank = self.create_default_block(&[])?;
      self.tree.insert_before(root, blank, after)?;
      range = PseudoRange::collapsed(Point::new(blank, 0));
      move_range_boundaries_down_tree(&mut self.tree, &mut range);
    }

    self.finish(range);
    Ok(())
  }

  pub fn insert_image(&mut self, src: &str, extra: Option<&Attributes>) -> Result<NodeId> {
    let mut attrs = attributes([("src", src)]);
    if let Some(extra) = extra {
      attrs.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    let img = create_element(&mut self.tree, "img", Some(&attrs), &[])?;
    self.insert_element(img)?;
    Ok(img)
  }

  pub fn get_selected_text(&self) -> String {
    get_text_contents_of_range(&self.tree, &self.get_selection())
  }

  // Inline formatting.

  pub fn has_format(&self, format: &Format, range: Option<PseudoRange>) -> bool {
    let range = range.unwrap_or_else(|| self.get_selection());
    format::has_format(&self.tree, format, range, self.root)
  }

  fn apply_format(
    &mut self,
    range: PseudoRange,
    add: Option<&Format>,
    remove: Option<&Format>,
    partial: bool,
  ) -> Result<PseudoRange> {
    let mut range = range;
    if let Some(remove) = remove {
      range = remove_format(&mut self.tree, remove, range, self.root, partial)?;
    }
    if let Some(add) = add {
      range = add_format(&mut self.tree, add, range, self.root)?;
    }
    Ok(range)
  }

  /// Removes `remove` from the selection (or `range`), then adds `add`.
  /// With `partial`, matching elements touching the range are unwrapped
  /// whole rather than split at its edges.
  pub fn change_format(
    &mut self,
    add: Option<&Format>,
    remove: Option<&Format>,
    range: Option<PseudoRange>,
    partial: bool,
  ) -> Result<()> {
    let range = range.unwrap_or_else(|| self.get_selection());
    let range = self.checkpoint(range)?;
    let range = self.apply_format(range, add, remove, partial)?;
    self.finish(range);
    Ok(())
  }

  /// Removes `tag` where the whole selection has it, adds it (removing
  /// `remove`) otherwise.
  pub fn toggle_tag(&mut self, tag: &str, remove: Option<&str>) -> Result<()> {
    let format = Format::new(tag);
    if self.has_format(&format, None) {
      self.change_format(None, Some(&format), None, false)
    } else {
      let remove = remove.map(Format::new);
      self.change_format(Some(&format), remove.as_ref(), None, false)
    }
  }

  pub fn bold(&mut self) -> Result<()> {
    self.toggle_tag("b", None)
  }

  pub fn italic(&mut self) -> Result<()> {
    self.toggle_tag("i", None)
  }

  pub fn underline(&mut self) -> Result<()> {
    self.toggle_tag("u", None)
  }

  pub fn strikethrough(&mut self) -> Result<()> {
    self.toggle_tag("s", None)
  }

  pub fn subscript(&mut self) -> Result<()> {
    self.toggle_tag("sub", Some("sup"))
  }

  pub fn superscript(&mut self) -> Result<()> {
    self.toggle_tag("sup", Some("sub"))
  }

  /// Links the selection to `url`. A collapsed selection first gets the
  /// url itself, minus its scheme, as the link text.
  pub fn make_link(&mut self, url: &str, extra: Option<&Attributes>) -> Result<()> {
    let range = self.get_selection();
    let mut range = self.checkpoint(range)?;
    if range.is_collapsed() {
      let text = self.tree.create_text(link_text(url));
      insert_node_in_range(&mut self.tree, &mut range, text)?;
    }

    let mut attrs = attributes([("href", url)]);
    if let Some(defaults) = self.config.attributes_for("a") {
      attrs.extend(defaults);
    }
    if let Some(extra) = extra {
      attrs.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    let link = Format::with_attributes("a", attrs);
    let range = self.apply_format(range, Some(&link), Some(&Format::new("a")), false)?;
    self.finish(range);
    Ok(())
  }

  pub fn remove_link(&mut self) -> Result<()> {
    self.change_format(None, Some(&Format::new("a")), None, true)
  }

  fn set_styled_span(&mut self, class: String, style: Option<String>) -> Result<()> {
    let add = style.map(|style| {
      Format::with_attributes("span", attributes([("class", class.as_str()), ("style", style.as_str())]))
    });
    let remove = Format::with_attributes("span", attributes([("class", class.as_str())]));
    self.change_format(add.as_ref(), Some(&remove), None, false)
  }

  /// Sets the font family of the selection; `None` removes it.
  pub fn set_font_face(&mut self, name: Option<&str>) -> Result<()> {
    let class = self.config.class_names.font_family.clone();
    self.set_styled_span(class, name.map(|name| format!("font-family:{name}, sans-serif")))
  }

  pub fn set_font_size(&mut self, size: Option<&str>) -> Result<()> {
    let class = self.config.class_names.font_size.clone();
    self.set_styled_span(class, size.map(|size| format!("font-size:{size}")))
  }

  pub fn set_text_color(&mut self, color: Option<&str>) -> Result<()> {
    let class = self.config.class_names.color.clone();
    self.set_styled_span(class, color.map(|color| format!("color:{color}")))
  }

  pub fn set_highlight_color(&mut self, color: Option<&str>) -> Result<()> {
    let class = self.config.class_names.highlight.clone();
    self.set_styled_span(class, color.map(|color| format!("background-color:{color}")))
  }

  // Moves the text, `<br>` and `<img>` nodes under `node` into `clean`,
  // dropping every inline element around them. Blocks become default
  // blocks holding their own cleaned content.
  fn strip_formatting(&mut self, node: NodeId, clean: NodeId) -> Result<()> {
    for child in self.tree.children(node).to_vec() {
      if self.tree.is_inline(child) {
        if self.tree.is_text(child) || self.tree.has_tag(child, "br") || self.tree.has_tag(child, "img") {
          self.tree.append(clean, child)?;
          continue;
        }
      } else if self.tree.is_block(child) {
        let inner = self.tree.create_fragment();
        self.strip_formatting(child, inner)?;
        let block = self.create_default_block(&[inner])?;
        self.tree.append(clean, block)?;
        continue;
      }
      self.strip_formatting(child, clean)?;
    }
    Ok(())
  }

  /// Strips all inline formatting from the selection, and turns selected
  /// blocks into default blocks.
  pub fn remove_all_formatting(&mut self) -> Result<()> {
    let mut range = self.get_selection();
    if range.is_collapsed() {
      return Ok(());
    }
    let root = self.root;

    let mut stop = Some(range.common_ancestor(&self.tree));
    while let Some(node) = stop
      && !self.tree.is_block(node)
    {
      stop = self.tree.parent(node);
    }
    let stop = match stop {
      Some(stop) => stop,
      None => {
        expand_range_to_block_boundaries(&self.tree, &mut range, root);
        root
      },
    };

    let mut range = self.checkpoint(range)?;
    move_range_boundaries_up_tree(&self.tree, &mut range, Some(stop), Some(stop), root);

    // End first, so the start offset stays valid when both share a node.
    let Point { node, offset } = range.end;
    let after = split(&mut self.tree, node, SplitAt::Offset(offset), stop, root)?;
    let Point { node, offset } = range.start;
    let mut next = split(&mut self.tree, node, SplitAt::Offset(offset), stop, root)?;

    let formatted = self.tree.create_fragment();
    while let Some(node) = next
      && Some(node) != after
    {
      next = self.tree.next_sibling(node);
      self.tree.append(formatted, node)?;
    }
    let clean = self.tree.create_fragment();
    self.strip_formatting(formatted, clean)?;
    join_adjacent_text(&mut self.tree, clean)?;

    let (start, end) = match (self.tree.first_child(clean), self.tree.last_child(clean)) {
      (Some(first), Some(last)) => {
        self.tree.insert_before(stop, clean, after)?;
        let start = self.tree.index_of(first).unwrap_or(0);
        let end = self.tree.index_of(last).map_or(start, |i| i + 1);
        (start, end)
      },
      _ => {
        let at = after
          .and_then(|after| self.tree.index_of(after))
          .unwrap_or_else(|| self.tree.child_count(stop));
        (at, at)
      },
    };

    let mut range = PseudoRange::new(&self.tree, Point::new(stop, start), Point::new(stop, end));
    merge_inlines(&mut self.tree, stop, &mut range)?;
    move_range_boundaries_down_tree(&mut self.tree, &mut range);
    self.finish(range);
    Ok(())
  }
}

// The text a link gets when inserted at a cursor: the url without its
// scheme and the slashes after it.
fn link_text(url: &str) -> &str {
  match url.find(':') {
    Some(colon) => url[colon + 1..].trim_start_matches('/'),
    None => url,
  }
}

fn join_adjacent_text(tree: &mut Tree, parent: NodeId) -> Result<()> {
  let mut l = tree.child_count(parent);
  while l > 1 {
    l -= 1;
    let (Some(child), Some(prev)) = (tree.child(parent, l), tree.child(parent, l - 1)) else {
      continue;
    };
    if let (Some(data), true) = (tree.text(child).map(str::to_owned), tree.is_text(prev)) {
      tree.append_text(prev, &data)?;
      tree.detach(child);
    }
  }
  Ok(())
}
