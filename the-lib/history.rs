use thiserror::Error;

use crate::config::UndoConfig;

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors that can occur during history operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
  #[error("undo index {index} is out of bounds (max: {max})")]
  IndexOutOfBounds { index: usize, max: usize },
}

/// What the undo and redo commands can currently do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoState {
  pub can_undo: bool,
  pub can_redo: bool,
}

/// A pending move through the stack that has not been applied yet.
///
/// Returned by [`UndoStack::undo`] and [`UndoStack::redo`]. The caller
/// restores `html` into the document and only then calls
/// [`UndoStack::apply_jump`], so the stack never points at a snapshot the
/// document failed to take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryJump {
  /// Entry index after the jump.
  pub target: usize,
  /// Serialized snapshot to restore, bookmark markers included.
  pub html:   String,
}

/// Linear stack of serialized document snapshots.
///
/// Each entry is the markup under the editable root, with the selection
/// embedded as bookmark markers. The stack is in the *undo state* right
/// after a snapshot was taken or restored and before the document changes
/// again; while in it, checkpoints are not recorded twice for the same
/// content.
///
/// Entries after the current index are redo entries. Recording a new
/// snapshot truncates them first.
///
/// Limitations:
///  * Whole-document snapshots cost memory proportional to the document on
///    every checkpoint. [`UndoConfig`] bounds the count, optionally only for
///    documents past a size threshold.
#[derive(Debug, Default)]
pub struct UndoStack {
  entries:       Vec<String>,
  index:         Option<usize>,
  in_undo_state: bool,
  config:        UndoConfig,
}

impl UndoStack {
  pub fn new(config: UndoConfig) -> Self {
    Self {
      config,
      ..Self::default()
    }
  }

  /// Drops every entry and leaves the undo state.
  pub fn reset(&mut self) {
    self.entries.clear();
    self.index = None;
    self.in_undo_state = false;
  }

  #[inline]
  pub fn index(&self) -> Option<usize> {
    self.index
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  #[inline]
  pub fn is_in_undo_state(&self) -> bool {
    self.in_undo_state
  }

  /// Marks the document as changed since the last snapshot. Returns whether
  /// this left the undo state.
  pub fn leave_undo_state(&mut self) -> bool {
    std::mem::replace(&mut self.in_undo_state, false)
  }

  /// Discards the redo entries.
  pub fn truncate_redo(&mut self) {
    self.entries.truncate(self.index.map_or(0, |index| index + 1));
  }

  /// Appends a snapshot after the current entry and makes it current.
  ///
  /// When the undo limit applies to this snapshot and the stack would
  /// exceed it, the oldest entries are evicted.
  pub fn push(&mut self, html: String) {
    self.truncate_redo();
    let mut index = self.index.map_or(0, |index| index + 1);

    if let Some(limit) = self.config.undo_limit
      && self.config.document_size_threshold.is_none_or(|threshold| html.len() > threshold)
      && index > limit
    {
      let evicted = index - limit;
      self.entries.drain(..evicted);
      index = limit;
      tracing::debug!(evicted, limit, "evicted oldest undo entries");
    }

    self.entries.truncate(index);
    self.entries.push(html);
    self.index = Some(index);
    self.in_undo_state = true;
    tracing::debug!(index, len = self.entries.len(), "recorded undo entry");
  }

  /// Undo is possible from any recorded state except the very first
  /// entry while it is still showing. Outside the undo state the current
  /// document is recorded before stepping back, so even the first entry
  /// can be returned to.
  pub fn can_undo(&self) -> bool {
    match self.index {
      Some(index) if self.in_undo_state => index > 0,
      Some(_) => true,
      None => false,
    }
  }

  pub fn can_redo(&self) -> bool {
    self.in_undo_state && self.index.is_some_and(|index| index + 1 < self.entries.len())
  }

  pub fn state(&self) -> UndoState {
    UndoState {
      can_undo: self.can_undo(),
      can_redo: self.can_redo(),
    }
  }

  /// The entry before the current one. Outside the undo state the caller
  /// must [`push`](Self::push) the current document first.
  pub fn undo(&self) -> Option<HistoryJump> {
    let target = self.index?.checked_sub(1)?;
    self.jump_to(target)
  }

  pub fn redo(&self) -> Option<HistoryJump> {
    if !self.can_redo() {
      return None;
    }
    self.jump_to(self.index? + 1)
  }

  fn jump_to(&self, target: usize) -> Option<HistoryJump> {
    let html = self.entries.get(target)?.clone();
    Some(HistoryJump { target, html })
  }

  /// Commits a jump once its snapshot is in the document.
  ///
  /// # Errors
  ///
  /// Returns an error if the jump targets an entry that no longer exists.
  pub fn apply_jump(&mut self, jump: &HistoryJump) -> Result<()> {
    if jump.target >= self.entries.len() {
      return Err(HistoryError::IndexOutOfBounds {
        index: jump.target,
        max:   self.entries.len().saturating_sub(1),
      });
    }
    self.index = Some(jump.target);
    self.in_undo_state = true;
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn edit(stack: &mut UndoStack, html: &str) {
    if !stack.is_in_undo_state() {
      stack.push(html.into());
    }
    stack.leave_undo_state();
  }

  fn undo(stack: &mut UndoStack, current: &str) -> Option<String> {
    if !stack.can_undo() {
      return None;
    }
    if !stack.is_in_undo_state() {
      stack.push(current.into());
    }
    let jump = stack.undo()?;
    stack.apply_jump(&jump).unwrap();
    Some(jump.html)
  }

  fn redo(stack: &mut UndoStack) -> Option<String> {
    let jump = stack.redo()?;
    stack.apply_jump(&jump).unwrap();
    Some(jump.html)
  }

  #[test]
  fn empty_stack() {
    let stack = UndoStack::default();
    assert!(!stack.can_undo());
    assert!(!stack.can_redo());
    assert_eq!(stack.undo(), None);
  }

  // The first undo records the live state (s3) before jumping, so two redos
  // land on the state after the last edit rather than the one before it.
  #[test]
  fn undo_undo_redo_redo_returns_to_the_last_edit() {
    let mut stack = UndoStack::default();
    stack.push("s0".into());
    edit(&mut stack, "s0");
    edit(&mut stack, "s1");
    edit(&mut stack, "s2");

    assert_eq!(undo(&mut stack, "s3").as_deref(), Some("s2"));
    assert_eq!(undo(&mut stack, "ignored").as_deref(), Some("s1"));
    assert_eq!(stack.state(), UndoState {
      can_undo: true,
      can_redo: true,
    });
    assert_eq!(redo(&mut stack).as_deref(), Some("s2"));
    assert_eq!(redo(&mut stack).as_deref(), Some("s3"));
    assert!(!stack.can_redo());
    assert_eq!(stack.len(), 4);
  }

  #[test]
  fn first_entry_stops_undo() {
    let mut stack = UndoStack::default();
    stack.push("s0".into());
    assert!(!stack.can_undo());
    stack.leave_undo_state();
    assert!(stack.can_undo());
    assert_eq!(undo(&mut stack, "s1").as_deref(), Some("s0"));
    assert!(!stack.can_undo());
    assert_eq!(undo(&mut stack, "s1"), None);
  }

  #[test]
  fn new_edit_drops_redo() {
    let mut stack = UndoStack::default();
    stack.push("s0".into());
    edit(&mut stack, "s0");
    edit(&mut stack, "s1");
    undo(&mut stack, "s2");
    undo(&mut stack, "s2");
    assert_eq!(stack.index(), Some(0));
    edit(&mut stack, "ignored");
    stack.push("t1".into());
    assert_eq!(stack.len(), 2);
    assert!(!stack.can_redo());
    assert_eq!(undo(&mut stack, "t1").as_deref(), Some("s0"));
  }

  #[test]
  fn limit_evicts_oldest() {
    let mut stack = UndoStack::new(UndoConfig {
      document_size_threshold: None,
      undo_limit:              Some(2),
    });
    for html in ["a", "b", "c", "d", "e"] {
      stack.push(html.into());
      stack.leave_undo_state();
    }
    assert_eq!(stack.len(), 3);
    assert_eq!(stack.index(), Some(2));
    assert_eq!(undo(&mut stack, "f").as_deref(), Some("e"));
    assert_eq!(undo(&mut stack, "f").as_deref(), Some("d"));
    assert_eq!(undo(&mut stack, "f"), None);
  }

  #[test]
  fn limit_only_past_threshold() {
    let mut stack = UndoStack::new(UndoConfig {
      document_size_threshold: Some(4),
      undo_limit:              Some(1),
    });
    for html in ["a", "b", "c"] {
      stack.push(html.into());
    }
    assert_eq!(stack.len(), 3);
    stack.push("large document".into());
    assert_eq!(stack.len(), 2);
    assert_eq!(stack.index(), Some(1));
  }

  #[test]
  fn stale_jump_is_rejected() {
    let mut stack = UndoStack::default();
    stack.push("a".into());
    let jump = HistoryJump {
      target: 3,
      html:   String::new(),
    };
    assert_eq!(
      stack.apply_jump(&jump),
      Err(HistoryError::IndexOutOfBounds { index: 3, max: 0 })
    );
  }
}
