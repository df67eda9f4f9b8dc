//! Listener registry for the editor's notifications.
//!
//! Listeners are boxed closures grouped by [`EventKind`] and called in
//! registration order. A listener error never stops delivery: it is handed
//! to the registry's error sink and the next listener runs.

use std::{
  collections::HashMap,
  fmt,
  str::FromStr,
};

use the_dom::NodeId;
use thiserror::Error;

use crate::{
  history::UndoState,
  range::PseudoRange,
};

/// Error type listeners report failures with.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type Listener = Box<dyn FnMut(&mut Event) -> Result<(), HandlerError>>;

/// Receives every listener error along with the kind of event that was
/// being delivered.
pub type ErrorSink = Box<dyn FnMut(EventKind, &HandlerError)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
  /// The document changed.
  Input,
  /// The element path at the cursor changed.
  PathChange,
  /// A non-collapsed selection was set.
  Select,
  /// A collapsed selection was set.
  Cursor,
  UndoStateChange,
  /// Pasted content is about to be inserted; preventing the default
  /// cancels the insertion.
  WillPaste,
}

impl EventKind {
  pub const ALL: [EventKind; 6] = [
    EventKind::Input,
    EventKind::PathChange,
    EventKind::Select,
    EventKind::Cursor,
    EventKind::UndoStateChange,
    EventKind::WillPaste,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Self::Input => "input",
      Self::PathChange => "path-change",
      Self::Select => "select",
      Self::Cursor => "cursor",
      Self::UndoStateChange => "undo-state-change",
      Self::WillPaste => "will-paste",
    }
  }
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
  type Err = UnknownEventKind;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|kind| kind.name() == s)
      .ok_or_else(|| UnknownEventKind(s.to_owned()))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDetail {
  None,
  Path(String),
  Range(PseudoRange),
  UndoState(UndoState),
  /// The sanitized fragment about to be pasted.
  Paste(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
  pub kind:          EventKind,
  pub detail:        EventDetail,
  default_prevented: bool,
}

impl Event {
  pub fn new(kind: EventKind, detail: EventDetail) -> Self {
    Self {
      kind,
      detail,
      default_prevented: false,
    }
  }

  pub fn prevent_default(&mut self) {
    self.default_prevented = true;
  }

  #[inline]
  pub fn is_default_prevented(&self) -> bool {
    self.default_prevented
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub struct EventRegistry {
  listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
  next_id:   u64,
  sink:      ErrorSink,
}

impl fmt::Debug for EventRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventRegistry")
      .field("listeners", &self.len())
      .field("next_id", &self.next_id)
      .finish_non_exhaustive()
  }
}

impl Default for EventRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl EventRegistry {
  pub fn new() -> Self {
    Self {
      listeners: HashMap::new(),
      next_id:   0,
      sink:      Box::new(|kind, err| tracing::error!(%kind, %err, "event listener failed")),
    }
  }

  pub fn add(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
    let id = ListenerId(self.next_id);
    self.next_id += 1;
    self.listeners.entry(kind).or_default().push((id, listener));
    id
  }

  /// Unregisters a listener. Returns whether it was registered.
  pub fn remove(&mut self, id: ListenerId) -> bool {
    for listeners in self.listeners.values_mut() {
      if let Some(index) = listeners.iter().position(|(other, _)| *other == id) {
        listeners.remove(index);
        return true;
      }
    }
    false
  }

  pub fn set_error_sink(&mut self, sink: ErrorSink) {
    self.sink = sink;
  }

  pub fn has_listeners(&self, kind: EventKind) -> bool {
    self.listeners.get(&kind).is_some_and(|l| !l.is_empty())
  }

  /// Total number of registered listeners.
  pub fn len(&self) -> usize {
    self.listeners.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Delivers `event` to every listener of its kind.
  pub fn fire(&mut self, event: &mut Event) {
    let Some(listeners) = self.listeners.get_mut(&event.kind) else {
      return;
    };
    for (id, listener) in listeners.iter_mut() {
      if let Err(err) = listener(event) {
        tracing::trace!(?id, "listener returned an error");
        (self.sink)(event.kind, &err);
      }
    }
  }
}

#[cfg(test)]
mod test {
  use std::{
    cell::RefCell,
    rc::Rc,
  };

  use super::*;

  #[test]
  fn kind_names_round_trip() {
    for kind in EventKind::ALL {
      assert_eq!(kind.name().parse::<EventKind>(), Ok(kind));
    }
    assert!("pathChange".parse::<EventKind>().is_err());
  }

  #[test]
  fn delivery_in_order_and_removal() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut registry = EventRegistry::new();
    let ids: Vec<ListenerId> = (0..3)
      .map(|n| {
        let log = Rc::clone(&log);
        registry.add(
          EventKind::Input,
          Box::new(move |_| {
            log.borrow_mut().push(n);
            Ok(())
          }),
        )
      })
      .collect();

    registry.fire(&mut Event::new(EventKind::Input, EventDetail::None));
    registry.fire(&mut Event::new(EventKind::Cursor, EventDetail::None));
    assert_eq!(*log.borrow(), vec![0, 1, 2]);

    assert!(registry.remove(ids[1]));
    assert!(!registry.remove(ids[1]));
    registry.fire(&mut Event::new(EventKind::Input, EventDetail::None));
    assert_eq!(*log.borrow(), vec![0, 1, 2, 0, 2]);
  }

  #[test]
  fn errors_go_to_sink_and_delivery_continues() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let delivered = Rc::new(RefCell::new(0));
    let mut registry = EventRegistry::new();
    {
      let errors = Rc::clone(&errors);
      registry.set_error_sink(Box::new(move |kind, err| {
        errors.borrow_mut().push(format!("{kind}: {err}"));
      }));
    }
    registry.add(EventKind::Select, Box::new(|_| Err("boom".into())));
    {
      let delivered = Rc::clone(&delivered);
      registry.add(
        EventKind::Select,
        Box::new(move |_| {
          *delivered.borrow_mut() += 1;
          Ok(())
        }),
      );
    }

    registry.fire(&mut Event::new(EventKind::Select, EventDetail::None));
    assert_eq!(*errors.borrow(), vec!["select: boom".to_owned()]);
    assert_eq!(*delivered.borrow(), 1);
  }

  #[test]
  fn listeners_can_prevent_default() {
    let mut registry = EventRegistry::new();
    registry.add(
      EventKind::WillPaste,
      Box::new(|event| {
        event.prevent_default();
        Ok(())
      }),
    );
    let mut event = Event::new(EventKind::WillPaste, EventDetail::None);
    registry.fire(&mut event);
    assert!(event.is_default_prevented());
  }
}
