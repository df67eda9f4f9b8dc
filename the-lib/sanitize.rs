//! The boundary where outside markup enters the document.

use the_dom::{
  Dom,
  DomError,
  NodeId,
  markup::parse_fragment,
};

/// Turns a markup string into a fragment that is safe to insert. The editor
/// only normalizes the structure of what comes back; it never re-checks it
/// for executable content.
pub trait Sanitizer {
  fn sanitize(&self, dom: &mut Dom, markup: &str) -> Result<NodeId, DomError>;
}

/// Parses markup without filtering anything. Only for markup the host
/// produced itself, or that was sanitized before reaching the editor.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedMarkup;

impl Sanitizer for TrustedMarkup {
  fn sanitize(&self, dom: &mut Dom, markup: &str) -> Result<NodeId, DomError> {
    parse_fragment(dom, markup)
  }
}

impl<F> Sanitizer for F
where
  F: Fn(&mut Dom, &str) -> Result<NodeId, DomError>,
{
  fn sanitize(&self, dom: &mut Dom, markup: &str) -> Result<NodeId, DomError> {
    self(dom, markup)
  }
}
