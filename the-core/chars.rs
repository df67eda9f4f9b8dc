/// Zero-width space, used as an invisible placeholder that keeps an
/// otherwise empty inline element focusable.
pub const ZWS: char = '\u{200B}';

/// Non-breaking space. Renders as a space but is content, not whitespace.
pub const NBSP: char = '\u{00A0}';

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum CharCategory {
  /// Collapsible markup whitespace.
  Whitespace,
  /// Invisible placeholder characters.
  ZeroWidth,
  Visible,
}

pub fn categorize_char(ch: char) -> CharCategory {
  match ch {
    c if char_is_markup_whitespace(c) => CharCategory::Whitespace,
    c if char_is_zero_width(c) => CharCategory::ZeroWidth,
    _ => CharCategory::Visible,
  }
}

/// Whitespace in the markup sense: the characters a renderer collapses.
/// A non-breaking space is deliberately not part of this set.
#[inline]
pub fn char_is_markup_whitespace(ch: char) -> bool {
  matches!(ch, ' ' | '\t' | '\r' | '\n')
}

#[inline]
pub fn char_is_zero_width(ch: char) -> bool {
  ch == ZWS
}

/// True for characters that contribute something a user can see or select.
#[inline]
pub fn char_is_visible(ch: char) -> bool {
  categorize_char(ch) == CharCategory::Visible
}
