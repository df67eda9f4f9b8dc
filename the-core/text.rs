//! Char-indexed helpers over UTF-8 strings.
//!
//! Text offsets throughout the workspace count Unicode scalar values, so
//! every place that slices a `str` goes through these conversions.

use std::borrow::Cow;

use crate::chars::{
  ZWS,
  char_is_markup_whitespace,
  char_is_visible,
};

#[inline]
pub fn char_len(s: &str) -> usize {
  s.chars().count()
}

/// Byte index of the char at `char_idx`, clamped to the end of the string.
pub fn char_to_byte(s: &str, char_idx: usize) -> usize {
  s.char_indices()
    .nth(char_idx)
    .map(|(byte, _)| byte)
    .unwrap_or(s.len())
}

/// Splits `s` at a char index. Indices past the end split at the end.
pub fn split_at_char(s: &str, char_idx: usize) -> (&str, &str) {
  s.split_at(char_to_byte(s, char_idx))
}

/// Byte range covering chars `start..end`, clamped.
pub fn char_range_to_bytes(s: &str, start: usize, end: usize) -> std::ops::Range<usize> {
  let start = char_to_byte(s, start);
  let end = char_to_byte(s, end).max(start);
  start..end
}

/// Anything other than collapsible whitespace.
pub fn has_non_whitespace(s: &str) -> bool {
  s.chars().any(|ch| !char_is_markup_whitespace(ch))
}

/// Anything a user would see: not whitespace and not a zero-width space.
pub fn has_visible_content(s: &str) -> bool {
  s.chars().any(char_is_visible)
}

pub fn is_only_zws(s: &str) -> bool {
  !s.is_empty() && s.chars().all(|ch| ch == ZWS)
}

pub fn strip_zws(s: &str) -> Cow<'_, str> {
  if s.contains(ZWS) {
    Cow::Owned(s.chars().filter(|&ch| ch != ZWS).collect())
  } else {
    Cow::Borrowed(s)
  }
}

/// Number of leading chars matching `f`.
pub fn leading_chars(s: &str, f: impl Fn(char) -> bool) -> usize {
  s.chars().take_while(|&ch| f(ch)).count()
}

/// Number of trailing chars matching `f`.
pub fn trailing_chars(s: &str, f: impl Fn(char) -> bool) -> usize {
  s.chars().rev().take_while(|&ch| f(ch)).count()
}
