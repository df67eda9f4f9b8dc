//! Fixed tag tables. Tag names are compared ASCII case-insensitively.

/// Elements that lay out within a line of text.
pub const INLINE_TAGS: &[&str] = &[
  "a", "abbr", "acronym", "b", "bdi", "bdo", "br", "cite", "code", "data", "del", "dfn", "em",
  "font", "hr", "i", "img", "input", "ins", "kbd", "q", "rp", "rt", "ruby", "s", "samp",
  "small", "span", "strike", "strong", "sub", "sup", "time", "u", "var", "wbr",
];

/// Inline elements that never hold text and are treated as atomic content.
pub const LEAF_TAGS: &[&str] = &["br", "hr", "img"];

/// Elements that cannot have children at all.
pub const VOID_TAGS: &[&str] = &[
  "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
  "track", "wbr",
];

/// Block-level wrappers kept when cleaning external content. Any other
/// non-inline element is unwrapped.
pub const ALLOWED_BLOCK_TAGS: &[&str] = &[
  "address", "article", "aside", "audio", "blockquote", "caption", "col", "colgroup", "dd",
  "div", "dl", "dt", "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
  "header", "label", "legend", "li", "ol", "output", "p", "pre", "section", "table", "tbody",
  "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Elements dropped together with their content when cleaning.
pub const BLACKLISTED_TAGS: &[&str] = &["head", "meta", "style"];

/// Elements whose text content is emitted without entity decoding.
pub const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

#[inline]
fn in_set(set: &[&str], tag: &str) -> bool {
  set.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

pub fn is_inline_tag(tag: &str) -> bool {
  in_set(INLINE_TAGS, tag)
}

pub fn is_leaf_tag(tag: &str) -> bool {
  in_set(LEAF_TAGS, tag)
}

pub fn is_void_tag(tag: &str) -> bool {
  in_set(VOID_TAGS, tag)
}

pub fn is_allowed_block_tag(tag: &str) -> bool {
  in_set(ALLOWED_BLOCK_TAGS, tag)
}

pub fn is_blacklisted_tag(tag: &str) -> bool {
  in_set(BLACKLISTED_TAGS, tag)
}

pub fn is_raw_text_tag(tag: &str) -> bool {
  in_set(RAW_TEXT_TAGS, tag)
}

pub fn is_list_tag(tag: &str) -> bool {
  tag.eq_ignore_ascii_case("ul") || tag.eq_ignore_ascii_case("ol")
}

/// Containers whose whitespace is significant.
pub fn preserves_whitespace(tag: &str) -> bool {
  tag.eq_ignore_ascii_case("pre")
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn membership_ignores_case() {
    assert!(is_inline_tag("SPAN"));
    assert!(is_inline_tag("b"));
    assert!(!is_inline_tag("div"));
    assert!(is_leaf_tag("Br"));
    assert!(!is_leaf_tag("input"));
    assert!(is_void_tag("input"));
    assert!(is_allowed_block_tag("BLOCKQUOTE"));
    assert!(!is_allowed_block_tag("center"));
    assert!(is_blacklisted_tag("style"));
    assert!(is_list_tag("OL"));
  }
}
