//! Cleanup of content coming from outside the editor.
//!
//! Pasted or loaded markup is full of presentational tags, inline styles,
//! stray whitespace and `<br>`s that only made sense in the page it came
//! from. [`clean_tree`] rewrites it into the small vocabulary the editor
//! produces itself; [`cleanup_brs`] and [`remove_empty_inlines`] drop what
//! is left over.

use the_core::{
  chars::char_is_markup_whitespace,
  text::{
    char_len,
    char_to_byte,
    has_non_whitespace,
    leading_chars,
    trailing_chars,
  },
};
use the_dom::{
  NodeId,
  style::Declarations,
  tags,
};

use crate::{
  config::ClassNames,
  normalize::is_line_break,
  tree::{
    Result,
    Tree,
  },
  walk::{
    next_node,
    previous_post_order,
  },
};

const MONOSPACE: &str = "menlo,consolas,\"courier new\",monospace";

/// How a legacy element is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rewrite {
  /// Same attributes and content under another tag.
  Tag(&'static str),
  /// Formatting properties of the `style` attribute become elements.
  Styles,
  /// `<font face size color>` becomes a styled span.
  Font,
  /// `<tt>` becomes a monospace span.
  Monospace,
}

impl Rewrite {
  fn for_tag(tag: &str) -> Option<Self> {
    Some(match tag {
      "strong" => Self::Tag("b"),
      "em" => Self::Tag("i"),
      "ins" => Self::Tag("u"),
      "strike" => Self::Tag("s"),
      "span" => Self::Styles,
      "font" => Self::Font,
      "tt" => Self::Monospace,
      _ => return None,
    })
  }

  /// Rewrites `node` in place and returns the element now holding its
  /// content.
  fn apply(self, tree: &mut Tree, node: NodeId, classes: &ClassNames) -> Result<NodeId> {
    match self {
      Self::Tag(tag) => {
        let attributes = tree.attributes(node).cloned().unwrap_or_default();
        let el = tree.create_element_with(tag, attributes);
        replace_keeping_children(tree, node, el)
      },
      Self::Styles => replace_styles(tree, node, classes),
      Self::Font => {
        let mut style = style_of(tree, node);
        if let Some(face) = tree.attribute(node, "face") {
          style.set("font-family", face);
        }
        if let Some(size) = tree.attribute(node, "size").and_then(font_size) {
          style.set("font-size", size);
        }
        if let Some(color) = tree.attribute(node, "color").and_then(hex_color) {
          style.set("color", color);
        }
        let el = if style.is_empty() {
          tree.create_element("span")
        } else {
          tree.create_element_with("span", [("style", style.to_string())])
        };
        replace_keeping_children(tree, node, el)
      },
      Self::Monospace => {
        let el = tree.create_element_with("span", [
          ("class", classes.font_family.clone()),
          ("style", format!("font-family:{MONOSPACE}")),
        ]);
        replace_keeping_children(tree, node, el)
      },
    }
  }
}

fn replace_keeping_children(tree: &mut Tree, node: NodeId, el: NodeId) -> Result<NodeId> {
  tree.replace_with(node, el)?;
  tree.move_children(node, el)?;
  Ok(el)
}

fn style_of(tree: &Tree, node: NodeId) -> Declarations {
  tree
    .attribute(node, "style")
    .map(Declarations::parse)
    .unwrap_or_default()
}

fn font_size(size: &str) -> Option<&'static str> {
  Some(match size.trim() {
    "1" => "x-small",
    "2" => "small",
    "3" => "medium",
    "4" => "large",
    "5" => "x-large",
    "6" => "xx-large",
    "7" => "xxx-large",
    "-1" => "smaller",
    "+1" => "larger",
    _ => return None,
  })
}

/// `#rgb`/`#rrggbb`, with or without the `#`.
fn hex_color(color: &str) -> Option<String> {
  let digits = color.strip_prefix('#').unwrap_or(color);
  let valid = matches!(digits.len(), 3 | 6) && digits.chars().all(|ch| ch.is_ascii_hexdigit());
  valid.then(|| format!("#{digits}"))
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
  value
    .get(..prefix.len())
    .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// The element a style property turns into: tag, class and inline style.
fn semantic_for(
  property: &str,
  value: &str,
  classes: &ClassNames,
) -> Option<(&'static str, Option<String>, Option<String>)> {
  match property {
    "font-weight" if starts_with_ignore_case(value, "bold") || value.starts_with("700") => {
      Some(("b", None, None))
    },
    "font-style" if starts_with_ignore_case(value, "italic") => Some(("i", None, None)),
    "font-family" if has_non_whitespace(value) => Some((
      "span",
      Some(classes.font_family.clone()),
      Some(format!("font-family:{value}")),
    )),
    "font-size" if has_non_whitespace(value) => Some((
      "span",
      Some(classes.font_size.clone()),
      Some(format!("font-size:{value}")),
    )),
    "text-decoration" if starts_with_ignore_case(value, "underline") => Some(("u", None, None)),
    _ => None,
  }
}

const STYLE_PROPERTIES: [&str; 5] = [
  "font-weight",
  "font-style",
  "font-family",
  "font-size",
  "text-decoration",
];

// Pulls formatting out of a span's style into a chain of nested elements.
// The span survives only if some other style is left on it.
fn replace_styles(tree: &mut Tree, node: NodeId, classes: &ClassNames) -> Result<NodeId> {
  let mut style = style_of(tree, node);
  let node_class = tree.attribute(node, "class").map(str::to_owned);
  let mut top: Option<NodeId> = None;
  let mut bottom: Option<NodeId> = None;

  for property in STYLE_PROPERTIES {
    let Some(value) = style.get(property) else {
      continue;
    };
    let Some((tag, class, css)) = semantic_for(property, value, classes) else {
      continue;
    };
    if tree.has_tag(node, tag) && class == node_class {
      continue;
    }
    let attributes = class
      .map(|c| ("class", c))
      .into_iter()
      .chain(css.map(|s| ("style", s)));
    let el = tree.create_element_with(tag, attributes);
    if let Some(bottom) = bottom {
      tree.append(bottom, el)?;
    }
    top.get_or_insert(el);
    bottom = Some(el);
    style.remove(property);
  }

  let (Some(top), Some(bottom)) = (top, bottom) else {
    return Ok(node);
  };
  let contents = tree.empty(node)?;
  tree.append(bottom, contents)?;
  if style.is_empty() {
    tree.replace_with(node, top)?;
  } else {
    tree.set_attribute(node, "style", style.to_string())?;
    tree.append(node, top)?;
  }
  Ok(bottom)
}

/// Rewrites the children of `node` into editor-native markup.
///
/// Legacy tags go through the rewrite table, blacklisted elements are
/// removed with their content, and block elements outside the allowed set
/// are replaced by their children. Unless `preserve_ws` is set (it is set
/// automatically below `<pre>`), each leading or trailing whitespace run in
/// a text node shrinks to a single space when there is visible content on
/// that side before the edge of the enclosing block, and disappears
/// otherwise. Text left empty is removed.
pub fn clean_tree(tree: &mut Tree, node: NodeId, classes: &ClassNames, preserve_ws: bool) -> Result<()> {
  let scope = tree.non_inline_ancestor(node).unwrap_or(node);
  let mut i = tree.child_count(node);
  while i > 0 {
    i -= 1;
    let Some(mut child) = tree.child(node, i) else {
      continue;
    };
    if let Some(tag) = tree.tag(child).map(str::to_owned) {
      let child_len = tree.child_count(child);
      if let Some(rewrite) = Rewrite::for_tag(&tag) {
        child = rewrite.apply(tree, child, classes)?;
        tracing::trace!(%tag, ?rewrite, "rewrote legacy element");
      } else if tags::is_blacklisted_tag(&tag) {
        tree.detach(child);
        continue;
      } else if !tags::is_allowed_block_tag(&tag) && !tree.is_inline(child) {
        i += child_len;
        tree.unwrap(child)?;
        continue;
      }
      if child_len > 0 {
        clean_tree(
          tree,
          child,
          classes,
          preserve_ws || tags::preserves_whitespace(&tag),
        )?;
      }
    } else if !preserve_ws && tree.is_text(child) {
      collapse_whitespace(tree, scope, child)?;
    }
  }
  Ok(())
}

// Visible content in the sense of whitespace collapsing.
fn is_visible(tree: &Tree, node: NodeId) -> bool {
  tree.has_tag(node, "img") || tree.text(node).is_some_and(has_non_whitespace)
}

fn content_before(tree: &Tree, scope: NodeId, node: NodeId) -> bool {
  let mut current = previous_post_order(tree, scope, node);
  while let Some(n) = current {
    if is_visible(tree, n) {
      return true;
    }
    if !tree.is_inline(n) {
      return false;
    }
    current = previous_post_order(tree, scope, n);
  }
  false
}

fn content_after(tree: &Tree, scope: NodeId, node: NodeId) -> bool {
  let mut current = next_node(tree, scope, node);
  while let Some(n) = current {
    if is_visible(tree, n) {
      return true;
    }
    if !tree.is_inline(n) {
      return false;
    }
    current = next_node(tree, scope, n);
  }
  false
}

fn collapse_whitespace(tree: &mut Tree, scope: NodeId, text: NodeId) -> Result<()> {
  let Some(original) = tree.text(text).map(str::to_owned) else {
    return Ok(());
  };
  let mut data = original.clone();

  let leading = leading_chars(&data, char_is_markup_whitespace);
  if leading > 0 || data.is_empty() {
    let keep = content_before(tree, scope, text);
    let rest = &data[char_to_byte(&data, leading)..];
    data = if keep { format!(" {rest}") } else { rest.to_owned() };
  }
  let trailing = trailing_chars(&data, char_is_markup_whitespace);
  if trailing > 0 {
    let keep = content_after(tree, scope, text);
    let head = &data[..char_to_byte(&data, char_len(&data) - trailing)];
    data = if keep { format!("{head} ") } else { head.to_owned() };
  }

  if data.is_empty() {
    tree.detach(text);
  } else if data != original {
    tree.set_text(text, data)?;
  }
  Ok(())
}

/// Removes every `<br>` that is the last child of its parent without
/// ending a rendered line. Blocks get their cursor `<br>` back from a later
/// [`fix_cursor`](crate::normalize::fix_cursor).
pub fn cleanup_brs(tree: &mut Tree, node: NodeId) {
  let brs: Vec<NodeId> = tree
    .descendants(node)
    .filter(|&n| {
      tree.has_tag(n, "br") && tree.parent(n).and_then(|p| tree.last_child(p)) == Some(n)
    })
    .collect();
  for br in brs.into_iter().rev() {
    if !is_line_break(tree, br, false) {
      tree.detach(br);
    }
  }
}

/// Removes empty text nodes and inline elements left without children,
/// bottom-up. Leaves are kept.
pub fn remove_empty_inlines(tree: &mut Tree, node: NodeId) {
  let mut l = tree.child_count(node);
  while l > 0 {
    l -= 1;
    let Some(child) = tree.child(node, l) else {
      continue;
    };
    if tree.is_element(child) && !tree.is_leaf(child) {
      remove_empty_inlines(tree, child);
      if tree.is_inline(child) && tree.first_child(child).is_none() {
        tree.detach(child);
      }
    } else if tree.text(child).is_some_and(str::is_empty) {
      tree.detach(child);
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::test_util::*;

  fn cleaned(markup: &str) -> String {
    let (mut tree, root) = tree_from(markup);
    clean_tree(&mut tree, root, &ClassNames::default(), false).unwrap();
    html(&tree, root)
  }

  #[test]
  fn renames_legacy_tags() {
    assert_eq!(
      cleaned("<strong>a</strong><em>b</em><ins class=\"x\">c</ins><strike>d</strike>"),
      "<b>a</b><i>b</i><u class=\"x\">c</u><s>d</s>"
    );
  }

  #[test]
  fn span_styles_become_elements() {
    assert_eq!(cleaned("<span style=\"font-weight: 700\">x</span>"), "<b>x</b>");
    assert_eq!(
      cleaned("<span style=\"font-weight:bold; font-style:italic; color:red\">x</span>"),
      "<span style=\"color: red;\"><b><i>x</i></b></span>"
    );
    assert_eq!(
      cleaned("<span style=\"font-size:12px\">x</span>"),
      "<span class=\"size\" style=\"font-size:12px\">x</span>"
    );
  }

  #[test]
  fn font_and_tt() {
    assert_eq!(
      cleaned("<font face=\"Arial\" size=\"5\" color=\"f00\">x</font>"),
      "<span style=\"font-family: Arial; font-size: x-large; color: #f00;\">x</span>"
    );
    assert_eq!(cleaned("<font color=\"red\">x</font>"), "<span>x</span>");
    assert_eq!(
      cleaned("<tt>x</tt>"),
      "<span class=\"font\" style=\"font-family:menlo,consolas,&quot;courier new&quot;,monospace\">x</span>"
    );
  }

  #[test]
  fn drops_and_unwraps() {
    assert_eq!(cleaned("<p>a<style>p{}</style></p><meta>"), "<p>a</p>");
    assert_eq!(cleaned("<center><p>a</p></center>"), "<p>a</p>");
    assert_eq!(cleaned("<section><p>a</p></section>"), "<section><p>a</p></section>");
  }

  #[test]
  fn whitespace_collapses_to_adjacent_content() {
    assert_eq!(cleaned("<p>  a  <b> b </b>  </p>"), "<p>a <b> b</b></p>");
    assert_eq!(cleaned("<p>\n</p>\n<p>x</p>\n"), "<p></p><p>x</p>");
    assert_eq!(cleaned("<p><img>  x</p>"), "<p><img> x</p>");
  }

  #[test]
  fn pre_keeps_whitespace() {
    assert_eq!(cleaned("<pre>  a\n  b  </pre>"), "<pre>  a\n  b  </pre>");
  }

  #[test]
  fn trailing_brs() {
    let (mut tree, root) = tree_from("<p>a<br></p><p>a<br>b<br></p><p><b>c<br></b>d</p>");
    cleanup_brs(&mut tree, root);
    assert_eq!(html(&tree, root), "<p>a</p><p>a<br>b</p><p><b>c<br></b>d</p>");
  }

  #[test]
  fn empty_inlines() {
    let (mut tree, root) = tree_from("<p><b><i></i></b>a<img><span></span></p>");
    let p = element(&tree, root, "p", 0);
    let empty = tree.create_text("");
    tree.append(p, empty).unwrap();
    remove_empty_inlines(&mut tree, root);
    assert_eq!(html(&tree, root), "<p>a<img></p>");
  }
}
