//! Adding, removing and querying inline formatting over a range.

use the_core::chars::ZWS;
use the_dom::NodeId;

use crate::{
  Attributes,
  bookmark::{
    get_range_and_remove_bookmark,
    is_marker,
    save_range_to_bookmark,
  },
  insert_delete::insert_node_in_range,
  merge_split::merge_inlines,
  node::{
    create_element,
    get_nearest,
    has_tag_attributes,
  },
  normalize::{
    fix_cursor,
    remove_zws,
  },
  range::{
    Point,
    PseudoRange,
    is_node_contained_in_range,
  },
  tree::{
    Result,
    Tree,
  },
};

/// A tag plus the attributes an element needs to count as that format.
/// Without attributes any element with the tag matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
  pub tag:        String,
  pub attributes: Option<Attributes>,
}

impl Format {
  pub fn new(tag: &str) -> Self {
    Self {
      tag:        tag.to_ascii_lowercase(),
      attributes: None,
    }
  }

  pub fn with_attributes(tag: &str, attributes: Attributes) -> Self {
    Self {
      tag:        tag.to_ascii_lowercase(),
      attributes: Some(attributes),
    }
  }

  fn matches(&self, tree: &Tree, node: NodeId) -> bool {
    has_tag_attributes(tree, node, &self.tag, self.attributes.as_ref())
  }

  fn nearest(&self, tree: &Tree, node: NodeId, root: NodeId) -> Option<NodeId> {
    get_nearest(tree, node, root, &self.tag, self.attributes.as_ref())
  }
}

/// Applies `format` to `range` and returns the range to select afterwards.
///
/// A collapsed range gets an empty `format` element (holding a zero-width
/// space) with the cursor inside, and stale placeholders elsewhere in the
/// block are dropped. Otherwise every text, `<br>` and `<img>` touched by
/// the range that isn't already formatted is wrapped on its own, after
/// splitting text at the range edges.
pub fn add_format(tree: &mut Tree, format: &Format, range: PseudoRange, root: NodeId) -> Result<PseudoRange> {
  let mut range = range;
  if range.is_collapsed() {
    let el = create_element(tree, &format.tag, format.attributes.as_ref(), &[])?;
    fix_cursor(tree, el);
    insert_node_in_range(tree, &mut range, el)?;
    let focus = tree.first_child(el).unwrap_or(el);
    let offset = if tree.is_text(focus) { tree.len(focus) } else { 0 };
    range = PseudoRange::collapsed(Point::new(focus, offset));

    let mut block = el;
    while tree.is_inline(block)
      && let Some(parent) = tree.parent(block)
    {
      block = parent;
    }
    remove_zws(tree, block, Some(el));
    return Ok(range);
  }

  let common = range.common_ancestor(tree);
  let wanted = |tree: &Tree, n: NodeId| {
    (tree.is_text(n) || tree.has_tag(n, "br") || tree.has_tag(n, "img"))
      && is_node_contained_in_range(tree, &range, n, true)
  };
  let nodes: Vec<NodeId> = if wanted(tree, common) {
    vec![common]
  } else {
    tree.descendants(common).filter(|&n| wanted(tree, n)).collect()
  };
  let Some(&first) = nodes.first() else {
    return Ok(range);
  };

  let Point {
    node: mut start_node,
    offset: mut start_offset,
  } = range.start;
  let Point {
    node: mut end_node,
    offset: mut end_offset,
  } = range.end;
  if !nodes.contains(&start_node) {
    start_node = first;
    start_offset = 0;
  }

  for node in nodes {
    if format.nearest(tree, node, root).is_some() {
      continue;
    }
    let mut node = node;
    if tree.is_text(node) {
      if node == end_node && tree.len(node) > end_offset {
        tree.split_text(node, end_offset)?;
      }
      if node == start_node && start_offset > 0 {
        let parent = tree.parent(node);
        node = tree.split_text(node, start_offset)?;
        if end_node == start_node {
          end_node = node;
          end_offset -= start_offset;
        } else if Some(end_node) == parent {
          end_offset += 1;
        }
        start_node = node;
        start_offset = 0;
      }
    }
    let el = create_element(tree, &format.tag, format.attributes.as_ref(), &[])?;
    tree.replace_with(node, el)?;
    tree.append(el, node)?;
    tracing::trace!(?node, tag = %format.tag, "wrapped in format");
  }

  Ok(PseudoRange::new(
    tree,
    Point::new(start_node, start_offset),
    Point::new(end_node, end_offset),
  ))
}

/// Removes `format` from `range` and returns the range to select
/// afterwards.
///
/// Content of a matching element that lies outside the range is rewrapped
/// in a copy of that element, so only the selected part loses the format.
/// With `partial` every matching element touching the range is unwrapped
/// whole. A collapsed range gets a zero-width space to anchor the cursor
/// between the two halves.
pub fn remove_format(
  tree: &mut Tree,
  format: &Format,
  range: PseudoRange,
  root: NodeId,
  partial: bool,
) -> Result<PseudoRange> {
  let mut range = range;
  save_range_to_bookmark(tree, &mut range)?;

  let fixer = if range.is_collapsed() {
    let fixer = tree.create_text(ZWS.to_string());
    insert_node_in_range(tree, &mut range, fixer)?;
    Some(fixer)
  } else {
    None
  };

  let mut scope = range.common_ancestor(tree);
  while tree.is_inline(scope)
    && let Some(parent) = tree.parent(scope)
  {
    scope = parent;
  }

  let format_tags: Vec<NodeId> = tree
    .descendants(scope)
    .filter(|&n| format.matches(tree, n) && is_node_contained_in_range(tree, &range, n, true))
    .collect();

  if !partial {
    let mut to_wrap = Vec::new();
    for &el in &format_tags {
      examine_node(tree, &range, el, el, &mut to_wrap)?;
    }
    for (exemplar, node) in to_wrap {
      let el = tree.clone_shallow(exemplar)?;
      tree.replace_with(node, el)?;
      tree.append(el, node)?;
    }
  }

  for el in format_tags {
    tree.unwrap(el)?;
  }

  if let Some(parent) = fixer.and_then(|f| tree.parent(f))
    && let Some(block) = tree.non_inline_ancestor(parent)
  {
    remove_zws(tree, block, Some(parent));
  }

  if let Some(restored) = get_range_and_remove_bookmark(tree, root)? {
    range = restored;
  }
  if fixer.is_some() {
    range.collapse(false);
  }
  merge_inlines(tree, scope, &mut range)?;
  Ok(range)
}

// Collects the parts of a matched element that fall outside `range`,
// splitting text cut by a range edge.
fn examine_node(
  tree: &mut Tree,
  range: &PseudoRange,
  node: NodeId,
  exemplar: NodeId,
  to_wrap: &mut Vec<(NodeId, NodeId)>,
) -> Result<()> {
  if is_node_contained_in_range(tree, range, node, false) {
    return Ok(());
  }
  if !is_node_contained_in_range(tree, range, node, true) {
    let empty_text = tree.text(node).is_some_and(str::is_empty);
    if !is_marker(tree, node) && !empty_text {
      to_wrap.push((exemplar, node));
    }
    return Ok(());
  }

  if tree.is_text(node) {
    let Point {
      node: end_node,
      offset: end_offset,
    } = range.end;
    let Point {
      node: start_node,
      offset: start_offset,
    } = range.start;
    if node == end_node && end_offset != tree.len(node) {
      let tail = tree.split_text(node, end_offset)?;
      to_wrap.push((exemplar, tail));
    }
    if node == start_node && start_offset > 0 {
      tree.split_text(node, start_offset)?;
      to_wrap.push((exemplar, node));
    }
  } else {
    for child in tree.children(node).to_vec() {
      examine_node(tree, range, child, exemplar, to_wrap)?;
    }
  }
  Ok(())
}

/// Whether everything `range` selects carries `format`. Text touched only
/// at its very edge doesn't count.
pub fn has_format(tree: &Tree, format: &Format, range: PseudoRange, root: NodeId) -> bool {
  let mut range = range;
  if !range.is_collapsed() {
    let Point { node, offset } = range.start;
    if tree.is_text(node)
      && offset == tree.len(node)
      && let Some(next) = tree.next_sibling(node)
    {
      range.set_start_before(tree, next);
    }
    let Point { node, offset } = range.end;
    if tree.is_text(node)
      && offset == 0
      && let Some(previous) = tree.previous_sibling(node)
    {
      range.set_end_after(tree, previous);
    }
  }

  let common = range.common_ancestor(tree);
  if format.nearest(tree, common, root).is_some() {
    return true;
  }
  if tree.is_text(common) {
    return false;
  }

  let mut seen = false;
  for node in tree.descendants(common) {
    if !tree.is_text(node) || !is_node_contained_in_range(tree, &range, node, true) {
      continue;
    }
    if format.nearest(tree, node, root).is_none() {
      return false;
    }
    seen = true;
  }
  seen
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    node::attributes,
    test_util::*,
  };

  #[test]
  fn collapsed_add_inserts_placeholder() {
    let (mut tree, root) = tree_from("<div>ab</div>");
    let t = text_node(&tree, root, "ab");
    let range = add_format(&mut tree, &Format::new("B"), caret(t, 1), root).unwrap();
    assert_eq!(html(&tree, root), "<div>a<b>\u{200B}</b>b</div>");
    let b = element(&tree, root, "b", 0);
    let zws = tree.first_child(b).unwrap();
    assert_eq!(range, caret(zws, 1));
  }

  #[test]
  fn add_within_text() {
    let (mut tree, root) = tree_from("<p>abcd</p>");
    let t = text_node(&tree, root, "abcd");
    let selection = span(&tree, (t, 1), (t, 3));
    let range = add_format(&mut tree, &Format::new("b"), selection, root).unwrap();
    assert_eq!(html(&tree, root), "<p>a<b>bc</b>d</p>");
    let bc = text_node(&tree, root, "bc");
    assert_eq!(range, span(&tree, (bc, 0), (bc, 2)));
  }

  #[test]
  fn add_across_elements() {
    let (mut tree, root) = tree_from("<p>ab<i>cd</i>ef</p>");
    let ab = text_node(&tree, root, "ab");
    let ef = text_node(&tree, root, "ef");
    let format = Format::with_attributes("span", attributes([("class", "size")]));
    let selection = span(&tree, (ab, 1), (ef, 1));
    add_format(&mut tree, &format, selection, root).unwrap();
    assert_eq!(
      html(&tree, root),
      "<p>a<span class=\"size\">b</span><i><span class=\"size\">cd</span></i><span \
       class=\"size\">e</span>f</p>"
    );
  }

  #[test]
  fn add_skips_formatted_text() {
    let (mut tree, root) = tree_from("<p><b>ab</b>cd</p>");
    let ab = text_node(&tree, root, "ab");
    let cd = text_node(&tree, root, "cd");
    let selection = span(&tree, (ab, 0), (cd, 2));
    add_format(&mut tree, &Format::new("b"), selection, root).unwrap();
    assert_eq!(html(&tree, root), "<p><b>ab</b><b>cd</b></p>");
  }

  #[test]
  fn remove_middle_of_format() {
    let (mut tree, root) = tree_from("<p>a<b>bcd</b>e</p>");
    let bcd = text_node(&tree, root, "bcd");
    let p = element(&tree, root, "p", 0);
    let selection = span(&tree, (bcd, 1), (bcd, 2));
    let range = remove_format(&mut tree, &Format::new("b"), selection, root, false).unwrap();
    assert_eq!(html(&tree, root), "<p>a<b>b</b>c<b>d</b>e</p>");
    assert_eq!(range, span(&tree, (p, 2), (p, 3)));
  }

  #[test]
  fn remove_at_cursor_splits_format() {
    let (mut tree, root) = tree_from("<p><b>ab</b></p>");
    let ab = text_node(&tree, root, "ab");
    let p = element(&tree, root, "p", 0);
    let range = remove_format(&mut tree, &Format::new("b"), caret(ab, 1), root, false).unwrap();
    assert_eq!(html(&tree, root), "<p><b>a</b>\u{200B}<b>b</b></p>");
    assert_eq!(range, caret(p, 2));
  }

  #[test]
  fn partial_remove_unwraps_whole_element() {
    let (mut tree, root) = tree_from("<p><a href=\"x\">link</a> text</p>");
    let link = text_node(&tree, root, "link");
    let selection = span(&tree, (link, 1), (link, 2));
    remove_format(&mut tree, &Format::new("a"), selection, root, true).unwrap();
    assert_eq!(html(&tree, root), "<p>link text</p>");
  }

  #[test]
  fn format_queries() {
    let (tree, root) = tree_from("<p>x<b>ab</b>cd</p>");
    let x = text_node(&tree, root, "x");
    let ab = text_node(&tree, root, "ab");
    let cd = text_node(&tree, root, "cd");
    let bold = Format::new("b");
    assert!(has_format(&tree, &bold, caret(ab, 1), root));
    assert!(has_format(&tree, &bold, span(&tree, (x, 1), (ab, 2)), root));
    assert!(!has_format(&tree, &bold, span(&tree, (ab, 1), (cd, 1)), root));
    assert!(!has_format(&tree, &bold, caret(cd, 1), root));
    assert!(!has_format(&tree, &Format::new("i"), caret(ab, 1), root));
  }

  quickcheck::quickcheck! {
    fn add_then_remove_keeps_text(len: u8, a: u8, b: u8) -> bool {
      let len = usize::from(len % 12) + 1;
      let data: String = "abcdefghijkl".chars().take(len).collect();
      let (a, b) = (usize::from(a) % (len + 1), usize::from(b) % (len + 1));
      if a == b {
        return true;
      }
      let (mut tree, root) = tree_from(&format!("<p>{data}</p>"));
      let t = text_node(&tree, root, &data);
      let bold = Format::new("b");
      let selection = span(&tree, (t, a), (t, b));
      let Ok(range) = add_format(&mut tree, &bold, selection, root) else {
        return false;
      };
      if !has_format(&tree, &bold, range, root) {
        return false;
      }
      remove_format(&mut tree, &bold, range, root, false).is_ok()
        && html(&tree, root) == format!("<p>{data}</p>")
    }
  }
}
