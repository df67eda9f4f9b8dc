use the_core::{
  chars::NBSP,
  text::char_range_to_bytes,
};
use the_dom::NodeId;

use crate::{
  range::{
    PseudoRange,
    is_node_contained_in_range,
  },
  tree::Tree,
  walk::next_matching,
};

/// Plain text of the selection. Line-breaking `<br>`s and the start of a
/// new block after some text become newlines; non-breaking spaces become
/// plain spaces. Whitespace-only text is skipped.
pub fn get_text_contents_of_range(tree: &Tree, range: &PseudoRange) -> String {
  if range.is_collapsed() {
    return String::new();
  }
  let start = range.start;
  let end = range.end;
  let common = range.common_ancestor(tree);
  let overlaps = |n: NodeId| is_node_contained_in_range(tree, range, n, true);

  let mut node = Some(start.node);
  if tree.is_fragment(start.node) || !overlaps(start.node) {
    node = next_matching(tree, common, start.node, overlaps);
  }

  let mut out = String::new();
  let mut added_text_in_block = false;
  while let Some(n) = node {
    if let Some(data) = tree.text(n) {
      if data.chars().any(|ch| !ch.is_whitespace()) {
        let mut value = data;
        if n == end.node {
          value = &value[char_range_to_bytes(value, 0, end.offset)];
        }
        if n == start.node {
          value = &value[char_range_to_bytes(value, start.offset, usize::MAX)];
        }
        out.push_str(value);
        added_text_in_block = true;
      }
    } else if tree.has_tag(n, "br") || (added_text_in_block && !tree.is_inline(n)) {
      out.push('\n');
      added_text_in_block = false;
    }
    node = next_matching(tree, common, n, overlaps);
  }
  out.replace(NBSP, " ")
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::test_util::*;

  #[test]
  fn text_across_blocks() {
    let (tree, root) = tree_from("<p>abc</p><p>d\u{a0}e<br>fg</p><p>hij</p>");
    let abc = text_node(&tree, root, "abc");
    let hij = text_node(&tree, root, "hij");
    let range = span(&tree, (abc, 1), (hij, 2));
    assert_eq!(get_text_contents_of_range(&tree, &range), "bc\nd e\nfg\nhi");
  }

  #[test]
  fn inside_one_text() {
    let (tree, root) = tree_from("<p>abcdef</p>");
    let t = text_node(&tree, root, "abcdef");
    assert_eq!(get_text_contents_of_range(&tree, &span(&tree, (t, 1), (t, 4))), "bcd");
    assert_eq!(get_text_contents_of_range(&tree, &caret(t, 2)), "");
  }
}
