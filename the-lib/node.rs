//! Node tests and offset helpers shared by the structural algorithms.

use the_dom::{
  Attributes,
  Dom,
  NodeId,
  NodeKind,
  style::Declarations,
};

use crate::category::is_leaf;

/// Whether two sibling nodes may be merged into one.
///
/// Leaves never merge. Text merges with text. Elements merge when they share
/// a tag, `class` and parsed `style`; links never merge, since that would
/// fold two targets into one.
pub fn are_alike(dom: &Dom, a: NodeId, b: NodeId) -> bool {
  if is_leaf(dom, a) {
    return false;
  }
  match (dom.kind(a), dom.kind(b)) {
    (Some(NodeKind::Text(_)), Some(NodeKind::Text(_))) => true,
    (Some(NodeKind::Fragment), Some(NodeKind::Fragment)) => true,
    (Some(NodeKind::Element(x)), Some(NodeKind::Element(y))) => {
      if x.tag != y.tag || x.tag == "a" {
        return false;
      }
      let class = |attrs: &Attributes| attrs.get("class").cloned().unwrap_or_default();
      let style = |attrs: &Attributes| {
        attrs
          .get("style")
          .map(|s| Declarations::parse(s))
          .unwrap_or_default()
      };
      class(&x.attributes) == class(&y.attributes) && style(&x.attributes) == style(&y.attributes)
    },
    _ => false,
  }
}

/// `node` is a `tag` element carrying every attribute in `attributes`.
pub fn has_tag_attributes(dom: &Dom, node: NodeId, tag: &str, attributes: Option<&Attributes>) -> bool {
  if !dom.has_tag(node, tag) {
    return false;
  }
  attributes.is_none_or(|attrs| {
    attrs
      .iter()
      .all(|(name, value)| dom.attribute(node, name) == Some(value.as_str()))
  })
}

/// Nearest inclusive ancestor of `node` matching `tag` and `attributes`,
/// searching up to but excluding `root`.
pub fn get_nearest(
  dom: &Dom,
  node: NodeId,
  root: NodeId,
  tag: &str,
  attributes: Option<&Attributes>,
) -> Option<NodeId> {
  let mut current = Some(node);
  while let Some(n) = current
    && n != root
  {
    if has_tag_attributes(dom, n, tag, attributes) {
      return Some(n);
    }
    current = dom.parent(n);
  }
  None
}

/// Deepest node ending right before `(node, offset)`: repeatedly steps into
/// the child before the offset and continues from its end.
pub fn get_node_before_offset(dom: &Dom, node: NodeId, offset: usize) -> NodeId {
  let mut node = node;
  let mut offset = offset;
  while offset > 0 && dom.is_element(node) {
    match dom.child(node, offset - 1) {
      Some(child) => {
        node = child;
        offset = dom.child_count(node);
      },
      None => break,
    }
  }
  node
}

/// Node starting right after `(node, offset)`. Text is returned as is; past
/// the last child this climbs to the next sibling of the first ancestor that
/// has one.
pub fn get_node_after_offset(dom: &Dom, node: NodeId, offset: usize) -> Option<NodeId> {
  if !dom.is_element(node) {
    return Some(node);
  }
  if let Some(child) = dom.child(node, offset) {
    return Some(child);
  }
  let mut current = node;
  loop {
    if let Some(next) = dom.next_sibling(current) {
      return Some(next);
    }
    current = dom.parent(current)?;
  }
}

/// Attribute map built from `(name, value)` pairs.
pub fn attributes<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Attributes {
  pairs
    .into_iter()
    .map(|(k, v)| (k.into(), v.to_owned()))
    .collect()
}

/// Creates a `tag` element with `attributes` and appends `children` to it.
pub fn create_element(
  dom: &mut Dom,
  tag: &str,
  attributes: Option<&Attributes>,
  children: &[NodeId],
) -> the_dom::Result<NodeId> {
  let element = match attributes {
    Some(attrs) => dom.create_element_with(tag, attrs.iter().map(|(k, v)| (k.as_str(), v.clone()))),
    None => dom.create_element(tag),
  };
  for &child in children {
    dom.append(element, child)?;
  }
  Ok(element)
}
