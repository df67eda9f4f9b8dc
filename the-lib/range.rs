//! Boundary points and selections over the tree.
//!
//! A [`Point`] is a `(container, offset)` pair: a child index for elements
//! and fragments, a char index for text. A [`PseudoRange`] is an ordered pair
//! of points whose start never comes after its end; every constructor and
//! setter goes through [`compare_points`] to keep it that way.

use std::cmp::Ordering;

use smallvec::SmallVec;
use the_dom::{
  Dom,
  NodeId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
  pub node:   NodeId,
  pub offset: usize,
}

impl Point {
  pub fn new(node: NodeId, offset: usize) -> Self {
    Self { node, offset }
  }

  /// The point right before `node` in its parent.
  pub fn before(dom: &Dom, node: NodeId) -> Option<Self> {
    Some(Self::new(dom.parent(node)?, dom.index_of(node)?))
  }

  /// The point right after `node` in its parent.
  pub fn after(dom: &Dom, node: NodeId) -> Option<Self> {
    Some(Self::new(dom.parent(node)?, dom.index_of(node)? + 1))
  }
}

fn point_key(dom: &Dom, point: Point) -> SmallVec<[usize; 16]> {
  let mut key = dom.path_from_root(point.node);
  key.push(point.offset);
  key
}

/// Document order of two points in the same tree.
///
/// Comparing `path ++ [offset]` lexicographically matches boundary-point
/// order: a point in a parent sorts before everything inside the child at
/// its offset and after everything inside earlier children.
pub fn compare_points(dom: &Dom, a: Point, b: Point) -> Ordering {
  if a.node == b.node {
    return a.offset.cmp(&b.offset);
  }
  point_key(dom, a).as_slice().cmp(point_key(dom, b).as_slice())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoRange {
  pub(crate) start: Point,
  pub(crate) end:   Point,
}

impl PseudoRange {
  /// Builds a range from two points in either order.
  pub fn new(dom: &Dom, a: Point, b: Point) -> Self {
    if compare_points(dom, a, b) == Ordering::Greater {
      Self { start: b, end: a }
    } else {
      Self { start: a, end: b }
    }
  }

  pub fn collapsed(point: Point) -> Self {
    Self {
      start: point,
      end:   point,
    }
  }

  /// Range covering `node` itself, from its parent's point of view. A
  /// detached node covers its own contents.
  pub fn around(dom: &Dom, node: NodeId) -> Self {
    match (Point::before(dom, node), Point::after(dom, node)) {
      (Some(start), Some(end)) => Self { start, end },
      _ => Self::contents(dom, node),
    }
  }

  /// Range covering everything inside `node`.
  pub fn contents(dom: &Dom, node: NodeId) -> Self {
    Self {
      start: Point::new(node, 0),
      end:   Point::new(node, dom.len(node)),
    }
  }

  #[inline]
  pub fn start(&self) -> Point {
    self.start
  }

  #[inline]
  pub fn end(&self) -> Point {
    self.end
  }

  pub fn is_collapsed(&self) -> bool {
    self.start == self.end
  }

  /// Moves the start. A start past the end drags the end along.
  pub fn set_start(&mut self, dom: &Dom, point: Point) {
    self.start = point;
    if compare_points(dom, self.start, self.end) == Ordering::Greater {
      self.end = point;
    }
  }

  /// Moves the end. An end before the start drags the start along.
  pub fn set_end(&mut self, dom: &Dom, point: Point) {
    self.end = point;
    if compare_points(dom, self.start, self.end) == Ordering::Greater {
      self.start = point;
    }
  }

  pub fn set_start_before(&mut self, dom: &Dom, node: NodeId) {
    if let Some(point) = Point::before(dom, node) {
      self.set_start(dom, point);
    }
  }

  pub fn set_start_after(&mut self, dom: &Dom, node: NodeId) {
    if let Some(point) = Point::after(dom, node) {
      self.set_start(dom, point);
    }
  }

  pub fn set_end_before(&mut self, dom: &Dom, node: NodeId) {
    if let Some(point) = Point::before(dom, node) {
      self.set_end(dom, point);
    }
  }

  pub fn set_end_after(&mut self, dom: &Dom, node: NodeId) {
    if let Some(point) = Point::after(dom, node) {
      self.set_end(dom, point);
    }
  }

  /// Collapses onto the start, or onto the end when `to_start` is false.
  pub fn collapse(&mut self, to_start: bool) {
    if to_start {
      self.end = self.start;
    } else {
      self.start = self.end;
    }
  }

  /// Deepest node containing both boundaries.
  pub fn common_ancestor(&self, dom: &Dom) -> NodeId {
    let start_path: SmallVec<[NodeId; 16]> = std::iter::once(self.start.node)
      .chain(dom.ancestors(self.start.node))
      .collect();
    std::iter::once(self.end.node)
      .chain(dom.ancestors(self.end.node))
      .find(|node| start_path.contains(node))
      .unwrap_or(self.start.node)
  }

  /// True when both boundaries are attached nodes under `root`.
  pub fn is_within(&self, dom: &Dom, root: NodeId) -> bool {
    dom.exists(self.start.node)
      && dom.exists(self.end.node)
      && dom.contains(root, self.start.node)
      && dom.contains(root, self.end.node)
  }
}

/// Whether `node` lies inside `range`. With `partial`, any overlap counts;
/// touching only at a boundary does not.
pub fn is_node_contained_in_range(dom: &Dom, range: &PseudoRange, node: NodeId, partial: bool) -> bool {
  let node_range = PseudoRange::around(dom, node);
  if partial {
    let ends_before_start = compare_points(dom, range.start, node_range.end) != Ordering::Less;
    let starts_after_end = compare_points(dom, range.end, node_range.start) != Ordering::Greater;
    !ends_before_start && !starts_after_end
  } else {
    compare_points(dom, range.start, node_range.start) != Ordering::Greater
      && compare_points(dom, range.end, node_range.end) != Ordering::Less
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::test_util::*;

  #[test]
  fn point_order() {
    let (tree, root) = tree_from("<p>ab</p><p>cd</p>");
    let p1 = element(&tree, root, "p", 0);
    let ab = text_node(&tree, root, "ab");
    let cd = text_node(&tree, root, "cd");
    let cmp = |a: (NodeId, usize), b: (NodeId, usize)| {
      compare_points(&tree, Point::new(a.0, a.1), Point::new(b.0, b.1))
    };
    assert_eq!(cmp((root, 0), (ab, 0)), Ordering::Less);
    assert_eq!(cmp((root, 1), (ab, 2)), Ordering::Greater);
    assert_eq!(cmp((root, 1), (cd, 0)), Ordering::Less);
    assert_eq!(cmp((p1, 1), (ab, 2)), Ordering::Greater);
    assert_eq!(cmp((ab, 1), (ab, 1)), Ordering::Equal);
    assert_eq!(cmp((ab, 2), (cd, 0)), Ordering::Less);
  }

  #[test]
  fn construction_canonicalizes() {
    let (tree, root) = tree_from("<p>ab</p>");
    let ab = text_node(&tree, root, "ab");
    let range = span(&tree, (ab, 2), (ab, 0));
    assert_eq!(range.start(), Point::new(ab, 0));
    assert_eq!(range.end(), Point::new(ab, 2));
  }

  #[test]
  fn setters_keep_order() {
    let (tree, root) = tree_from("<p>abcd</p>");
    let t = text_node(&tree, root, "abcd");
    let mut range = span(&tree, (t, 1), (t, 2));
    range.set_start(&tree, Point::new(t, 3));
    assert!(range.is_collapsed());
    assert_eq!(range.end(), Point::new(t, 3));
    range.set_end(&tree, Point::new(t, 0));
    assert_eq!(range.start(), Point::new(t, 0));
  }

  #[test]
  fn common_ancestor() {
    let (tree, root) = tree_from("<p>a<b>b</b></p><p>c</p>");
    let a = text_node(&tree, root, "a");
    let b = text_node(&tree, root, "b");
    let c = text_node(&tree, root, "c");
    let p = element(&tree, root, "p", 0);
    assert_eq!(span(&tree, (a, 0), (b, 1)).common_ancestor(&tree), p);
    assert_eq!(span(&tree, (a, 0), (c, 1)).common_ancestor(&tree), root);
    assert_eq!(caret(a, 0).common_ancestor(&tree), a);
  }

  #[test]
  fn containment() {
    let (tree, root) = tree_from("<p>a</p><p>b</p><p>c</p>");
    let p2 = element(&tree, root, "p", 1);
    let a = text_node(&tree, root, "a");
    let b = text_node(&tree, root, "b");
    let c = text_node(&tree, root, "c");

    let whole = span(&tree, (root, 1), (root, 2));
    assert!(is_node_contained_in_range(&tree, &whole, p2, false));

    let inside = span(&tree, (b, 0), (b, 1));
    assert!(!is_node_contained_in_range(&tree, &inside, p2, false));
    assert!(is_node_contained_in_range(&tree, &inside, p2, true));

    // Touching at a boundary is not overlap.
    let edge = span(&tree, (a, 0), (root, 1));
    assert!(!is_node_contained_in_range(&tree, &edge, p2, true));

    let across = span(&tree, (a, 0), (c, 1));
    assert!(is_node_contained_in_range(&tree, &across, p2, false));
  }
}
