//! Benchmarks for the structural hot paths in the-lib.
//!
//! Run with: `cargo bench -p the-lib --bench structure`

use divan::{
  Bencher,
  black_box,
};
use the_dom::markup::parse_fragment;
use the_lib::{
  NodeId,
  config::EditorConfig,
  editor::Editor,
  normalize::fix_container,
  range::{
    Point,
    PseudoRange,
  },
  tree::Tree,
};

fn main() {
  divan::main();
}

fn make_markup(paragraphs: usize) -> String {
  let line = "<p>The <b>quick</b> brown <i>fox <u>jumps</u></i> over the lazy dog.</p>";
  let mut s = String::with_capacity(line.len() * paragraphs);
  for i in 0..paragraphs {
    if i % 8 == 7 {
      s.push_str("<ul><li>one</li><li>two <b>three</b></li></ul>");
    } else {
      s.push_str(line);
    }
  }
  s
}

fn make_tree(paragraphs: usize) -> (Tree, NodeId) {
  let mut tree = Tree::new();
  let root = tree.create_element("div");
  let frag = parse_fragment(&mut tree, &make_markup(paragraphs)).unwrap();
  tree.append(root, frag).unwrap();
  (tree, root)
}

fn make_editor(paragraphs: usize) -> Editor {
  let mut editor = Editor::new(EditorConfig::default()).unwrap();
  editor.set_html(&make_markup(paragraphs)).unwrap();
  editor
}

// Whole-document range over the text of the first and last paragraph.
fn whole_document(editor: &Editor) -> PseudoRange {
  let tree = editor.tree();
  let root = editor.root();
  let texts: Vec<NodeId> = tree.descendants(root).filter(|&n| tree.is_text(n)).collect();
  let first = texts.first().copied().unwrap_or(root);
  let last = texts.last().copied().unwrap_or(root);
  PseudoRange::new(tree, Point::new(first, 1), Point::new(last, tree.len(last)))
}

// Classification with a cold cache.

mod classify {
  use super::*;

  #[divan::bench(args = [16, 128, 1024])]
  fn cold(bencher: Bencher, paragraphs: usize) {
    let (tree, root) = make_tree(paragraphs);

    bencher.bench_local(|| {
      tree.invalidate_all();
      let blocks = tree.descendants(root).filter(|&n| tree.is_block(n)).count();
      black_box(blocks);
    });
  }
}

// `fix_container` over loose inline content.

mod normalize {
  use super::*;

  #[divan::bench(args = [16, 128])]
  fn wrap_loose_inlines(bencher: Bencher, paragraphs: usize) {
    let markup = make_markup(paragraphs).replace("<p>", "").replace("</p>", "<br>");

    bencher
      .with_inputs(|| {
        let mut tree = Tree::new();
        let frag = parse_fragment(&mut tree, &markup).unwrap();
        (tree, frag)
      })
      .bench_local_refs(|(tree, frag)| {
        fix_container(tree, *frag, "div");
      });
  }
}

// Editor commands end to end, snapshot included.

mod commands {
  use super::*;

  #[divan::bench(args = [16, 128])]
  fn set_html(bencher: Bencher, paragraphs: usize) {
    let markup = make_markup(paragraphs);
    let mut editor = make_editor(1);

    bencher.bench_local(|| {
      editor.set_html(black_box(&markup)).unwrap();
    });
  }

  #[divan::bench(args = [16, 128])]
  fn bold_everything(bencher: Bencher, paragraphs: usize) {
    bencher
      .with_inputs(|| {
        let mut editor = make_editor(paragraphs);
        let range = whole_document(&editor);
        editor.set_selection(range);
        editor
      })
      .bench_local_refs(|editor| {
        editor.bold().unwrap();
      });
  }

  #[divan::bench(args = [16, 128])]
  fn list_round_trip(bencher: Bencher, paragraphs: usize) {
    bencher
      .with_inputs(|| {
        let mut editor = make_editor(paragraphs);
        let range = whole_document(&editor);
        editor.set_selection(range);
        editor
      })
      .bench_local_refs(|editor| {
        editor.make_ordered_list().unwrap();
        editor.remove_list().unwrap();
      });
  }

  #[divan::bench(args = [16, 128])]
  fn undo_redo(bencher: Bencher, paragraphs: usize) {
    bencher
      .with_inputs(|| {
        let mut editor = make_editor(paragraphs);
        let range = whole_document(&editor);
        editor.set_selection(range);
        editor.italic().unwrap();
        editor
      })
      .bench_local_refs(|editor| {
        editor.undo().unwrap();
        editor.redo().unwrap();
      });
  }
}
