//! Markup serialization and a lenient markup reader.
//!
//! The reader is not a conforming HTML parser. It tokenizes tags, text,
//! comments and character references, builds whatever tree the tokens
//! describe, and never fails on malformed input: stray end tags are
//! dropped, unclosed elements are closed at the end of input, and a `<`
//! that does not start a tag is kept as text.

use std::fmt::Write as _;

use the_core::chars::NBSP;

use crate::{
  Dom,
  NodeId,
  NodeKind,
  Result,
  tags,
};

/// Outer markup of `id`.
pub fn serialize(dom: &Dom, id: NodeId) -> String {
  let mut out = String::new();
  write_node(dom, id, &mut out);
  out
}

/// Inner markup of `id`.
pub fn serialize_children(dom: &Dom, id: NodeId) -> String {
  let mut out = String::new();
  for &child in dom.children(id) {
    write_node(dom, child, &mut out);
  }
  out
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
  match dom.kind(id) {
    Some(NodeKind::Text(data)) => {
      let raw = dom.parent(id).and_then(|p| dom.tag(p)).is_some_and(tags::is_raw_text_tag);
      if raw {
        out.push_str(data);
      } else {
        escape_text(data, out);
      }
    },
    Some(NodeKind::Element(element)) => {
      out.push('<');
      out.push_str(&element.tag);
      for (name, value) in &element.attributes {
        let _ = write!(out, " {name}=\"");
        escape_attribute(value, out);
        out.push('"');
      }
      out.push('>');
      if tags::is_void_tag(&element.tag) {
        return;
      }
      for &child in dom.children(id) {
        write_node(dom, child, out);
      }
      let _ = write!(out, "</{}>", element.tag);
    },
    Some(NodeKind::Fragment) => {
      for &child in dom.children(id) {
        write_node(dom, child, out);
      }
    },
    None => {},
  }
}

fn escape_text(data: &str, out: &mut String) {
  for ch in data.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      NBSP => out.push_str("&nbsp;"),
      ch => out.push(ch),
    }
  }
}

fn escape_attribute(data: &str, out: &mut String) {
  for ch in data.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '"' => out.push_str("&quot;"),
      NBSP => out.push_str("&nbsp;"),
      ch => out.push(ch),
    }
  }
}

/// Reads `input` into a new fragment.
pub fn parse_fragment(dom: &mut Dom, input: &str) -> Result<NodeId> {
  let fragment = dom.create_fragment();
  let bytes = input.as_bytes();
  let mut open: Vec<NodeId> = vec![fragment];
  let mut idx = 0_usize;

  while idx < bytes.len() {
    let current = open.last().copied().unwrap_or(fragment);

    if bytes[idx] != b'<' {
      let next = find_byte(bytes, idx + 1, b'<').unwrap_or(bytes.len());
      append_text(dom, current, &decode_entities(&input[idx..next]))?;
      idx = next;
      continue;
    }

    if starts_with(bytes, idx, b"<!--") {
      idx = skip_comment(bytes, idx);
      continue;
    }

    if starts_with(bytes, idx, b"<!") || starts_with(bytes, idx, b"<?") {
      idx = skip_to_gt(bytes, idx + 2);
      continue;
    }

    let Some((tag, next_idx)) = parse_tag(input, idx) else {
      append_text(dom, current, "<")?;
      idx += 1;
      continue;
    };
    idx = next_idx;

    if tag.is_end {
      if let Some(depth) = open
        .iter()
        .rposition(|&node| node != fragment && dom.has_tag(node, &tag.name))
      {
        open.truncate(depth);
      }
      continue;
    }

    let element = dom.create_element_with(&tag.name, tag.attributes);
    dom.append(current, element)?;

    if tags::is_raw_text_tag(&tag.name) && !tag.self_closing {
      let (raw, after) = read_raw_text_until_end_tag(input, idx, &tag.name);
      if !raw.is_empty() {
        let text = dom.create_text(raw);
        dom.append(element, text)?;
      }
      idx = after;
      continue;
    }

    if !tag.self_closing && !tags::is_void_tag(&tag.name) {
      open.push(element);
    }
  }

  Ok(fragment)
}

fn append_text(dom: &mut Dom, parent: NodeId, data: &str) -> Result<()> {
  if data.is_empty() {
    return Ok(());
  }
  if let Some(last) = dom.last_child(parent)
    && dom.is_text(last)
  {
    return dom.append_text(last, data);
  }
  let text = dom.create_text(data);
  dom.append(parent, text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTag {
  name:         String,
  attributes:   Vec<(String, String)>,
  is_end:       bool,
  self_closing: bool,
}

fn parse_tag(input: &str, start: usize) -> Option<(ParsedTag, usize)> {
  let bytes = input.as_bytes();
  if bytes.get(start).copied() != Some(b'<') {
    return None;
  }

  let mut idx = start + 1;
  let mut is_end = false;
  if bytes.get(idx).copied() == Some(b'/') {
    is_end = true;
    idx += 1;
  }

  if !bytes.get(idx).is_some_and(u8::is_ascii_alphabetic) {
    return None;
  }
  let name_start = idx;
  while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
    idx += 1;
  }
  let name = input[name_start..idx].to_ascii_lowercase();

  let mut attributes = Vec::new();
  let mut self_closing = false;
  loop {
    idx = skip_spaces(bytes, idx);
    match bytes.get(idx).copied() {
      None => return None,
      Some(b'>') => {
        idx += 1;
        break;
      },
      Some(b'/') => {
        self_closing = true;
        idx += 1;
      },
      Some(_) => {
        self_closing = false;
        let attr_start = idx;
        while idx < bytes.len() && !matches!(bytes[idx], b'=' | b'>' | b'/') && !bytes[idx].is_ascii_whitespace() {
          idx += 1;
        }
        let attr_name = input[attr_start..idx].to_ascii_lowercase();
        idx = skip_spaces(bytes, idx);
        let mut value = String::new();
        if bytes.get(idx).copied() == Some(b'=') {
          idx = skip_spaces(bytes, idx + 1);
          let (raw, after) = read_attribute_value(input, idx)?;
          value = decode_entities(raw);
          idx = after;
        }
        if !attr_name.is_empty() && !is_end && !attributes.iter().any(|(n, _)| *n == attr_name) {
          attributes.push((attr_name, value));
        }
      },
    }
  }

  Some((
    ParsedTag {
      name,
      attributes,
      is_end,
      self_closing,
    },
    idx,
  ))
}

fn read_attribute_value(input: &str, start: usize) -> Option<(&str, usize)> {
  let bytes = input.as_bytes();
  match bytes.get(start).copied()? {
    quote @ (b'"' | b'\'') => {
      let end = find_byte(bytes, start + 1, quote)?;
      Some((&input[start + 1..end], end + 1))
    },
    _ => {
      let mut idx = start;
      while idx < bytes.len() && !bytes[idx].is_ascii_whitespace() && bytes[idx] != b'>' {
        idx += 1;
      }
      Some((&input[start..idx], idx))
    },
  }
}

fn read_raw_text_until_end_tag<'a>(input: &'a str, start: usize, tag_name: &str) -> (&'a str, usize) {
  let bytes = input.as_bytes();
  let tag_bytes = tag_name.as_bytes();
  let mut idx = start;
  while idx < bytes.len() {
    if bytes[idx] == b'<'
      && bytes.get(idx + 1).copied() == Some(b'/')
      && starts_with_ignore_ascii_case(bytes, idx + 2, tag_bytes)
      && let Some((_, end_idx)) = parse_tag(input, idx)
    {
      return (&input[start..idx], end_idx);
    }
    idx += 1;
  }
  (&input[start..], bytes.len())
}

/// Decodes the character references the serializer emits plus numeric
/// references. Unknown references are left untouched.
pub fn decode_entities(input: &str) -> String {
  if !input.contains('&') {
    return input.to_owned();
  }
  let mut out = String::with_capacity(input.len());
  let mut rest = input;
  while let Some(amp) = rest.find('&') {
    out.push_str(&rest[..amp]);
    rest = &rest[amp..];
    let decoded = rest
      .find(';')
      .filter(|&semi| semi <= 10)
      .and_then(|semi| decode_reference(&rest[1..semi]).map(|ch| (ch, semi)));
    match decoded {
      Some((ch, semi)) => {
        out.push(ch);
        rest = &rest[semi + 1..];
      },
      None => {
        out.push('&');
        rest = &rest[1..];
      },
    }
  }
  out.push_str(rest);
  out
}

fn decode_reference(name: &str) -> Option<char> {
  match name {
    "amp" => Some('&'),
    "lt" => Some('<'),
    "gt" => Some('>'),
    "quot" => Some('"'),
    "apos" => Some('\''),
    "nbsp" => Some(NBSP),
    _ => {
      let number = name.strip_prefix('#')?;
      let code = match number.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => number.parse().ok()?,
      };
      char::from_u32(code)
    },
  }
}

fn is_tag_name_char(byte: u8) -> bool {
  byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b':' | b'_')
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
  while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
    idx += 1;
  }
  idx
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
  let mut idx = start + 4;
  while idx + 2 < bytes.len() {
    if &bytes[idx..idx + 3] == b"-->" {
      return idx + 3;
    }
    idx += 1;
  }
  bytes.len()
}

fn skip_to_gt(bytes: &[u8], start: usize) -> usize {
  find_byte(bytes, start, b'>').map_or(bytes.len(), |idx| idx + 1)
}

fn find_byte(bytes: &[u8], start: usize, needle: u8) -> Option<usize> {
  bytes
    .get(start..)?
    .iter()
    .position(|&b| b == needle)
    .map(|offset| start + offset)
}

fn starts_with(bytes: &[u8], idx: usize, needle: &[u8]) -> bool {
  bytes.get(idx..).is_some_and(|rest| rest.starts_with(needle))
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, needle: &[u8]) -> bool {
  bytes
    .get(idx..idx + needle.len())
    .is_some_and(|window| window.eq_ignore_ascii_case(needle))
}
