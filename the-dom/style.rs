//! Inline `style` attribute declarations.

use std::fmt;

use indexmap::IndexMap;

use crate::Tendril;

/// Ordered `property: value` pairs of a `style` attribute. Property names
/// are lower-cased; values are kept verbatim minus surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
  entries: IndexMap<Tendril, String>,
}

impl Declarations {
  pub fn parse(input: &str) -> Self {
    let mut entries = IndexMap::new();
    for declaration in input.split(';') {
      let Some((property, value)) = declaration.split_once(':') else {
        continue;
      };
      let property = property.trim();
      let value = value.trim();
      if property.is_empty() || value.is_empty() {
        continue;
      }
      entries.insert(Tendril::from(property.to_ascii_lowercase()), value.to_owned());
    }
    Self { entries }
  }

  pub fn get(&self, property: &str) -> Option<&str> {
    self.entries.get(property).map(String::as_str)
  }

  pub fn set(&mut self, property: &str, value: impl Into<String>) {
    self
      .entries
      .insert(Tendril::from(property.to_ascii_lowercase()), value.into());
  }

  pub fn remove(&mut self, property: &str) -> Option<String> {
    self.entries.shift_remove(property)
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

impl fmt::Display for Declarations {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, (property, value)) in self.iter().enumerate() {
      if i > 0 {
        f.write_str(" ")?;
      }
      write!(f, "{property}: {value};")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn parse_and_print() {
    let mut style = Declarations::parse(" Font-Weight : bold;;color:red ; junk");
    assert_eq!(style.get("font-weight"), Some("bold"));
    assert_eq!(style.get("color"), Some("red"));
    assert_eq!(style.len(), 2);
    style.remove("font-weight");
    style.set("text-align", "right");
    assert_eq!(style.to_string(), "color: red; text-align: right;");
  }

  #[test]
  fn empty_style() {
    assert!(Declarations::parse("").is_empty());
    assert_eq!(Declarations::default().to_string(), "");
  }
}
