use std::collections::BTreeMap;

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::Attributes;

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid editor config: {0}")]
  Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EditorConfig {
  /// Tag of the blocks created to wrap loose inline content.
  pub block_tag:      String,
  /// Attributes given to elements of a tag whenever the editor creates one.
  pub tag_attributes: BTreeMap<String, BTreeMap<String, String>>,
  pub undo:           UndoConfig,
  pub class_names:    ClassNames,
}

impl Default for EditorConfig {
  fn default() -> Self {
    Self {
      block_tag:      "div".into(),
      tag_attributes: BTreeMap::new(),
      undo:           UndoConfig::default(),
      class_names:    ClassNames::default(),
    }
  }
}

impl EditorConfig {
  pub fn from_toml_str(input: &str) -> Result<Self> {
    Ok(toml::from_str(input)?)
  }

  /// Configured attributes for newly created `tag` elements.
  pub fn attributes_for(&self, tag: &str) -> Option<Attributes> {
    let attrs = self.tag_attributes.get(&tag.to_ascii_lowercase())?;
    Some(
      attrs
        .iter()
        .map(|(name, value)| (name.as_str().into(), value.clone()))
        .collect(),
    )
  }
}

/// Bounds on the undo stack. With a limit and no threshold the limit always
/// applies; with both it only applies once a snapshot outgrows the
/// threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct UndoConfig {
  /// Serialized size in bytes above which the limit kicks in.
  pub document_size_threshold: Option<usize>,
  /// Most entries kept before the oldest are evicted.
  pub undo_limit:              Option<usize>,
}

/// Classes put on the spans the editor creates for styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ClassNames {
  pub font_family: String,
  pub font_size:   String,
  pub color:       String,
  pub highlight:   String,
}

impl Default for ClassNames {
  fn default() -> Self {
    Self {
      font_family: "font".into(),
      font_size:   "size".into(),
      color:       "color".into(),
      highlight:   "highlight".into(),
    }
  }
}
