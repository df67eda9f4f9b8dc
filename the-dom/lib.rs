use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod markup;
pub mod node;
pub mod style;
pub mod tags;

pub use node::{
  Attributes,
  Dom,
  DomError,
  Element,
  NodeId,
  NodeKind,
  Result,
};

pub type Tendril = SmartString<LazyCompact>;
