use std::collections::BTreeSet;

/// Tools that currently need the feature layer on the map.
/// The layer is visible as long as at least one tool holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerVisibility {
  showing: BTreeSet<String>,
}

impl LayerVisibility {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns true if this made the layer visible.
  pub fn show(&mut self, tool_id: &str) -> bool {
    let was_visible = self.is_visible();
    self.showing.insert(tool_id.to_owned());
    !was_visible
  }

  /// Returns true if this hid the layer.
  pub fn hide(&mut self, tool_id: &str) -> bool {
    self.showing.remove(tool_id) && !self.is_visible()
  }

  #[must_use]
  pub fn is_visible(&self) -> bool {
    !self.showing.is_empty()
  }

  pub fn tools(&self) -> impl Iterator<Item = &str> {
    self.showing.iter().map(String::as_str)
  }
}
