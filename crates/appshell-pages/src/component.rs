//! Core component trait

use std::collections::BTreeMap;

/// Base interface for server- and client-renderable shell components.
///
/// Components here hold `Rc` handles into shared stores, so unlike thread-safe
/// widget libraries the trait carries no `Send + Sync` bound.
pub trait Component {
	/// Returns the component's name (for debugging)
	fn name(&self) -> &'static str;

	/// Renders the component to an HTML string
	fn render(&self) -> String;

	/// Returns HTML attributes for the component's root element
	fn attributes(&self) -> BTreeMap<String, String> {
		BTreeMap::new()
	}
}

/// Renders attributes as ` key="value"` pairs with escaped values
pub(crate) fn render_attributes(attributes: &BTreeMap<String, String>) -> String {
	attributes
		.iter()
		.map(|(key, value)| {
			format!(
				" {}=\"{}\"",
				key,
				html_escape::encode_double_quoted_attribute(value)
			)
		})
		.collect()
}
