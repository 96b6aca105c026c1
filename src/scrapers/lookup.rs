//! First-match-wins evaluation of selector chains.
//!
//! Every field the cascade reads (headline link, description, timestamp,
//! image, article-page headline and body) is an ordered list of
//! [`Lookup`]s. The helpers here walk such a list and stop at the first hit,
//! so each field is one call instead of a bespoke loop.

use crate::config::Lookup;
use crate::document::Element;

impl Lookup {
    /// Value of the first element matching this lookup inside `scope`.
    ///
    /// Reads the configured attribute, or the element's text when none is
    /// set. Blank values count as a miss.
    pub fn probe(&self, scope: &Element<'_>) -> Option<String> {
        let element = scope.select_one(&self.selector)?;
        let value = match &self.attr {
            Some(name) => element.attr(name)?.trim().to_string(),
            None => element.text(),
        };
        (!value.is_empty()).then_some(value)
    }
}

/// First non-blank value produced by `chain` inside `scope`.
pub fn first_value(scope: &Element<'_>, chain: &[Lookup]) -> Option<String> {
    chain.iter().find_map(|lookup| lookup.probe(scope))
}

/// First non-blank image source produced by `chain` inside `scope`.
///
/// Inline `data:` URIs count as a miss, so a lazy-loaded `<img>` whose `src`
/// is a placeholder falls through to its `data-src` lookup.
pub fn first_image_source(scope: &Element<'_>, chain: &[Lookup]) -> Option<String> {
    chain
        .iter()
        .filter_map(|lookup| lookup.probe(scope))
        .find(|src| !src.starts_with("data:"))
}

/// First element matched by any selector of `chain`, whatever its content,
/// together with the lookup that found it.
pub fn first_element<'a, 'c>(
    scope: &Element<'a>,
    chain: &'c [Lookup],
) -> Option<(Element<'a>, &'c Lookup)> {
    chain
        .iter()
        .find_map(|lookup| scope.select_one(&lookup.selector).map(|el| (el, lookup)))
}
