//! Title prefix counters.

use crate::model::NumberStyle;

/// Counters for the document-structure children of one structural parent.
///
/// Each number style counts on its own, so chapters and appendices of the
/// same book are numbered 1, 2, ... and A, B, ... independently. The united
/// counter advances for every child, numbered or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingState {
    decimal: u32,
    upper_roman: u32,
    upper_latin: u32,
    lower_roman: u32,
    united: u32,
}

impl Default for NumberingState {
    fn default() -> Self {
        Self {
            decimal: 1,
            upper_roman: 1,
            upper_latin: 1,
            lower_roman: 1,
            united: 1,
        }
    }
}

impl NumberingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next number of `style` and format it. `None` if the style
    /// can't express it.
    pub fn next_prefix(&mut self, style: NumberStyle) -> Option<String> {
        let counter = match style {
            NumberStyle::Decimal => &mut self.decimal,
            NumberStyle::UpperRoman => &mut self.upper_roman,
            NumberStyle::UpperLatin => &mut self.upper_latin,
            NumberStyle::LowerRoman => &mut self.lower_roman,
        };
        let n = *counter;
        *counter += 1;
        style.format(n)
    }

    /// Take the next united number.
    pub fn next_united(&mut self) -> u32 {
        let n = self.united;
        self.united += 1;
        n
    }
}

/// Append a local prefix to the inherited one: "2" + "1" is "2.1", but
/// "A." + "1" is "A.1".
pub fn join_prefix(inherited: Option<&str>, local: &str) -> String {
    match inherited {
        Some(parent) if parent.ends_with('.') => format!("{parent}{local}"),
        Some(parent) => format!("{parent}.{local}"),
        None => local.to_string(),
    }
}
