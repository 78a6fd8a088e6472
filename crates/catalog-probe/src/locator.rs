//! Element selection for the catalog admin page.
//!
//! Form controls on the page carry ids derived from their visible label:
//! `"Category"` lives at `#product_category`, `"Search"` is `#search-btn`.
//! Steps speak in labels, and [`field_id`] / [`button_id`] turn them into
//! selectors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace prefix for product form fields
pub const ID_PREFIX: &str = "product_";

/// Suffix for button ids
pub const BUTTON_SUFFIX: &str = "-btn";

/// Flash message region updated after every action
pub const FLASH_MESSAGE_ID: &str = "flash_message";

/// Region holding the rendered search results
pub const SEARCH_RESULTS_ID: &str = "search_results";

/// Class of the results table
pub const RESULTS_TABLE_CLASS: &str = "table";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// Element id (`#id`)
    Id(String),
    /// Class name (`.name`)
    ClassName(String),
    /// Tag name (`body`, `tr`)
    TagName(String),
    /// Raw CSS selector
    Css(String),
}

impl Selector {
    /// Create an id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create a class selector
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::ClassName(name.into())
    }

    /// Create a tag selector
    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::TagName(name.into())
    }

    /// Create a raw CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Selector for a product form field by its label
    #[must_use]
    pub fn field(label: &str) -> Self {
        Self::Id(field_id(label))
    }

    /// Selector for a button by its label
    #[must_use]
    pub fn button(label: &str) -> Self {
        Self::Id(button_id(label))
    }

    /// The flash message region
    #[must_use]
    pub fn flash_message() -> Self {
        Self::id(FLASH_MESSAGE_ID)
    }

    /// The search results region
    #[must_use]
    pub fn search_results() -> Self {
        Self::id(SEARCH_RESULTS_ID)
    }

    /// The search results table
    #[must_use]
    pub fn results_table() -> Self {
        Self::class(RESULTS_TABLE_CLASS)
    }

    /// Rows of the search results table
    #[must_use]
    pub fn results_rows() -> Self {
        Self::css(format!(".{RESULTS_TABLE_CLASS} tr"))
    }

    /// Document body
    #[must_use]
    pub fn body() -> Self {
        Self::tag("body")
    }

    /// Convert to a CSS selector string
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Self::Id(id) => format!("#{id}"),
            Self::ClassName(name) => format!(".{name}"),
            Self::TagName(tag) | Self::Css(tag) => tag.clone(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Derive a form field id from its human label.
///
/// Lower-cases the label, replaces spaces with underscores and prefixes
/// [`ID_PREFIX`].
#[must_use]
pub fn field_id(label: &str) -> String {
    format!("{ID_PREFIX}{}", label.to_lowercase().replace(' ', "_"))
}

/// Derive a button id from its label
#[must_use]
pub fn button_id(label: &str) -> String {
    format!("{}{BUTTON_SUFFIX}", label.to_lowercase())
}
