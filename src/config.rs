//! Analysis settings.
//!
//! With the `cli` feature, [`Settings`] deserializes from JSON using the
//! setting names of the docgen configuration file:
//!
//! ```json
//! {
//!   "lowestFileElementRank": "chapter",
//!   "lowestPageTOCElementRank": "section2",
//!   "numberedSections": true,
//!   "locale": "de-DE"
//! }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use crate::model::Rank;

/// Thresholds and switches for the structural passes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize))]
#[cfg_attr(
    feature = "cli",
    serde(default, rename_all = "camelCase", deny_unknown_fields)
)]
pub struct Settings {
    /// Elements of this rank and above get their own output file.
    pub lowest_file_element_rank: Rank,
    /// Elements of this rank and above are listed in the table of contents.
    /// Never lower than needed: see [`page_toc_rank`](Self::page_toc_rank).
    #[cfg_attr(feature = "cli", serde(rename = "lowestPageTOCElementRank"))]
    pub lowest_page_toc_element_rank: Rank,
    /// BCP 47 locale for index term ordering.
    pub locale: String,
    /// Directory local `imagedata` references are resolved against.
    pub content_dir: PathBuf,
    /// Number sections (2.1, 2.1.3) and not only chapters and above.
    pub numbered_sections: bool,
    /// Allow output file names derived from synthesized ids.
    #[cfg_attr(feature = "cli", serde(rename = "outputFilesCanUseAutoID"))]
    pub output_files_can_use_auto_id: bool,
    /// Drop the pages of file elements that have no content of their own.
    pub simple_navigation_mode: bool,
    /// Building for offline use; disables `remove_nodes_when_online`.
    pub offline: bool,
    /// `xml:id`s of elements removed when building for online deployment.
    pub remove_nodes_when_online: Vec<String>,
    /// `olink` target documents: `targetdoc` name to URL.
    pub olinks: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lowest_file_element_rank: Rank::Section1,
            lowest_page_toc_element_rank: Rank::Section3,
            locale: "en-US".to_string(),
            content_dir: PathBuf::from("."),
            numbered_sections: false,
            output_files_can_use_auto_id: false,
            simple_navigation_mode: false,
            offline: false,
            remove_nodes_when_online: Vec::new(),
            olinks: HashMap::new(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_element_rank(mut self, rank: Rank) -> Self {
        self.lowest_file_element_rank = rank;
        self
    }

    pub fn with_page_toc_element_rank(mut self, rank: Rank) -> Self {
        self.lowest_page_toc_element_rank = rank;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content_dir = dir.into();
        self
    }

    pub fn with_numbered_sections(mut self, numbered: bool) -> Self {
        self.numbered_sections = numbered;
        self
    }

    pub fn with_auto_id_file_names(mut self, allowed: bool) -> Self {
        self.output_files_can_use_auto_id = allowed;
        self
    }

    pub fn with_simple_navigation_mode(mut self, simple: bool) -> Self {
        self.simple_navigation_mode = simple;
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_removed_nodes<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remove_nodes_when_online = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_olink(mut self, target_doc: impl Into<String>, url: impl Into<String>) -> Self {
        self.olinks.insert(target_doc.into(), url.into());
        self
    }

    /// The page-TOC threshold actually used: an element with its own file is
    /// always in the table of contents, so this never exceeds the file
    /// threshold.
    pub fn page_toc_rank(&self) -> Rank {
        self.lowest_page_toc_element_rank
            .min(self.lowest_file_element_rank)
    }

    /// Path of a content file, relative to [`content_dir`](Self::content_dir).
    pub fn content_path(&self, relative: &str) -> PathBuf {
        self.content_dir.join(relative)
    }

    /// Whether `remove_nodes_when_online` applies.
    pub fn prunes_online_nodes(&self) -> bool {
        !self.offline && !self.remove_nodes_when_online.is_empty()
    }

    /// Parse settings from JSON.
    #[cfg(feature = "cli")]
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Load settings from a JSON file. A relative `contentDir` is resolved
    /// against the file's directory.
    #[cfg(feature = "cli")]
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&json)
            .map_err(|e| crate::Error::Config(format!("{}: {e}", path.display())))?;
        if settings.content_dir.is_relative()
            && let Some(base) = path.parent()
        {
            settings.content_dir = base.join(&settings.content_dir);
        }
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
