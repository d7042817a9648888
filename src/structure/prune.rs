//! Removal of online-only exclusions.

use std::collections::BTreeSet;

use crate::config::Settings;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

/// Detach every element listed in `remove_nodes_when_online`, with its
/// subtree. Does nothing for offline builds.
///
/// The document element itself is never removed. Returns the number of
/// listed ids found.
pub fn remove_nodes_when_online(doc: &mut Document, settings: &Settings) -> Result<usize> {
    if !settings.prunes_online_nodes() {
        return Ok(0);
    }
    let Some(root) = doc.root_element() else {
        return Ok(0);
    };

    let mut left: BTreeSet<&str> = settings
        .remove_nodes_when_online
        .iter()
        .map(String::as_str)
        .collect();

    let mut doomed: Vec<NodeId> = Vec::new();
    for node in doc.descendants(root).skip(1) {
        if let Some(id) = doc.xml_id(node)
            && left.remove(id)
        {
            doomed.push(node);
        }
    }

    if !left.is_empty() {
        let missing: Vec<_> = left.iter().map(|id| format!("\"{id}\"")).collect();
        return Err(Error::Config(format!(
            "These xml:id-s, specified in the \"removeNodesWhenOnline\" setting, weren't found \
             in the document: {}",
            missing.join(", ")
        )));
    }

    for &node in &doomed {
        doc.detach(node);
    }
    log::debug!("Removed {} online-only element(s)", doomed.len());
    Ok(doomed.len())
}
