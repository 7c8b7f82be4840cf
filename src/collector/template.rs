//! Optional topic-template mapping. When a binding exists for a topic the
//! reader emits an additional templated record alongside the plain one.

use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Topics with template support.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateTopic {
    #[serde(rename = "router")]
    Router,
    #[serde(rename = "unicast_prefix")]
    UnicastPrefix,
}

/// A resolved template binding: the bus topic to publish under and the
/// record format to render.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    pub topic: String,
    pub format: String,
}

/// Topic to template mapping, loaded once per connection from a JSON file:
///
/// ```json
/// {
///   "router": {"topic": "openbmp.parsed.router", "format": "tsv"}
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateMap {
    map: HashMap<TemplateTopic, TemplateEntry>,
}

impl TemplateMap {
    /// Load a template file. A missing or corrupt file logs a warning and
    /// yields an empty map: the connection proceeds untemplated.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("failed to read template file {}: {e}", path.display());
                return TemplateMap::default();
            }
        };
        match serde_json::from_str::<HashMap<TemplateTopic, TemplateEntry>>(&content) {
            Ok(map) => TemplateMap { map },
            Err(e) => {
                warn!("failed to parse template file {}: {e}", path.display());
                TemplateMap::default()
            }
        }
    }

    pub fn get(&self, topic: TemplateTopic) -> Option<&TemplateEntry> {
        self.map.get(&topic)
    }

    pub fn insert(&mut self, topic: TemplateTopic, entry: TemplateEntry) {
        self.map.insert(topic, entry);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
