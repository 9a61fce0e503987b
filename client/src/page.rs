//! Render-time page data
//!
//! Everything the server bakes into the viewer page: the slide to open, the
//! optional inline descriptors, capability flags, the navigation tree, and the
//! read-only property table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::slide::{SlideDescriptor, TileSourceMap};

/// Errors that can occur when loading page data
#[derive(Debug, Error)]
pub enum PageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid page data: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Data supplied by the page-rendering layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageData {
    pub slide: SlideDescriptor,
    /// Inline DZI documents keyed by URL (inline mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_sources: Option<TileSourceMap>,
    /// Segmentation is enabled for this deployment
    #[serde(default)]
    pub segmentation_enabled: bool,
    /// A mask already exists for the current slide
    #[serde(default)]
    pub mask_exists: bool,
    #[serde(default)]
    pub tree: Vec<SlideEntry>,
    #[serde(default)]
    pub properties: Properties,
}

impl PageData {
    pub fn new(slide: SlideDescriptor) -> Self {
        Self {
            slide,
            tile_sources: None,
            segmentation_enabled: false,
            mask_exists: false,
            tree: Vec::new(),
            properties: Properties::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PageError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, PageError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// The overlay can be shown right away
    pub fn overlay_capable(&self) -> bool {
        self.segmentation_enabled && self.mask_exists
    }

    /// Flattened navigation entries that carry a URL
    pub fn selectable_entries(&self) -> Vec<SelectableEntry<'_>> {
        let mut out = Vec::new();
        for entry in &self.tree {
            entry.collect_selectable(0, &mut out);
        }
        out
    }

    /// Find a navigation entry by URL
    pub fn find_entry(&self, url: &str) -> Option<&SlideEntry> {
        self.tree.iter().find_map(|entry| entry.find(url))
    }
}

/// Node of the image tree shown for navigation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlideEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SlideEntry>,
}

/// Entry with its depth in the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectableEntry<'a> {
    pub depth: usize,
    pub name: &'a str,
    pub url: &'a str,
}

impl SlideEntry {
    pub fn leaf(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: Some(url.into()),
            children: Vec::new(),
        }
    }

    pub fn folder(name: impl Into<String>, children: Vec<SlideEntry>) -> Self {
        Self {
            name: name.into(),
            url: None,
            children,
        }
    }

    fn collect_selectable<'a>(&'a self, depth: usize, out: &mut Vec<SelectableEntry<'a>>) {
        if let Some(url) = &self.url {
            out.push(SelectableEntry {
                depth,
                name: &self.name,
                url,
            });
        }
        for child in &self.children {
            child.collect_selectable(depth + 1, out);
        }
    }

    fn find(&self, url: &str) -> Option<&SlideEntry> {
        if self.url.as_deref() == Some(url) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(url))
    }
}

/// Read-only slide properties, kept in the order the server sent them
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Properties(IndexMap<String, String>);

impl Properties {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rows as `(key, value)` pairs for display
    pub fn rows(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
