use std::path::Path;

use anyhow::{Context, Result};

use crate::models::Channel;

const HEADER: &str = "#EXTM3U\n\n";

/// Extended M3U playlist accumulated in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    text: String,
    entries: usize,
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}

/// Quotes would end the attribute value early
fn attr(value: &str) -> String {
    value.replace('"', "'")
}

/// Titles follow the last comma of the EXTINF line and must stay on one line
fn title(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

impl Playlist {
    pub fn new() -> Self {
        Self {
            text: HEADER.to_string(),
            entries: 0,
        }
    }

    /// Playable entry with id, logo and group attributes
    pub fn push_channel(&mut self, channel: &Channel, group: &str, url: &str) {
        self.text.push_str(&format!(
            "#EXTINF:-1 tvg-id=\"{}\" tvg-logo=\"{}\" group-title=\"{}\",{}\n{}\n\n",
            attr(&channel.id),
            attr(&channel.logo),
            attr(group),
            title(&channel.title),
            url
        ));
        self.entries += 1;
    }

    /// Placeholder for a channel whose stream could not be resolved
    pub fn push_missing(&mut self, channel: &Channel) {
        self.text.push_str(&format!(
            "#EXTINF:-1,{} (NO URL)\n#\n\n",
            title(&channel.title)
        ));
        self.entries += 1;
    }

    /// Entry for a resolved stream that failed the link check
    pub fn push_dead(&mut self, channel: &Channel, url: &str) {
        self.text.push_str(&format!(
            "#EXTINF:-1 tvg-logo=\"{}\",{}\n{}\n\n",
            attr(&channel.logo),
            title(&channel.title),
            url
        ));
        self.entries += 1;
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &self.text)
            .with_context(|| format!("Failed to write playlist {}", path.display()))
    }
}
