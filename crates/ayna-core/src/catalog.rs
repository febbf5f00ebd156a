//! Channel lists: extraction from category dumps, flat channel files and
//! merging with de-duplication.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::models::{CategoriesResponse, Channel};

/// Every channel listed under a category, in listing order. The category
/// title becomes the channel's category unless it already carries one.
pub fn channels_from_categories(response: &CategoriesResponse) -> Vec<Channel> {
    response
        .content
        .data
        .iter()
        .filter_map(|category| category.items.as_ref().map(|items| (category, items)))
        .flat_map(|(category, items)| {
            items.data.iter().map(move |channel| {
                let mut channel = channel.clone();
                if channel.category.is_none() {
                    channel.category = category.title.clone();
                }
                channel
            })
        })
        .collect()
}

/// Read a saved categories response (as written by `save_raw`)
pub fn load_categories_file(path: &Path) -> Result<CategoriesResponse> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse categories in {}", path.display()))
}

/// Read a flat JSON array of channels. Unreadable files yield no channels.
pub fn load_channel_file(path: &Path) -> Vec<Channel> {
    match read_channels(path) {
        Ok(channels) => {
            info!(file = %path.display(), channels = channels.len(), "Loaded channel file");
            channels
        }
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Failed to load channel file");
            Vec::new()
        }
    }
}

fn read_channels(path: &Path) -> Result<Vec<Channel>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Concatenate channel lists keeping only the first channel seen per id
pub fn merge_unique<I>(lists: I) -> Vec<Channel>
where
    I: IntoIterator<Item = Vec<Channel>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for channel in lists.into_iter().flatten() {
        if seen.insert(channel.id.clone()) {
            merged.push(channel);
        }
    }
    merged
}

/// Pretty-print a raw API response to disk
pub fn save_raw(path: &Path, value: &serde_json::Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: &str, title: &str) -> Channel {
        Channel {
            id: id.to_string(),
            title: title.to_string(),
            logo: String::new(),
            category: None,
        }
    }

    #[test]
    fn test_channels_from_categories() {
        let json = r#"{"content":{"data":[
            {"title":"Sports","items":{"data":[
                {"id":"s1","title":"Sport One","image":"a"},
                {"id":"s2","title":"Sport Two","image":"b","category":"Cricket"}
            ]}},
            {"title":"Promo"},
            {"items":{"data":[{"id":"n1","title":"News","image":"c"}]}}
        ]}}"#;
        let response: CategoriesResponse = serde_json::from_str(json).expect("parse");
        let channels = channels_from_categories(&response);

        let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "n1"]);
        assert_eq!(channels[0].category.as_deref(), Some("Sports"));
        assert_eq!(channels[1].category.as_deref(), Some("Cricket"));
        assert_eq!(channels[2].category, None);
    }

    #[test]
    fn test_merge_unique_keeps_first_occurrence() {
        let merged = merge_unique(vec![
            vec![channel("a", "First A"), channel("b", "B")],
            vec![channel("a", "Second A"), channel("c", "C")],
        ]);
        let titles: Vec<&str> = merged.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["First A", "B", "C"]);
    }

    #[test]
    fn test_load_channel_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("channels.json");
        std::fs::write(
            &path,
            r#"[{"id":"x","title":"X","image":"https://img/x.png","category":"Music"}]"#,
        )
        .expect("write");

        let channels = load_channel_file(&path);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].logo, "https://img/x.png");
    }

    #[test]
    fn test_missing_or_bad_channel_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_channel_file(&dir.path().join("absent.json")).is_empty());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{}").expect("write");
        assert!(load_channel_file(&bad).is_empty());
    }

    #[test]
    fn test_save_raw_then_load_categories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.json");
        let value = serde_json::json!({
            "content": {"data": [{
                "title": "Live",
                "items": {"data": [{"id": "l1", "title": "L", "image": "i"}]}
            }]}
        });
        save_raw(&path, &value).expect("save");

        let response = load_categories_file(&path).expect("load");
        assert_eq!(channels_from_categories(&response).len(), 1);
    }
}
