use crate::directories::ContentCategory;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::PathBuf;

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateInfo {
    pub exists: bool,
    pub populated_categories: Vec<ContentCategory>,
}

#[async_trait]
pub trait TemplateProvider: Send + Sync {
    async fn active_template(&self) -> Result<TemplateInfo>;
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    #[serde(rename = "type")]
    kind: String,
}

/// Reads the default content `index.json` shipped with the chat server.
#[derive(Debug, Clone)]
pub struct IndexTemplate {
    dir: PathBuf,
}

impl IndexTemplate {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl TemplateProvider for IndexTemplate {
    async fn active_template(&self) -> Result<TemplateInfo> {
        let path = self.dir.join(INDEX_FILE);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no active template");
                return Ok(TemplateInfo::default());
            }
            Err(e) => return Err(e.into()),
        };

        let entries: Vec<IndexEntry> = serde_json::from_slice(&content)?;
        let mut populated: Vec<ContentCategory> = entries
            .iter()
            .filter_map(|entry| ContentCategory::from_template_type(&entry.kind))
            .collect();
        populated.sort();
        populated.dedup();

        Ok(TemplateInfo {
            exists: true,
            populated_categories: populated,
        })
    }
}
