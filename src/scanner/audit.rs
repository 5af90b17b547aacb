//! Decides whether a user's content is nothing more than the template
//! baseline.
//!
//! Every ambiguous case (unexpected file types, unreadable entries, missing
//! baseline) resolves to "has extra content". Files are compared by
//! relative path and size only.

use crate::directories::{BaselineDirectorySet, ContentCategory, UserDirectorySet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const NOISE_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAudit {
    pub has_extra: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<PathBuf>,
}

impl CategoryAudit {
    fn clean() -> Self {
        Self::default()
    }

    fn extra(example: Option<PathBuf>) -> Self {
        Self {
            has_extra: true,
            example,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub is_unused: bool,
    pub details: BTreeMap<ContentCategory, CategoryAudit>,
}

impl AuditResult {
    /// First category in checklist order that holds extra content.
    pub fn first_offending(&self) -> Option<(ContentCategory, &CategoryAudit)> {
        ContentCategory::AUDITED.iter().find_map(|category| {
            self.details
                .get(category)
                .filter(|audit| audit.has_extra)
                .map(|audit| (*category, audit))
        })
    }
}

pub fn audit(user: &UserDirectorySet, baseline: &BaselineDirectorySet) -> AuditResult {
    let mut details = BTreeMap::new();

    for category in ContentCategory::AUDITED {
        let result = match user.get(category) {
            Some(dir) => audit_category(dir, baseline.get(category)),
            None => CategoryAudit::extra(None),
        };

        if result.has_extra {
            tracing::debug!(
                root = %user.root().display(),
                %category,
                example = ?result.example,
                "extra content found"
            );
        }
        details.insert(category, result);
    }

    let is_unused = details.values().all(|d| !d.has_extra);
    AuditResult { is_unused, details }
}

fn audit_category(dir: &Path, baseline: Option<&Path>) -> CategoryAudit {
    match find_extra(dir, baseline) {
        Ok(None) => CategoryAudit::clean(),
        Ok(Some(example)) => CategoryAudit::extra(Some(example)),
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "audit failed, assuming content");
            CategoryAudit::extra(None)
        }
    }
}

fn is_noise(name: &str) -> bool {
    NOISE_FILES.contains(&name)
}

/// Walks `dir` with an explicit stack and returns the first entry, relative
/// to `dir`, that the baseline does not account for.
fn find_extra(dir: &Path, baseline: Option<&Path>) -> io::Result<Option<PathBuf>> {
    let metadata = match fs::symlink_metadata(dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    if !metadata.is_dir() {
        return Ok(Some(PathBuf::from(".")));
    }

    let mut pending = vec![PathBuf::new()];

    while let Some(relative_dir) = pending.pop() {
        let mut entries = fs::read_dir(dir.join(&relative_dir))?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut subdirs = Vec::new();
        for entry in entries {
            let name = entry.file_name();
            if is_noise(&name.to_string_lossy()) {
                continue;
            }

            let relative = relative_dir.join(&name);
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                subdirs.push(relative);
                continue;
            }

            if !file_type.is_file() {
                return Ok(Some(relative));
            }

            let Some(baseline) = baseline else {
                return Ok(Some(relative));
            };

            let size = entry.metadata()?.len();
            match fs::symlink_metadata(baseline.join(&relative)) {
                Ok(expected) if expected.is_file() && expected.len() == size => {}
                Ok(_) => return Ok(Some(relative)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Some(relative)),
                Err(e) => return Err(e),
            }
        }

        pending.extend(subdirs.into_iter().rev());
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directories::DirectoryResolver;
    use crate::model::Handle;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        resolver: DirectoryResolver,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let resolver = DirectoryResolver::new(dir.path());
            Self {
                _dir: dir,
                resolver,
            }
        }

        fn write(&self, handle: &str, relative: &str, size: usize) {
            let path = self.resolver.data_root().join(handle).join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, vec![b'x'; size]).unwrap();
        }

        fn user(&self, handle: &str) -> UserDirectorySet {
            self.resolver
                .directories_for(&Handle::parse(handle).unwrap())
                .unwrap()
        }

        fn baseline(&self, populated: &[ContentCategory]) -> BaselineDirectorySet {
            BaselineDirectorySet::from_template(self.user("default-user"), populated)
        }
    }

    #[test]
    fn test_empty_user_is_unused() {
        let fx = Fixture::new();
        let result = audit(&fx.user("nobody"), &BaselineDirectorySet::empty());
        assert!(result.is_unused);
        assert_eq!(result.details.len(), ContentCategory::AUDITED.len());
        assert!(result.first_offending().is_none());
    }

    #[test]
    fn test_chat_file_without_baseline_is_extra() {
        let fx = Fixture::new();
        fx.write("alice", "chats/Seraphina/2024-01-01.jsonl", 120);

        let result = audit(&fx.user("alice"), &fx.baseline(&[ContentCategory::Instruct]));

        assert!(!result.is_unused);
        let chats = &result.details[&ContentCategory::Chats];
        assert!(chats.has_extra);
        assert_eq!(
            chats.example.as_deref(),
            Some(Path::new("Seraphina/2024-01-01.jsonl"))
        );
        assert!(!result.details[&ContentCategory::Instruct].has_extra);
    }

    #[test]
    fn test_identical_preset_is_unused() {
        let fx = Fixture::new();
        fx.write("default-user", "instruct/preset.json", 64);
        fx.write("bob", "instruct/preset.json", 64);

        let result = audit(&fx.user("bob"), &fx.baseline(&[ContentCategory::Instruct]));
        assert!(result.is_unused);
    }

    #[test]
    fn test_size_mismatch_is_extra() {
        let fx = Fixture::new();
        fx.write("default-user", "instruct/preset.json", 64);
        fx.write("bob", "instruct/preset.json", 65);

        let result = audit(&fx.user("bob"), &fx.baseline(&[ContentCategory::Instruct]));
        assert!(!result.is_unused);
        assert_eq!(
            result.first_offending().map(|(c, _)| c),
            Some(ContentCategory::Instruct)
        );
    }

    #[test]
    fn test_same_size_edit_is_accepted() {
        let fx = Fixture::new();
        fx.write("default-user", "instruct/preset.json", 64);
        let edited = fx.resolver.data_root().join("bob/instruct/preset.json");
        fs::create_dir_all(edited.parent().unwrap()).unwrap();
        fs::write(&edited, vec![b'y'; 64]).unwrap();

        let result = audit(&fx.user("bob"), &fx.baseline(&[ContentCategory::Instruct]));
        assert!(result.is_unused);
    }

    #[test]
    fn test_category_not_in_template_has_no_baseline() {
        let fx = Fixture::new();
        fx.write("default-user", "context/ChatML.json", 10);
        fx.write("bob", "context/ChatML.json", 10);

        // The template user has the file, but the active template does not
        // ship that category, so nothing there is expected.
        let result = audit(&fx.user("bob"), &fx.baseline(&[ContentCategory::Instruct]));
        assert!(result.details[&ContentCategory::Context].has_extra);
    }

    #[test]
    fn test_noise_files_are_ignored() {
        let fx = Fixture::new();
        fx.write("bob", "chats/.DS_Store", 10);
        fx.write("bob", "characters/Thumbs.db", 10);
        fx.write("bob", "worlds/nested/desktop.ini", 10);

        let result = audit(&fx.user("bob"), &BaselineDirectorySet::empty());
        assert!(result.is_unused);
    }

    #[test]
    fn test_first_offending_follows_checklist_order() {
        let fx = Fixture::new();
        fx.write("bob", "worlds/lore.json", 10);
        fx.write("bob", "characters/card.png", 10);
        fx.write("bob", "QuickReplies/qr.json", 10);

        let result = audit(&fx.user("bob"), &BaselineDirectorySet::empty());
        let (category, details) = result.first_offending().unwrap();
        assert_eq!(category, ContentCategory::Characters);
        assert_eq!(details.example.as_deref(), Some(Path::new("card.png")));
    }

    #[test]
    fn test_traversal_reports_first_entry_in_name_order() {
        let fx = Fixture::new();
        fx.write("bob", "chats/b/second.jsonl", 1);
        fx.write("bob", "chats/a/first.jsonl", 1);

        let result = audit(&fx.user("bob"), &BaselineDirectorySet::empty());
        assert_eq!(
            result.details[&ContentCategory::Chats].example.as_deref(),
            Some(Path::new("a/first.jsonl"))
        );
    }

    #[test]
    fn test_deep_tree_does_not_overflow() {
        let fx = Fixture::new();
        let mut relative = String::from("chats");
        for _ in 0..200 {
            relative.push_str("/d");
        }
        relative.push_str("/leaf.txt");
        fx.write("bob", &relative, 1);

        let result = audit(&fx.user("bob"), &BaselineDirectorySet::empty());
        assert!(result.details[&ContentCategory::Chats].has_extra);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_always_extra() {
        let fx = Fixture::new();
        fx.write("default-user", "instruct/preset.json", 64);
        fx.write("bob", "instruct/real.json", 0);
        let link = fx.resolver.data_root().join("bob/instruct/preset.json");
        std::os::unix::fs::symlink(
            fx.resolver.data_root().join("default-user/instruct/preset.json"),
            &link,
        )
        .unwrap();

        let result = audit(&fx.user("bob"), &fx.baseline(&[ContentCategory::Instruct]));
        let instruct = &result.details[&ContentCategory::Instruct];
        assert!(instruct.has_extra);
        assert_eq!(instruct.example.as_deref(), Some(Path::new("preset.json")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_extra() {
        let fx = Fixture::new();
        let outside = TempDir::new().unwrap();
        fs::create_dir_all(fx.resolver.data_root().join("bob/chats")).unwrap();
        std::os::unix::fs::symlink(
            outside.path(),
            fx.resolver.data_root().join("bob/chats/elsewhere"),
        )
        .unwrap();

        let result = audit(&fx.user("bob"), &BaselineDirectorySet::empty());
        assert!(result.details[&ContentCategory::Chats].has_extra);
    }

    #[cfg(unix)]
    #[test]
    fn test_category_root_symlink_is_extra() {
        let fx = Fixture::new();
        let outside = TempDir::new().unwrap();
        fs::create_dir_all(fx.resolver.data_root().join("bob")).unwrap();
        std::os::unix::fs::symlink(outside.path(), fx.resolver.data_root().join("bob/worlds"))
            .unwrap();

        let result = audit(&fx.user("bob"), &BaselineDirectorySet::empty());
        assert!(result.details[&ContentCategory::Worlds].has_extra);
    }

    #[test]
    fn test_unreadable_category_counts_as_extra() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.resolver.data_root()).unwrap();
        fs::write(fx.resolver.data_root().join("bob"), b"not a directory").unwrap();

        let result = audit(&fx.user("bob"), &BaselineDirectorySet::empty());

        assert!(!result.is_unused);
        for category in ContentCategory::AUDITED {
            let detail = &result.details[&category];
            assert!(detail.has_extra);
            assert_eq!(detail.example, None);
        }
    }
}
