use crate::error::{Error, Result};
use crate::model::Handle;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentCategory {
    Chats,
    GroupChats,
    Characters,
    Worlds,
    Groups,
    Files,
    ComfyWorkflows,
    UserImages,
    Instruct,
    Context,
    Sysprompt,
    Reasoning,
    QuickReplies,
    OpenAiSettings,
    KoboldAiSettings,
    NovelAiSettings,
    TextGenSettings,
    Avatars,
    Backgrounds,
    Themes,
    Thumbnails,
    Backups,
    Vectors,
    Extensions,
    Assets,
    MovingUi,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 26] = [
        ContentCategory::Chats,
        ContentCategory::GroupChats,
        ContentCategory::Characters,
        ContentCategory::Worlds,
        ContentCategory::Groups,
        ContentCategory::Files,
        ContentCategory::ComfyWorkflows,
        ContentCategory::UserImages,
        ContentCategory::Instruct,
        ContentCategory::Context,
        ContentCategory::Sysprompt,
        ContentCategory::Reasoning,
        ContentCategory::QuickReplies,
        ContentCategory::OpenAiSettings,
        ContentCategory::KoboldAiSettings,
        ContentCategory::NovelAiSettings,
        ContentCategory::TextGenSettings,
        ContentCategory::Avatars,
        ContentCategory::Backgrounds,
        ContentCategory::Themes,
        ContentCategory::Thumbnails,
        ContentCategory::Backups,
        ContentCategory::Vectors,
        ContentCategory::Extensions,
        ContentCategory::Assets,
        ContentCategory::MovingUi,
    ];

    /// Categories inspected by the usage audit, in checklist order.
    pub const AUDITED: [ContentCategory; 17] = [
        ContentCategory::Chats,
        ContentCategory::GroupChats,
        ContentCategory::Characters,
        ContentCategory::Worlds,
        ContentCategory::Groups,
        ContentCategory::Files,
        ContentCategory::ComfyWorkflows,
        ContentCategory::UserImages,
        ContentCategory::Instruct,
        ContentCategory::Context,
        ContentCategory::Sysprompt,
        ContentCategory::Reasoning,
        ContentCategory::QuickReplies,
        ContentCategory::OpenAiSettings,
        ContentCategory::KoboldAiSettings,
        ContentCategory::NovelAiSettings,
        ContentCategory::TextGenSettings,
    ];

    /// Location relative to the user's root directory.
    pub fn relative_path(&self) -> &'static str {
        match self {
            ContentCategory::Chats => "chats",
            ContentCategory::GroupChats => "group chats",
            ContentCategory::Characters => "characters",
            ContentCategory::Worlds => "worlds",
            ContentCategory::Groups => "groups",
            ContentCategory::Files => "user/files",
            ContentCategory::ComfyWorkflows => "user/workflows",
            ContentCategory::UserImages => "user/images",
            ContentCategory::Instruct => "instruct",
            ContentCategory::Context => "context",
            ContentCategory::Sysprompt => "sysprompt",
            ContentCategory::Reasoning => "reasoning",
            ContentCategory::QuickReplies => "QuickReplies",
            ContentCategory::OpenAiSettings => "OpenAI Settings",
            ContentCategory::KoboldAiSettings => "KoboldAI Settings",
            ContentCategory::NovelAiSettings => "NovelAI Settings",
            ContentCategory::TextGenSettings => "TextGen Settings",
            ContentCategory::Avatars => "User Avatars",
            ContentCategory::Backgrounds => "backgrounds",
            ContentCategory::Themes => "themes",
            ContentCategory::Thumbnails => "thumbnails",
            ContentCategory::Backups => "backups",
            ContentCategory::Vectors => "vectors",
            ContentCategory::Extensions => "extensions",
            ContentCategory::Assets => "assets",
            ContentCategory::MovingUi => "movingUI",
        }
    }

    /// Maps a template index entry type onto the category it populates.
    pub fn from_template_type(kind: &str) -> Option<Self> {
        let category = match kind {
            "character" => ContentCategory::Characters,
            "world" => ContentCategory::Worlds,
            "avatar" => ContentCategory::Avatars,
            "background" => ContentCategory::Backgrounds,
            "theme" => ContentCategory::Themes,
            "workflow" => ContentCategory::ComfyWorkflows,
            "instruct" => ContentCategory::Instruct,
            "context" => ContentCategory::Context,
            "sysprompt" => ContentCategory::Sysprompt,
            "reasoning" => ContentCategory::Reasoning,
            "quick_replies" => ContentCategory::QuickReplies,
            "openai_preset" => ContentCategory::OpenAiSettings,
            "kobold_preset" => ContentCategory::KoboldAiSettings,
            "novel_preset" => ContentCategory::NovelAiSettings,
            "textgen_preset" => ContentCategory::TextGenSettings,
            "moving_ui" => ContentCategory::MovingUi,
            _ => return None,
        };
        Some(category)
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.relative_path())
    }
}

/// Content directories of one user, keyed by category.
#[derive(Debug, Clone)]
pub struct UserDirectorySet {
    root: PathBuf,
    dirs: BTreeMap<ContentCategory, PathBuf>,
}

impl UserDirectorySet {
    fn new(root: PathBuf) -> Result<Self> {
        let mut dirs = BTreeMap::new();
        for category in ContentCategory::ALL {
            let relative = Path::new(category.relative_path());
            ensure_contained(&root, relative)?;
            dirs.insert(category, root.join(relative));
        }
        Ok(Self { root, dirs })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, category: ContentCategory) -> Option<&Path> {
        self.dirs.get(&category).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContentCategory, &Path)> {
        self.dirs.iter().map(|(c, p)| (*c, p.as_path()))
    }
}

fn ensure_contained(root: &Path, relative: &Path) -> Result<()> {
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Error::PathEscape {
            path: root.join(relative),
            root: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Template user directories restricted to the categories the active
/// template ships. Absent categories have no baseline at all.
#[derive(Debug, Clone, Default)]
pub struct BaselineDirectorySet {
    dirs: BTreeMap<ContentCategory, PathBuf>,
}

impl BaselineDirectorySet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_template(template: UserDirectorySet, populated: &[ContentCategory]) -> Self {
        let dirs = template
            .dirs
            .into_iter()
            .filter(|(category, _)| populated.contains(category))
            .collect();
        Self { dirs }
    }

    pub fn get(&self, category: ContentCategory) -> Option<&Path> {
        self.dirs.get(&category).map(PathBuf::as_path)
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    data_root: PathBuf,
}

impl DirectoryResolver {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn root_for(&self, handle: &Handle) -> PathBuf {
        self.data_root.join(handle.as_str())
    }

    /// Returns a fresh set on every call; callers may consume it freely.
    pub fn directories_for(&self, handle: &Handle) -> Result<UserDirectorySet> {
        UserDirectorySet::new(self.root_for(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_stay_under_user_root() {
        let resolver = DirectoryResolver::new("/srv/data");
        let handle = Handle::parse("alice").unwrap();
        let dirs = resolver.directories_for(&handle).unwrap();

        assert_eq!(dirs.root(), Path::new("/srv/data/alice"));
        for (_, path) in dirs.iter() {
            assert!(path.starts_with(dirs.root()));
        }
        assert_eq!(
            dirs.get(ContentCategory::Files),
            Some(Path::new("/srv/data/alice/user/files"))
        );
    }

    #[test]
    fn test_contained_check_rejects_parent_components() {
        let err = ensure_contained(Path::new("/srv/data/alice"), Path::new("../bob")).unwrap_err();
        assert!(matches!(err, Error::PathEscape { .. }));
        assert!(ensure_contained(Path::new("/srv"), Path::new("/etc")).is_err());
    }

    #[test]
    fn test_baseline_keeps_only_populated_categories() {
        let resolver = DirectoryResolver::new("/srv/data");
        let template = resolver
            .directories_for(&Handle::parse("default-user").unwrap())
            .unwrap();

        let baseline = BaselineDirectorySet::from_template(
            template,
            &[ContentCategory::Instruct, ContentCategory::Characters],
        );

        assert!(baseline.get(ContentCategory::Chats).is_none());
        assert_eq!(
            baseline.get(ContentCategory::Instruct),
            Some(Path::new("/srv/data/default-user/instruct"))
        );
        assert!(baseline.get(ContentCategory::Characters).is_some());
    }

    #[test]
    fn test_every_audited_category_is_known() {
        for category in ContentCategory::AUDITED {
            assert!(ContentCategory::ALL.contains(&category));
        }
        assert_eq!(
            ContentCategory::from_template_type("quick_replies"),
            Some(ContentCategory::QuickReplies)
        );
        assert_eq!(ContentCategory::from_template_type("sprite"), None);
    }
}
