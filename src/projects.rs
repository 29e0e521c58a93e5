//! Local project store.
//!
//! Projects are the user's saved agent drafts. They live on this machine
//! only, as one JSON array in a single file, rewritten whole on every
//! change.
//!
//! # Example
//!
//! ```ignore
//! use libaigents::projects::{NewProject, ProjectStore};
//!
//! let mut store = ProjectStore::open_default()?;
//! let project = store.create(NewProject::new("Support bot", "Answers tickets"))?;
//! println!("{} saved on {}", project.id, project.last_modified);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Format of [`Project::last_modified`].
pub const DATE_FORMAT: &str = "%d/%m/%Y";

const ID_PREFIX: &str = "PRJ";

/// A saved project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// `PRJ` followed by a zero-padded sequence number, e.g. `PRJ007`.
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Image as a data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Day of the last change, `dd/mm/yyyy`.
    pub last_modified: String,
}

impl Project {
    /// The project shown when nothing has been saved yet.
    pub fn seed() -> Self {
        Self {
            id: format!("{ID_PREFIX}001"),
            name: "Agent Name".into(),
            description: "Brief description of the AI agent".into(),
            category: None,
            image: None,
            last_modified: "24/10/2025".into(),
        }
    }

    fn sequence(&self) -> Option<u32> {
        self.id.strip_prefix(ID_PREFIX)?.parse().ok()
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.id.to_lowercase().contains(needle)
    }
}

/// Input for [`ProjectStore::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl NewProject {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Changes for [`ProjectStore::update`]. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// The project collection, backed by one JSON file.
#[derive(Debug)]
pub struct ProjectStore {
    path: PathBuf,
    projects: Vec<Project>,
}

impl ProjectStore {
    /// Default location: `<data dir>/aigents/projects.json`.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::data_dir().ok_or_else(|| {
            Error::InvalidConfig("could not determine the user data directory".into())
        })?;
        Ok(base.join("aigents").join("projects.json"))
    }

    /// Open the store at [`default_path`](Self::default_path).
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open the store at `path`.
    ///
    /// A missing file is not an error: the store starts with the seed
    /// project and the file is written on the first change.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let projects = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| Error::json_parse(e, &text))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no project store yet, using seed");
                vec![Project::seed()]
            }
            Err(e) => return Err(Error::io(e)),
        };
        Ok(Self { path, projects })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All projects, oldest first.
    pub fn list(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Case-insensitive substring search over name, description and id.
    /// A blank query returns everything.
    pub fn search(&self, query: &str) -> Vec<&Project> {
        let needle = query.trim().to_lowercase();
        self.projects
            .iter()
            .filter(|p| needle.is_empty() || p.matches(&needle))
            .collect()
    }

    /// Add a project and save.
    ///
    /// Name and description are trimmed and must not be empty.
    pub fn create(&mut self, new: NewProject) -> Result<Project> {
        let name = required("name", &new.name)?;
        let description = required("description", &new.description)?;

        let project = Project {
            id: self.next_id(),
            name,
            description,
            category: new.category,
            image: new.image,
            last_modified: today(),
        };
        let mut projects = self.projects.clone();
        projects.push(project.clone());
        self.commit(projects)?;

        tracing::debug!(id = %project.id, "created project");
        Ok(project)
    }

    /// Apply `update` to the project `id`, stamp it with today's date and
    /// save.
    pub fn update(&mut self, id: &str, update: ProjectUpdate) -> Result<Project> {
        let name = update.name.as_deref().map(|n| required("name", n)).transpose()?;
        let description = update
            .description
            .as_deref()
            .map(|d| required("description", d))
            .transpose()?;

        let mut projects = self.projects.clone();
        let project = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::ProjectNotFound { id: id.to_string() })?;

        if let Some(name) = name {
            project.name = name;
        }
        if let Some(description) = description {
            project.description = description;
        }
        if let Some(category) = update.category {
            project.category = Some(category);
        }
        if let Some(image) = update.image {
            project.image = Some(image);
        }
        project.last_modified = today();

        let project = project.clone();
        self.commit(projects)?;
        Ok(project)
    }

    /// Remove the project `id` and save.
    pub fn delete(&mut self, id: &str) -> Result<Project> {
        let index = self
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::ProjectNotFound { id: id.to_string() })?;
        let mut projects = self.projects.clone();
        let removed = projects.remove(index);
        self.commit(projects)?;

        tracing::debug!(id, "deleted project");
        Ok(removed)
    }

    /// Delete the backing file and go back to the seed project.
    pub fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(e)),
        }
        self.projects = vec![Project::seed()];
        Ok(())
    }

    /// One past the highest existing sequence number.
    fn next_id(&self) -> String {
        let next = self
            .projects
            .iter()
            .filter_map(Project::sequence)
            .max()
            .unwrap_or(0)
            + 1;
        format!("{ID_PREFIX}{next:03}")
    }

    /// Write `projects` to the file, then adopt them. On error the store
    /// keeps its previous contents.
    fn commit(&mut self, projects: Vec<Project>) -> Result<()> {
        self.write(&projects)?;
        self.projects = projects;
        Ok(())
    }

    fn write(&self, projects: &[Project]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(projects)?;

        // Atomic replace
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("project {field} must not be empty")));
    }
    Ok(value.to_string())
}

fn today() -> String {
    chrono::Local::now().format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn store() -> (tempfile::TempDir, ProjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path().join("nested").join("projects.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_file_yields_seed() {
        let (_dir, store) = store();
        assert_eq!(store.list(), &[Project::seed()]);
        assert!(!store.path().exists());
    }

    #[test]
    fn create_assigns_next_id_and_persists() {
        let (_dir, mut store) = store();
        let project = store
            .create(NewProject::new("  Support bot ", "Answers tickets").category("support"))
            .unwrap();

        assert_eq!(project.id, "PRJ002");
        assert_eq!(project.name, "Support bot");
        assert_eq!(project.category.as_deref(), Some("support"));
        assert!(NaiveDate::parse_from_str(&project.last_modified, DATE_FORMAT).is_ok());

        let reopened = ProjectStore::open(store.path()).unwrap();
        assert_eq!(reopened.list().len(), 2);
        assert_eq!(reopened.get("PRJ002"), Some(&project));
    }

    #[test]
    fn next_id_follows_highest_after_delete() {
        let (_dir, mut store) = store();
        store.create(NewProject::new("a", "a")).unwrap();
        store.create(NewProject::new("b", "b")).unwrap();
        store.delete("PRJ002").unwrap();

        let project = store.create(NewProject::new("c", "c")).unwrap();
        assert_eq!(project.id, "PRJ004");
    }

    #[test]
    fn create_requires_name_and_description() {
        let (_dir, mut store) = store();
        let err = store.create(NewProject::new(" ", "desc")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        let err = store.create(NewProject::new("name", "")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn update_changes_fields_and_date() {
        let (_dir, mut store) = store();
        let updated = store
            .update(
                "PRJ001",
                ProjectUpdate {
                    description: Some("Now with tools".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Agent Name");
        assert_eq!(updated.description, "Now with tools");
        assert_eq!(updated.last_modified, today());
    }

    #[test]
    fn update_rejects_blank_name() {
        let (_dir, mut store) = store();
        let err = store
            .update(
                "PRJ001",
                ProjectUpdate {
                    name: Some("   ".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(store.get("PRJ001").unwrap().name, "Agent Name");
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (_dir, mut store) = store();
        assert!(matches!(
            store.delete("PRJ999"),
            Err(Error::ProjectNotFound { id }) if id == "PRJ999"
        ));
        assert!(matches!(
            store.update("PRJ999", ProjectUpdate::default()),
            Err(Error::ProjectNotFound { .. })
        ));
    }

    #[test]
    fn search_is_case_insensitive() {
        let (_dir, mut store) = store();
        store
            .create(NewProject::new("Support Bot", "Answers tickets"))
            .unwrap();
        store.create(NewProject::new("Writer", "Drafts posts")).unwrap();

        let hits: Vec<_> = store.search("TICKET").iter().map(|p| p.id.clone()).collect();
        assert_eq!(hits, vec!["PRJ002"]);
        assert_eq!(store.search("prj003").len(), 1);
        assert_eq!(store.search("  ").len(), 3);
        assert!(store.search("nothing").is_empty());
    }

    #[test]
    fn clear_restores_seed() {
        let (_dir, mut store) = store();
        store.create(NewProject::new("a", "b")).unwrap();
        assert!(store.path().exists());

        store.clear().unwrap();
        assert_eq!(store.list(), &[Project::seed()]);
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        let mut store = ProjectStore::open(blocker.join("projects.json")).unwrap();
        // A file where the parent directory should be
        fs::write(&blocker, "").unwrap();

        let before = store.list().to_vec();
        assert!(matches!(
            store.create(NewProject::new("a", "b")),
            Err(Error::Io(_))
        ));
        assert_eq!(store.list(), before.as_slice());

        let update = ProjectUpdate {
            name: Some("renamed".into()),
            ..Default::default()
        };
        assert!(store.update("PRJ001", update).is_err());
        assert_eq!(store.list(), before.as_slice());

        assert!(store.delete("PRJ001").is_err());
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            ProjectStore::open(&path),
            Err(Error::JsonParse { .. })
        ));
    }

    #[test]
    fn stored_json_uses_camel_case() {
        let json = serde_json::to_value(Project::seed()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "PRJ001",
                "name": "Agent Name",
                "description": "Brief description of the AI agent",
                "lastModified": "24/10/2025"
            })
        );
    }
}
