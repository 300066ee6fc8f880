//! JSON project store: one `{name}.json` document per project in a directory.

use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::model::{ProjectDocument, StoryboardProject};
use crate::text::sanitize_file_stem;

const EXTENSION: &str = "json";

/// Path a project with `name` is stored at inside `dir`.
pub fn project_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{EXTENSION}", sanitize_file_stem(name)))
}

/// Write the project's document, pretty-printed. Overwrites a previous save.
pub async fn save(dir: &Path, project: &StoryboardProject) -> Result<PathBuf, CoreError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = project_path(dir, &project.name);
    let json = serde_json::to_string_pretty(&project.to_document())?;
    tokio::fs::write(&path, json).await?;
    tracing::info!(project = %project.name, path = %path.display(), "Project saved");
    Ok(path)
}

/// Read a project document from `path`.
pub async fn load(path: &Path) -> Result<StoryboardProject, CoreError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoreError::not_found("project file", path.display()));
        }
        Err(e) => return Err(e.into()),
    };
    let document: ProjectDocument = serde_json::from_str(&text)?;
    let project = StoryboardProject::from_document(document);
    tracing::debug!(project = %project.name, path = %path.display(), "Project loaded");
    Ok(project)
}

/// Load the project stored under `name` in `dir`.
pub async fn load_by_name(dir: &Path, name: &str) -> Result<StoryboardProject, CoreError> {
    load(&project_path(dir, name)).await
}

/// File stems of the stored projects, sorted. A missing directory is empty.
pub async fn list(dir: &Path) -> Result<Vec<String>, CoreError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::stories::load_example;

    #[tokio::test]
    async fn save_then_load_restores_the_project() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = load_example("City Chase").unwrap();
        project.shots[0].mark_completed("/tmp/out.png".to_string(), 0.9);

        let path = save(dir.path(), &project).await.unwrap();
        assert_eq!(path, dir.path().join("City Chase.json"));

        let loaded = load(&path).await.unwrap();
        assert_eq!(loaded.name, project.name);
        assert_eq!(loaded.characters, project.characters);
        assert_eq!(loaded.shots.len(), 6);
        assert_eq!(loaded.completed_count(), 1);
    }

    #[tokio::test]
    async fn list_returns_sorted_json_stems_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Beta", "Alpha"] {
            let project = StoryboardProject {
                name: name.to_string(),
                ..Default::default()
            };
            save(dir.path(), &project).await.unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(list(dir.path()).await.unwrap(), vec!["Alpha", "Beta"]);
        assert!(list(&dir.path().join("absent")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_and_corrupt_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            load_by_name(dir.path(), "Nope").await,
            Err(CoreError::NotFound { entity: "project file", .. })
        );

        std::fs::write(dir.path().join("Bad.json"), "{not json").unwrap();
        assert_matches!(
            load_by_name(dir.path(), "Bad").await,
            Err(CoreError::Serialization(_))
        );
    }

    #[test]
    fn names_are_sanitised_into_the_directory() {
        let path = project_path(Path::new("/data/projects"), "../escape");
        assert_eq!(path, Path::new("/data/projects/_escape.json"));
    }
}
