//! Project export: JSON document, script text, image archive and full backup.
//!
//! Exports are written synchronously; async callers should run them on a
//! blocking thread.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::CoreError;
use crate::model::StoryboardProject;
use crate::text::sanitize_file_stem;

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Txt,
    Zip,
    Full,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Txt => "txt",
            Self::Zip => "zip",
            Self::Full => "full",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "txt" => Ok(Self::Txt),
            "zip" => Ok(Self::Zip),
            "full" => Ok(Self::Full),
            other => Err(CoreError::Validation(format!(
                "unknown export format '{other}', expected json, txt, zip or full"
            ))),
        }
    }

    fn file_name(self, stem: &str, timestamp: &str) -> String {
        match self {
            Self::Json => format!("{stem}_{timestamp}.json"),
            Self::Txt => format!("{stem}_script_{timestamp}.txt"),
            Self::Zip => format!("{stem}_{timestamp}.zip"),
            Self::Full => format!("{stem}_backup_{timestamp}.zip"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub file_name: String,
    /// Archive members written; 1 for the single-file formats.
    pub entries: usize,
}

/// Export `project` into `exports_dir`, creating the directory if needed.
pub fn export_project(
    project: &StoryboardProject,
    format: ExportFormat,
    exports_dir: &Path,
) -> Result<ExportOutcome, CoreError> {
    std::fs::create_dir_all(exports_dir)?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let file_name = format.file_name(&sanitize_file_stem(&project.name), &timestamp);
    let path = exports_dir.join(&file_name);

    let entries = match format {
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(&project.to_document())?;
            std::fs::write(&path, json)?;
            1
        }
        ExportFormat::Txt => {
            std::fs::write(&path, script_text(project))?;
            1
        }
        ExportFormat::Zip => write_archive(&path, |zip| add_shot_images(zip, project, "shots"))?,
        ExportFormat::Full => write_archive(&path, |zip| {
            let json = serde_json::to_string_pretty(&project.to_document())?;
            zip.start_file("project.json", SimpleFileOptions::default())?;
            zip.write_all(json.as_bytes())?;
            let images = add_shot_images(zip, project, "outputs")?;
            let references = add_character_references(zip, project)?;
            Ok(1 + images + references)
        })?,
    };

    tracing::info!(
        project = %project.name,
        format = format.as_str(),
        path = %path.display(),
        entries,
        "Project exported"
    );
    Ok(ExportOutcome {
        format,
        path,
        file_name,
        entries,
    })
}

/// Plain-text storyboard script listing characters, scenes and shots.
pub fn script_text(project: &StoryboardProject) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        format!("Storyboard script: {}", project.name),
        format!("Aspect ratio: {}", project.aspect_ratio.as_str()),
        String::new(),
        rule.clone(),
        "Characters:".to_string(),
        rule.clone(),
    ];
    lines.extend(
        project
            .characters
            .iter()
            .map(|c| format!("  - {}: {}", c.name, c.description)),
    );

    lines.extend([String::new(), rule.clone(), "Scenes:".to_string(), rule.clone()]);
    lines.extend(
        project
            .scenes
            .iter()
            .map(|s| format!("  - {}: {}", s.name, s.description)),
    );

    lines.extend([
        String::new(),
        rule.clone(),
        "Shots:".to_string(),
        rule,
        String::new(),
    ]);
    for shot in &project.shots {
        let names: Vec<&str> = project.characters_in(shot).map(|c| c.name.as_str()).collect();
        let scene = project.scene_of(shot).map(|s| s.name.as_str()).unwrap_or_default();
        let characters = if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        };
        lines.extend([
            format!("Shot {}", shot.shot_number),
            format!("  Type: {}", shot.template.definition().name),
            format!("  Scene: {scene}"),
            format!("  Characters: {characters}"),
            format!("  Description: {}", shot.description),
            String::new(),
        ]);
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Archives
// ---------------------------------------------------------------------------

fn write_archive<F>(path: &Path, fill: F) -> Result<usize, CoreError>
where
    F: FnOnce(&mut ZipWriter<File>) -> Result<usize, CoreError>,
{
    let mut zip = ZipWriter::new(File::create(path)?);
    let entries = fill(&mut zip)?;
    zip.finish()?;
    Ok(entries)
}

fn add_file(zip: &mut ZipWriter<File>, source: &str, name: &str) -> Result<bool, CoreError> {
    if source.is_empty() || !Path::new(source).is_file() {
        if !source.is_empty() {
            tracing::warn!(path = source, "Export skipped missing file");
        }
        return Ok(false);
    }
    let bytes = std::fs::read(source)?;
    zip.start_file(name, SimpleFileOptions::default())?;
    zip.write_all(&bytes)?;
    Ok(true)
}

fn add_shot_images(
    zip: &mut ZipWriter<File>,
    project: &StoryboardProject,
    folder: &str,
) -> Result<usize, CoreError> {
    let mut count = 0;
    for shot in &project.shots {
        let name = format!("{folder}/shot_{:02}.png", shot.shot_number);
        if add_file(zip, &shot.output_image, &name)? {
            count += 1;
        }
    }
    Ok(count)
}

fn add_character_references(
    zip: &mut ZipWriter<File>,
    project: &StoryboardProject,
) -> Result<usize, CoreError> {
    let mut count = 0;
    for character in &project.characters {
        let stem = sanitize_file_stem(&character.name);
        for (i, source) in character.ref_images.iter().enumerate() {
            let name = format!("references/characters/{stem}_{i}.png");
            if add_file(zip, source, &name)? {
                count += 1;
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::stories::load_example;

    fn archive_names(path: &Path) -> Vec<String> {
        let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    // -- formats --

    #[test]
    fn format_parse_is_case_insensitive_and_strict() {
        assert_eq!(ExportFormat::parse("ZIP").unwrap(), ExportFormat::Zip);
        assert_matches!(ExportFormat::parse("pdf"), Err(CoreError::Validation(_)));
    }

    // -- script --

    #[test]
    fn script_lists_characters_scenes_and_shots() {
        let project = load_example("Family Morning").unwrap();
        let script = script_text(&project);
        assert!(script.starts_with("Storyboard script: Family Morning\nAspect ratio: 16:9\n"));
        assert!(script.contains("  - Mom: 38, gentle and caring"));
        assert!(script.contains("Shot 2\n  Type: "));
        assert!(script.contains("  Characters: Mom, Mei\n"));
        assert!(script.contains("  Scene: Dining Room\n"));
        assert_eq!(script.matches(&"=".repeat(RULE_WIDTH)).count(), 6);
    }

    #[test]
    fn script_marks_shots_without_characters() {
        let project = load_example("City Chase").unwrap();
        assert!(script_text(&project).contains("Shot 1\n  Type: "));
        assert!(script_text(&project).contains("  Characters: none\n"));
    }

    // -- files --

    #[test]
    fn json_and_txt_exports_use_timestamped_names() {
        let dir = tempfile::tempdir().unwrap();
        let project = load_example("Coffee Shop").unwrap();

        let json = export_project(&project, ExportFormat::Json, dir.path()).unwrap();
        assert!(json.file_name.starts_with("Coffee Shop_"));
        assert!(json.file_name.ends_with(".json"));
        let document: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json.path).unwrap()).unwrap();
        assert_eq!(document["project_meta"]["name"], "Coffee Shop");

        let txt = export_project(&project, ExportFormat::Txt, dir.path()).unwrap();
        assert!(txt.file_name.starts_with("Coffee Shop_script_"));
    }

    #[test]
    fn archives_include_only_existing_images() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.png");
        let reference = dir.path().join("ref.png");
        std::fs::write(&out, b"png").unwrap();
        std::fs::write(&reference, b"png").unwrap();

        let mut project = load_example("Family Morning").unwrap();
        project.shots[2].mark_completed(out.to_string_lossy().into_owned(), 0.9);
        project.shots[3].mark_completed("/nonexistent/shot.png".into(), 0.9);
        project.characters[0].ref_images = vec![
            "/nonexistent/ref.png".into(),
            reference.to_string_lossy().into_owned(),
        ];

        let exports = dir.path().join("exports");
        let zip = export_project(&project, ExportFormat::Zip, &exports).unwrap();
        assert_eq!(zip.entries, 1);
        assert_eq!(archive_names(&zip.path), vec!["shots/shot_03.png"]);

        let full = export_project(&project, ExportFormat::Full, &exports).unwrap();
        assert!(full.file_name.contains("_backup_"));
        assert_eq!(
            archive_names(&full.path),
            vec!["outputs/shot_03.png", "project.json", "references/characters/Mom_1.png"]
        );
        assert_eq!(full.entries, 3);
    }
}
