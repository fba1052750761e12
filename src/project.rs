//! Project files - the persisted sheet configuration
//!
//! A project records the ordered input images, the output location, the
//! column count and whether to emit metadata. It is stored as XML with
//! stable element names:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <Spritesheet>
//!   <InputPaths>
//!     <string>art/idle.png</string>
//!     <string>art/run.png</string>
//!   </InputPaths>
//!   <OutputDirectory>build</OutputDirectory>
//!   <OutputFile>SpriteSheet.png</OutputFile>
//!   <Columns>4</Columns>
//!   <IncludeMetaData>true</IncludeMetaData>
//! </Spritesheet>
//! ```
//!
//! Unknown attributes on the root (such as `xmlns:xsi`) are ignored when
//! loading, and missing elements take their default values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::SpritegenConfig;
use crate::generate::{generate, GenerateError, GenerateReport};
use crate::output::{write_atomic, OutputError};

/// Default output file name for new projects
pub const DEFAULT_OUTPUT_FILE: &str = "SpriteSheet.png";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Project file error
#[derive(Debug, Error)]
pub enum ProjectError {
    /// File I/O error
    #[error("Failed to access project file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed or unserializable XML
    #[error("Invalid project XML in '{}': {message}", path.display())]
    Xml { path: PathBuf, message: String },
}

/// Sheet configuration as persisted in a project file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpritesheetProject {
    /// Source images, in sheet order
    pub input_paths: Vec<PathBuf>,
    pub output_directory: PathBuf,
    pub output_file: String,
    /// Column count. Kept signed so that bad values survive a round trip
    /// and are rejected at generation time.
    pub columns: i32,
    pub include_metadata: bool,
}

/// XML wire shape. Element names must not change between versions.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "Spritesheet")]
struct ProjectXml {
    #[serde(rename = "InputPaths", default)]
    input_paths: InputPathsXml,
    #[serde(rename = "OutputDirectory", default)]
    output_directory: String,
    #[serde(rename = "OutputFile", default)]
    output_file: String,
    #[serde(rename = "Columns", default)]
    columns: i32,
    #[serde(rename = "IncludeMetaData", default)]
    include_metadata: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct InputPathsXml {
    #[serde(rename = "string", default)]
    items: Vec<String>,
}

impl From<ProjectXml> for SpritesheetProject {
    fn from(xml: ProjectXml) -> Self {
        Self {
            input_paths: xml.input_paths.items.into_iter().map(PathBuf::from).collect(),
            output_directory: PathBuf::from(xml.output_directory),
            output_file: xml.output_file,
            columns: xml.columns,
            include_metadata: xml.include_metadata,
        }
    }
}

impl From<&SpritesheetProject> for ProjectXml {
    fn from(project: &SpritesheetProject) -> Self {
        Self {
            input_paths: InputPathsXml {
                items: project.input_paths.iter().map(|p| p.display().to_string()).collect(),
            },
            output_directory: project.output_directory.display().to_string(),
            output_file: project.output_file.clone(),
            columns: project.columns,
            include_metadata: project.include_metadata,
        }
    }
}

impl SpritesheetProject {
    /// An empty project with a single column.
    pub fn new() -> Self {
        Self { columns: 1, ..Default::default() }
    }

    /// Append an input unless it is already listed. Returns whether it was added.
    pub fn add_input(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.input_paths.contains(&path) {
            return false;
        }
        self.input_paths.push(path);
        true
    }

    /// Remove an input. Returns whether it was present.
    pub fn remove_input(&mut self, path: &Path) -> bool {
        let before = self.input_paths.len();
        self.input_paths.retain(|p| p != path);
        self.input_paths.len() != before
    }

    /// Reset every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when there is nothing worth saving (no inputs, no output directory).
    pub fn is_empty(&self) -> bool {
        self.input_paths.is_empty() && self.output_directory.as_os_str().is_empty()
    }

    /// Full path of the sheet image.
    pub fn output_path(&self) -> PathBuf {
        self.output_directory.join(&self.output_file)
    }

    /// Parse a project from XML text.
    pub fn from_xml(xml: &str) -> Result<Self, quick_xml::DeError> {
        let xml = xml.trim_start_matches('\u{feff}');
        let wire: ProjectXml = quick_xml::de::from_str(xml)?;
        Ok(wire.into())
    }

    /// Render the project as indented XML with a declaration.
    pub fn to_xml(&self) -> Result<String, quick_xml::DeError> {
        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 2);
        ProjectXml::from(self).serialize(serializer)?;

        Ok(format!("{}\n{}\n", XML_DECLARATION, body))
    }

    /// Load a project file.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| ProjectError::Io { path: path.to_path_buf(), source })?;
        let project = Self::from_xml(&contents).map_err(|e| ProjectError::Xml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::debug!("Loaded project {} ({} inputs)", path.display(), project.input_paths.len());
        Ok(project)
    }

    /// Save the project atomically, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let xml = self.to_xml().map_err(|e| ProjectError::Xml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        write_atomic(path, xml.as_bytes()).map_err(|e| match e {
            OutputError::Io(source) => ProjectError::Io { path: path.to_path_buf(), source },
            other => ProjectError::Xml { path: path.to_path_buf(), message: other.to_string() },
        })?;
        log::debug!("Saved project {}", path.display());
        Ok(())
    }

    /// Generate the sheet this project describes.
    pub fn generate(
        &self,
        overwrite: bool,
        config: &SpritegenConfig,
    ) -> Result<GenerateReport, GenerateError> {
        generate(
            &self.input_paths,
            &self.output_directory,
            &self.output_file,
            i64::from(self.columns),
            self.include_metadata,
            overwrite,
            config,
        )
    }
}
