//! JSON batch configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{FamshotError, FamshotResult};
use crate::host::TitleConvention;
use crate::host::memory::COMPONENT_EXTENSION;
use crate::lifecycle::{DEFAULT_NAME_PARAMETER, LifecycleOptions};
use crate::model::{PathSet, RenderSettings};

/// A complete batch description.
///
/// ```json
/// {
///   "paths": { "source": "lib", "projects": "out/projects", "images": "out/images" },
///   "render": { "pixel_size": 256, "view": "isometric", "extension": "png" },
///   "title_convention": "without-extension"
/// }
/// ```
///
/// Omitting `render` makes the run layout-only.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    pub paths: PathSet,
    #[serde(default)]
    pub render: Option<RenderSettings>,
    #[serde(default)]
    pub title_convention: TitleConvention,
    #[serde(default = "default_name_parameter")]
    pub name_parameter: String,
    #[serde(default = "default_component_extension")]
    pub component_extension: String,
}

fn default_name_parameter() -> String {
    DEFAULT_NAME_PARAMETER.to_string()
}

fn default_component_extension() -> String {
    COMPONENT_EXTENSION.to_string()
}

impl BatchConfig {
    pub fn new(paths: PathSet) -> Self {
        Self {
            paths,
            render: None,
            title_convention: TitleConvention::default(),
            name_parameter: default_name_parameter(),
            component_extension: default_component_extension(),
        }
    }

    pub fn from_json_file(path: &Path) -> FamshotResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        serde_json::from_reader(BufReader::new(f))
            .map_err(|e| FamshotError::serde(format!("parse config '{}': {e}", path.display())))
    }

    pub fn validate(&self) -> FamshotResult<()> {
        self.paths.validate()?;
        if let Some(render) = &self.render {
            render.validate()?;
        }
        if self.name_parameter.trim().is_empty() {
            return Err(FamshotError::validation("name_parameter must not be empty"));
        }
        if self.component_extension.trim_start_matches('.').is_empty() {
            return Err(FamshotError::validation(
                "component_extension must not be empty",
            ));
        }
        Ok(())
    }

    pub fn lifecycle_options(&self) -> LifecycleOptions {
        LifecycleOptions {
            paths: self.paths.clone(),
            name_parameter: self.name_parameter.clone(),
            title_convention: self.title_convention,
        }
    }
}
