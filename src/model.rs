use std::path::{Path, PathBuf};

use crate::foundation::core::{ElementId, ViewKind};
use crate::foundation::error::{FamshotError, FamshotResult};

/// A component definition loaded into the workspace.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentDefinition {
    pub id: ElementId,
    pub name: String,
    pub source: PathBuf,
    pub variants: Vec<Variant>,
}

/// A named configuration (symbol) of a component definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    pub symbol: ElementId,
    pub name: String,
}

/// Source, generated-document and image directories of a run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PathSet {
    pub source: PathBuf,
    pub projects: PathBuf,
    pub images: PathBuf,
}

impl PathSet {
    pub fn new(
        source: impl Into<PathBuf>,
        projects: impl Into<PathBuf>,
        images: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            projects: projects.into(),
            images: images.into(),
        }
    }

    /// Generated documents must never land in the source library.
    pub fn validate(&self) -> FamshotResult<()> {
        if same_dir(&self.source, &self.projects) {
            return Err(FamshotError::validation(format!(
                "projects directory '{}' must differ from the source directory",
                self.projects.display()
            )));
        }
        Ok(())
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Raster formats the export pipeline can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Bmp,
    Tiff,
    Targa,
}

impl RasterFormat {
    /// Resolve a file extension (with or without the leading dot, any case).
    pub fn from_extension(ext: &str) -> FamshotResult<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "bmp" => Ok(Self::Bmp),
            "tif" | "tiff" => Ok(Self::Tiff),
            "tga" => Ok(Self::Targa),
            _ => Err(FamshotError::UnknownFormat(ext)),
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tiff => image::ImageFormat::Tiff,
            Self::Targa => image::ImageFormat::Tga,
        }
    }
}

/// Level of detail applied to the export view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Coarse,
    #[default]
    Medium,
    Fine,
}

/// Raster resolution class accepted by the host exporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Resolution(u32);

impl Resolution {
    pub const SUPPORTED_DPI: [u32; 4] = [72, 150, 300, 600];

    pub fn new(dpi: u32) -> FamshotResult<Self> {
        if !Self::SUPPORTED_DPI.contains(&dpi) {
            return Err(FamshotError::validation(format!(
                "unsupported resolution {dpi} dpi (expected one of {:?})",
                Self::SUPPORTED_DPI
            )));
        }
        Ok(Self(dpi))
    }

    pub fn dpi(self) -> u32 {
        self.0
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self(150)
    }
}

impl TryFrom<u32> for Resolution {
    type Error = FamshotError;

    fn try_from(dpi: u32) -> Result<Self, Self::Error> {
        Self::new(dpi)
    }
}

impl From<Resolution> for u32 {
    fn from(r: Resolution) -> Self {
        r.0
    }
}

/// Render settings for one run. Omitted entirely for a layout-only run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Host view scale denominator (`20` means 1:20).
    pub view_scale: u32,
    /// Side of the final square thumbnail in pixels.
    pub pixel_size: u32,
    pub resolution: Resolution,
    /// Output file extension, e.g. `png`.
    pub extension: String,
    /// Base zoom multiplied with the framing scale.
    pub zoom: f64,
    pub detail_level: DetailLevel,
    pub view: ViewKind,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            view_scale: 20,
            pixel_size: 256,
            resolution: Resolution::default(),
            extension: "png".to_string(),
            zoom: 1.0,
            detail_level: DetailLevel::default(),
            view: ViewKind::Isometric,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> FamshotResult<()> {
        self.format()?;
        if self.pixel_size == 0 {
            return Err(FamshotError::validation("pixel size must be non-zero"));
        }
        if self.view_scale == 0 {
            return Err(FamshotError::validation("view scale must be non-zero"));
        }
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(FamshotError::validation(
                "zoom must be a positive finite number",
            ));
        }
        Ok(())
    }

    pub fn format(&self) -> FamshotResult<RasterFormat> {
        RasterFormat::from_extension(&self.extension)
    }

    /// Normalized extension used for output files.
    pub fn file_extension(&self) -> String {
        self.extension.trim_start_matches('.').to_ascii_lowercase()
    }
}
