//! Per-variant workspace lifecycle: sweep, place, save, render, clean up.
//!
//! One workspace is reused for a whole batch. Each variant starts with a sweep that removes
//! whatever earlier variants or components left behind, so a cleanup failure only costs a warning.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::export::render_and_crop;
use crate::foundation::core::{BoundingBox, ElementId, ViewKind};
use crate::foundation::error::{FamshotError, FamshotResult};
use crate::framing::frame_scale;
use crate::host::{TitleConvention, Workspace, ensure_view, transact};
use crate::model::{ComponentDefinition, PathSet, RenderSettings, Variant};
use crate::placement::{Placement, place};
use crate::sanitize::{is_valid_file_name, sanitize};

/// Type parameter consulted for artifact names unless configured otherwise.
pub const DEFAULT_NAME_PARAMETER: &str = "Type Mark";

/// Joins component and variant names when a variant has no identifying parameter.
pub const NAME_SEPARATOR: char = '&';

/// Run-wide inputs of [`process_variant`].
#[derive(Clone, Debug, PartialEq)]
pub struct LifecycleOptions {
    pub paths: PathSet,
    /// Type parameter whose value names the artifacts of a variant.
    pub name_parameter: String,
    pub title_convention: TitleConvention,
}

impl LifecycleOptions {
    pub fn new(paths: PathSet) -> Self {
        Self {
            paths,
            name_parameter: DEFAULT_NAME_PARAMETER.to_string(),
            title_convention: TitleConvention::default(),
        }
    }
}

/// Sanitized artifact name of `variant`.
///
/// Uses the value of `name_parameter` when the variant has a non-empty one, otherwise
/// `"<component>&<variant>"`.
pub fn resolve_artifact_name<W>(
    ws: &W,
    component: &ComponentDefinition,
    variant: &Variant,
    name_parameter: &str,
) -> String
where
    W: Workspace + ?Sized,
{
    let raw = ws
        .type_parameter(variant.symbol, name_parameter)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| format!("{}{NAME_SEPARATOR}{}", component.name, variant.name));
    sanitize(&raw)
}

/// Produce the document (and, with `settings`, the thumbnail) of one variant.
///
/// Returns the artifact name. `settings == None` is a layout-only run: the document is saved but
/// nothing is exported.
#[tracing::instrument(
    level = "info",
    skip_all,
    fields(component = %component.name, variant = %variant.name)
)]
pub fn process_variant<W>(
    ws: &mut W,
    component: &ComponentDefinition,
    variant: &Variant,
    settings: Option<&RenderSettings>,
    opts: &LifecycleOptions,
) -> FamshotResult<String>
where
    W: Workspace + ?Sized,
{
    sweep(ws, component, variant);

    let name = resolve_artifact_name(ws, component, variant, &opts.name_parameter);
    let mut placement = None;
    let result = place_and_produce(ws, &name, variant, settings, opts, &mut placement);

    cleanup(ws, placement.as_ref(), variant);

    match &result {
        Ok(()) => tracing::info!(artifact = %name, "variant done"),
        Err(e) => tracing::warn!(artifact = %name, error = %e, "variant failed"),
    }
    result.map(|()| name)
}

/// Delete a component definition once all its variants are processed.
pub fn finish_component<W>(ws: &mut W, component: &ComponentDefinition) -> FamshotResult<()>
where
    W: Workspace + ?Sized,
{
    transact(ws, "unload component", |ws| ws.delete(component.id))
}

/// Remove other components, instances of other variants and every wall.
fn sweep<W>(ws: &mut W, component: &ComponentDefinition, variant: &Variant)
where
    W: Workspace + ?Sized,
{
    let components = transact(ws, "sweep components", |ws| {
        for c in ws.components() {
            if c != component.id {
                ws.delete(c)?;
            }
        }
        Ok(())
    });
    if let Err(e) = components {
        tracing::warn!(error = %e, "sweeping stale components failed");
    }

    let instances = transact(ws, "sweep instances", |ws| {
        for i in ws.instances() {
            if i.symbol != variant.symbol {
                ws.delete(i.id)?;
            }
        }
        for w in ws.walls() {
            ws.delete(w)?;
        }
        Ok(())
    });
    if let Err(e) = instances {
        tracing::warn!(error = %e, "sweeping stale instances failed");
    }
}

/// Everything between sweep and cleanup. Whatever got placed is left in `placed`.
fn place_and_produce<W>(
    ws: &mut W,
    name: &str,
    variant: &Variant,
    settings: Option<&RenderSettings>,
    opts: &LifecycleOptions,
    placed: &mut Option<Placement>,
) -> FamshotResult<()>
where
    W: Workspace + ?Sized,
{
    // The name becomes both file stems; it must not reach outside the output roots.
    let document = document_path(ws, &opts.paths.projects, name);
    let contained = document
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_valid_file_name)
        && document.parent() == Some(opts.paths.projects.as_path());
    if !contained {
        return Err(FamshotError::InvalidName(name.to_string()));
    }

    let plan = ensure_view(ws, ViewKind::Plan)?;
    let placement: &Placement = placed.insert(place(ws, variant, plan)?);
    if let Placement::Failed { reason } = placement {
        return Err(FamshotError::placement(format!(
            "no strategy produced visible geometry: {reason}"
        )));
    }
    let hosts = placement.synthetic_hosts();

    save_document(ws, &document)?;

    let Some(settings) = settings else {
        return Ok(());
    };

    let view = ensure_view(ws, settings.view)?;
    transact(ws, "prepare export view", |ws| {
        ws.set_detail_level(view, settings.detail_level)?;
        ws.set_view_scale(view, settings.view_scale)?;
        if !hosts.is_empty() {
            ws.hide_in_view(view, &hosts)?;
        }
        Ok(())
    })?;

    let boxes: Vec<BoundingBox> = ws
        .instances()
        .iter()
        .filter_map(|i| ws.bounding_box(i.id, view))
        .collect();
    let zoom = settings.zoom * frame_scale(&boxes, settings.view);
    tracing::debug!(zoom, boxes = boxes.len(), "framing");

    let title = opts.title_convention.title_of(ws)?;
    let destination = opts
        .paths
        .images
        .join(format!("{title}.{}", settings.file_extension()));
    render_and_crop(ws, view, settings, zoom, &destination)
}

/// Save the workspace as `path`, replacing an existing file unless it is locked.
fn save_document<W>(ws: &mut W, path: &Path) -> FamshotResult<()>
where
    W: Workspace + ?Sized,
{
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create projects directory '{}'", dir.display()))?;
    }

    if path.exists() {
        if std::fs::OpenOptions::new().write(true).open(path).is_err() {
            return Err(FamshotError::host(format!(
                "document '{}' is locked",
                path.display()
            )));
        }
        std::fs::remove_file(path)
            .with_context(|| format!("remove previous document '{}'", path.display()))?;
    }

    ws.save_as(path)
}

/// Delete what `placement` created and the variant's symbol.
fn cleanup<W>(ws: &mut W, placement: Option<&Placement>, variant: &Variant)
where
    W: Workspace + ?Sized,
{
    let mut doomed: Vec<ElementId> = Vec::new();
    if let Some(p) = placement {
        doomed.extend(p.instance());
        doomed.extend(p.synthetic_hosts());
    }
    doomed.push(variant.symbol);

    for id in doomed {
        if let Err(e) = transact(ws, "clean up", |ws| ws.delete(id)) {
            tracing::warn!(element = id.0, error = %e, "cleanup failed; next sweep retries");
        }
    }
}

/// Document path `process_variant` writes for `name`.
pub fn document_path<W>(ws: &W, projects: &Path, name: &str) -> PathBuf
where
    W: Workspace + ?Sized,
{
    projects.join(format!("{name}.{}", ws.document_extension()))
}

#[cfg(test)]
#[path = "../tests/unit/lifecycle.rs"]
mod tests;
