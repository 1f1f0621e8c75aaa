//! Raster export and square post-crop.

use std::path::Path;

use anyhow::Context as _;
use image::{DynamicImage, GenericImageView as _, Rgba, RgbaImage};

use crate::foundation::core::ViewId;
use crate::foundation::error::{FamshotError, FamshotResult};
use crate::host::{FitDirection, ImageExportRequest, Workspace, transact};
use crate::model::{RasterFormat, RenderSettings};
use crate::sanitize::is_valid_file_name;

/// Top-left corner of a `size`-square window centred in a `width x height` image.
///
/// Saturates at zero when the image is smaller than the window along an axis.
pub fn crop_origin(width: u32, height: u32, size: u32) -> (u32, u32) {
    (width.saturating_sub(size) / 2, height.saturating_sub(size) / 2)
}

/// Centre-crop `img` to `size x size`.
///
/// Axes narrower than `size` are centred on a white canvas, so the result is always square.
pub fn center_crop(img: &DynamicImage, size: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    let (x, y) = crop_origin(w, h, size);
    let window = img.crop_imm(x, y, size.min(w), size.min(h));
    if window.dimensions() == (size, size) {
        return window;
    }

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));
    let (ww, wh) = window.dimensions();
    let (ox, oy) = ((size - ww) / 2, (size - wh) / 2);
    for (px, py, p) in window.pixels() {
        canvas.put_pixel(ox + px, oy + py, p);
    }
    DynamicImage::ImageRgba8(canvas)
}

/// Crop the image at `temp` into `destination`. The caller owns `temp`'s deletion.
fn crop_file(
    temp: &Path,
    destination: &Path,
    size: u32,
    format: RasterFormat,
) -> FamshotResult<()> {
    let img = image::open(temp).map_err(|e| {
        FamshotError::export(format!(
            "decode temporary export '{}': {e}",
            temp.display()
        ))
    })?;
    let cropped = center_crop(&img, size);
    drop(img);

    // Not every encoder takes an alpha channel.
    let cropped = DynamicImage::ImageRgb8(cropped.to_rgb8());
    cropped
        .save_with_format(destination, format.image_format())
        .with_context(|| format!("write thumbnail '{}'", destination.display()))?;
    Ok(())
}

/// Export the visible region of `view` and centre-crop it into a square thumbnail at
/// `destination`.
///
/// `zoom` is applied to every open view before exporting. A destination whose file name is not
/// valid on the filesystem is skipped without error. The temporary export is always removed,
/// whether or not the crop succeeds.
#[tracing::instrument(
    level = "debug",
    skip(ws, settings, destination),
    fields(destination = %destination.display())
)]
pub fn render_and_crop<W>(
    ws: &mut W,
    view: ViewId,
    settings: &RenderSettings,
    zoom: f64,
    destination: &Path,
) -> FamshotResult<()>
where
    W: Workspace + ?Sized,
{
    let format = settings.format()?;

    let valid = destination
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_valid_file_name);
    if !valid {
        tracing::debug!("skipping export: destination name is not a valid file name");
        return Ok(());
    }

    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create image directory '{}'", dir.display()))?;

    // Deleted on drop, including on every early return below.
    let temp = tempfile::Builder::new()
        .prefix(".famshot-")
        .suffix(&format!(".{}", settings.file_extension()))
        .tempfile_in(dir)
        .with_context(|| format!("create temporary export in '{}'", dir.display()))?
        .into_temp_path();

    let request = ImageExportRequest {
        path: temp.to_path_buf(),
        view,
        format,
        resolution: settings.resolution,
        pixel_size: settings.pixel_size,
        fit: FitDirection::Vertical,
    };

    transact(ws, "export image", |ws| {
        for v in ws.open_views() {
            ws.set_zoom(v, zoom)?;
        }
        ws.activate_view(view)?;
        ws.refresh();
        ws.export_image(&request)
    })?;

    crop_and_discard(temp, destination, settings.pixel_size, format)
}

/// Centre-crop the temporary export `temp` into `destination`, then delete `temp`.
///
/// `temp` is removed even when it cannot be decoded; no destination is written in that case.
pub fn crop_and_discard(
    temp: tempfile::TempPath,
    destination: &Path,
    size: u32,
    format: RasterFormat,
) -> FamshotResult<()> {
    let cropped = crop_file(&temp, destination, size, format);
    if let Err(e) = temp.close() {
        tracing::warn!(error = %e, "failed to delete temporary export");
    }
    cropped
}

#[cfg(test)]
#[path = "../tests/unit/export.rs"]
mod tests;
