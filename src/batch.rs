//! Batch orchestration over component files and their variants.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use walkdir::WalkDir;

use crate::foundation::error::{FamshotError, FamshotResult};
use crate::host::{Workspace, transact};
use crate::lifecycle::{LifecycleOptions, finish_component, process_variant, resolve_artifact_name};
use crate::model::{ComponentDefinition, RenderSettings};

/// Recursively collect files under `source` whose extension matches `extension` (any case).
///
/// Paths are sorted. An empty result is [`FamshotError::NoComponents`]; an unreadable directory
/// is a validation error.
pub fn discover_components(source: &Path, extension: &str) -> FamshotResult<Vec<PathBuf>> {
    let wanted = extension.trim_start_matches('.');
    let mut found = Vec::new();

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| {
            FamshotError::validation(format!(
                "cannot read source directory '{}': {e}",
                source.display()
            ))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(wanted));
        if matches {
            found.push(entry.into_path());
        }
    }

    if found.is_empty() {
        return Err(FamshotError::NoComponents(source.to_path_buf()));
    }
    found.sort();
    Ok(found)
}

/// Progress hooks of [`run_batch_with`]. Every method defaults to a no-op.
pub trait BatchObserver {
    fn component_started(&mut self, _component: &ComponentDefinition) {}

    fn component_skipped(&mut self, _path: &Path, _error: &FamshotError) {}

    /// `attempted` counts every variant tried so far, this one included.
    fn variant_finished(
        &mut self,
        _artifact: &str,
        _outcome: &FamshotResult<String>,
        _attempted: usize,
    ) {
    }
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Cooperative cancellation, checked between variants.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantFailure {
    pub component: String,
    pub variant: String,
    pub artifact: String,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedComponent {
    pub path: PathBuf,
    pub error: String,
}

/// What a batch attempted and how it went.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Every attempted artifact name, in processing order.
    pub artifacts: Vec<String>,
    pub succeeded: usize,
    pub failures: Vec<VariantFailure>,
    pub skipped: Vec<SkippedComponent>,
    pub cancelled: bool,
}

/// [`run_batch_with`] without progress reporting or cancellation.
pub fn run_batch<W>(
    ws: &mut W,
    components: &[PathBuf],
    settings: Option<&RenderSettings>,
    opts: &LifecycleOptions,
) -> FamshotResult<BatchReport>
where
    W: Workspace + ?Sized,
{
    run_batch_with(
        ws,
        components,
        settings,
        opts,
        &mut NoopObserver,
        &CancelFlag::new(),
    )
}

/// Process every variant of every component file in order.
///
/// Settings and paths are validated before anything is loaded; those errors are fatal. A
/// component that fails to load is skipped and a failing variant is recorded, neither stops the
/// batch.
pub fn run_batch_with<W>(
    ws: &mut W,
    components: &[PathBuf],
    settings: Option<&RenderSettings>,
    opts: &LifecycleOptions,
    observer: &mut dyn BatchObserver,
    cancel: &CancelFlag,
) -> FamshotResult<BatchReport>
where
    W: Workspace + ?Sized,
{
    if let Some(s) = settings {
        s.validate()?;
    }
    opts.paths.validate()?;

    tracing::info!(
        components = components.len(),
        render = settings.is_some(),
        "batch started"
    );
    let mut report = BatchReport::default();

    'components: for path in components {
        let component = match transact(ws, "load component", |ws| ws.load_component(path)) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping component");
                observer.component_skipped(path, &e);
                report.skipped.push(SkippedComponent {
                    path: path.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };
        tracing::info!(
            component = %component.name,
            variants = component.variants.len(),
            "component loaded"
        );
        observer.component_started(&component);

        for variant in &component.variants {
            if cancel.is_cancelled() {
                report.cancelled = true;
                finish(ws, &component);
                break 'components;
            }

            let artifact = resolve_artifact_name(ws, &component, variant, &opts.name_parameter);
            report.artifacts.push(artifact.clone());

            let outcome = process_variant(ws, &component, variant, settings, opts);
            match &outcome {
                Ok(_) => report.succeeded += 1,
                Err(e) => report.failures.push(VariantFailure {
                    component: component.name.clone(),
                    variant: variant.name.clone(),
                    artifact: artifact.clone(),
                    error: e.to_string(),
                }),
            }
            observer.variant_finished(&artifact, &outcome, report.artifacts.len());
        }

        finish(ws, &component);
    }

    if report.cancelled {
        tracing::info!(attempted = report.artifacts.len(), "batch cancelled");
    }
    tracing::info!(
        attempted = report.artifacts.len(),
        succeeded = report.succeeded,
        failed = report.failures.len(),
        skipped = report.skipped.len(),
        "batch finished"
    );
    Ok(report)
}

fn finish<W>(ws: &mut W, component: &ComponentDefinition)
where
    W: Workspace + ?Sized,
{
    if let Err(e) = finish_component(ws, component) {
        tracing::warn!(component = %component.name, error = %e, "failed to unload component");
    }
}
