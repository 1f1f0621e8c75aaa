#![forbid(unsafe_code)]

pub mod batch;
pub mod config;
pub mod export;
pub mod foundation;
pub mod framing;
pub mod host;
pub mod lifecycle;
pub mod model;
pub mod placement;
pub mod sanitize;

pub use batch::{
    BatchObserver, BatchReport, CancelFlag, NoopObserver, discover_components, run_batch,
    run_batch_with,
};
pub use config::BatchConfig;
pub use export::{center_crop, render_and_crop};
pub use foundation::core::{BoundingBox, ElementId, ViewId, ViewKind};
pub use foundation::error::{FamshotError, FamshotResult};
pub use framing::{compute_scale, frame_scale};
pub use host::memory::MemoryWorkspace;
pub use host::{TitleConvention, Workspace};
pub use lifecycle::{LifecycleOptions, finish_component, process_variant, resolve_artifact_name};
pub use model::{ComponentDefinition, PathSet, RasterFormat, RenderSettings, Variant};
pub use placement::{Placement, PlacementStrategy, place};
pub use sanitize::{is_valid_file_name, sanitize};
