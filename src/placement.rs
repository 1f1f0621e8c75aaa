//! Placement of a variant instance through a prioritized strategy chain.

use crate::foundation::core::{ElementId, Line, Point, ViewId};
use crate::foundation::error::{FamshotError, FamshotResult};
use crate::host::{Workspace, transact};
use crate::model::Variant;

/// Half length of the synthetic wall, centred on the origin along x.
pub const SYNTHETIC_WALL_HALF_LENGTH: f64 = 5.0;

/// A placement strategy. Strategies are tried in order; each runs in its own transaction.
///
/// Curtain-wall panels and railing balusters would slot in here as further hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementStrategy {
    /// Unhosted instance at the origin of the plan view's level.
    Direct,
    /// Instance hosted on a synthesized straight wall.
    WallHosted,
}

pub const DEFAULT_STRATEGIES: &[PlacementStrategy] =
    &[PlacementStrategy::Direct, PlacementStrategy::WallHosted];

/// Outcome of [`place`].
#[derive(Clone, Debug, PartialEq)]
pub enum Placement {
    Direct {
        instance: ElementId,
    },
    WallHosted {
        instance: ElementId,
        /// Synthetic host; hide it in export views and delete it on cleanup.
        wall: ElementId,
    },
    Failed {
        reason: String,
    },
}

impl Placement {
    pub fn instance(&self) -> Option<ElementId> {
        match self {
            Self::Direct { instance } | Self::WallHosted { instance, .. } => Some(*instance),
            Self::Failed { .. } => None,
        }
    }

    /// Elements created only to satisfy placement.
    pub fn synthetic_hosts(&self) -> Vec<ElementId> {
        match self {
            Self::WallHosted { wall, .. } => vec![*wall],
            Self::Direct { .. } | Self::Failed { .. } => Vec::new(),
        }
    }

    pub fn is_placed(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Place `variant` with [`DEFAULT_STRATEGIES`].
pub fn place<W>(ws: &mut W, variant: &Variant, plan_view: ViewId) -> FamshotResult<Placement>
where
    W: Workspace + ?Sized,
{
    place_with(ws, variant, plan_view, DEFAULT_STRATEGIES)
}

/// Try `strategies` in order and return the first that yields visible geometry in `plan_view`.
///
/// A strategy that errors or produces an empty bounding box is rolled back before the next one
/// runs. Only errors that make further attempts pointless (e.g. the view has no level) propagate.
pub fn place_with<W>(
    ws: &mut W,
    variant: &Variant,
    plan_view: ViewId,
    strategies: &[PlacementStrategy],
) -> FamshotResult<Placement>
where
    W: Workspace + ?Sized,
{
    let level = ws.view_level(plan_view)?;
    let mut failures = Vec::new();

    for &strategy in strategies {
        let outcome = transact(ws, "place variant", |ws| {
            let placement = attempt(ws, strategy, variant.symbol, level)?;
            let visible = placement
                .instance()
                .and_then(|i| ws.bounding_box(i, plan_view))
                .is_some_and(|b| !b.is_empty());
            if visible {
                Ok(placement)
            } else {
                Err(FamshotError::placement(format!(
                    "{strategy:?} placement produced no geometry"
                )))
            }
        });

        match outcome {
            Ok(placement) => {
                tracing::debug!(variant = %variant.name, ?strategy, "placed");
                return Ok(placement);
            }
            Err(e) => {
                tracing::debug!(variant = %variant.name, ?strategy, error = %e, "strategy failed");
                failures.push(e.to_string());
            }
        }
    }

    Ok(Placement::Failed {
        reason: if failures.is_empty() {
            "no placement strategy configured".to_string()
        } else {
            failures.join("; ")
        },
    })
}

fn attempt<W>(
    ws: &mut W,
    strategy: PlacementStrategy,
    symbol: ElementId,
    level: ElementId,
) -> FamshotResult<Placement>
where
    W: Workspace + ?Sized,
{
    ws.activate_symbol(symbol)?;
    match strategy {
        PlacementStrategy::Direct => {
            let instance = ws.place_instance(symbol, level, Point::ORIGIN, None)?;
            Ok(Placement::Direct { instance })
        }
        PlacementStrategy::WallHosted => {
            let wall = ws.create_wall(
                level,
                Line::new(
                    (-SYNTHETIC_WALL_HALF_LENGTH, 0.0),
                    (SYNTHETIC_WALL_HALF_LENGTH, 0.0),
                ),
            )?;
            let instance = ws.place_instance(symbol, level, Point::ORIGIN, Some(wall))?;
            Ok(Placement::WallHosted { instance, wall })
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/placement.rs"]
mod tests;
