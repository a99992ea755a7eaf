use log::{debug, info};

use crate::actions::ControlAction;
use crate::camera::{OrbitCamera, Viewport};
use crate::input::PointerEvent;
use crate::raycast::{intersect_subtree, Hit};
use crate::scene::{NodeId, SceneGraph};

/// Result of hit testing one pointer-down event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    /// The ray missed every piece of geometry.
    Background,
    /// The nearest hit carries no binding of its own.
    Unbound { node: NodeId },
    /// The nearest hit's node is bound to `action`.
    Action { node: NodeId, action: ControlAction },
}

impl Dispatch {
    pub fn action(&self) -> Option<ControlAction> {
        match self {
            Dispatch::Action { action, .. } => Some(*action),
            _ => None,
        }
    }
}

/// Resolves pointer-down events to at most one bound action.
///
/// Only the exact node under the nearest hit is consulted; a sub-mesh of a
/// bound group does not inherit its ancestor's action.
#[derive(Debug, Default, Clone, Copy)]
pub struct HitDispatcher;

impl HitDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Casts a ray through `event` using the viewport size at event time.
    pub fn hits(
        &self,
        event: &PointerEvent,
        viewport: Viewport,
        camera: &OrbitCamera,
        graph: &SceneGraph,
    ) -> Vec<Hit> {
        let ndc = viewport.to_ndc(event.position);
        let ray = camera.ray_through(ndc, viewport.aspect());
        intersect_subtree(graph, graph.root(), &ray)
    }

    pub fn dispatch(
        &self,
        event: &PointerEvent,
        viewport: Viewport,
        camera: &OrbitCamera,
        graph: &SceneGraph,
    ) -> Dispatch {
        let hits = self.hits(event, viewport, camera, graph);
        let Some(nearest) = hits.first() else {
            debug!("no intersections at {:?}", event.position);
            return Dispatch::Background;
        };
        match graph.node(nearest.node).and_then(|node| node.action()) {
            Some(action) => {
                info!(
                    "executing {} for {}",
                    action.name(),
                    graph.name(nearest.node)
                );
                Dispatch::Action {
                    node: nearest.node,
                    action,
                }
            }
            None => {
                debug!("no action found for {}", graph.name(nearest.node));
                Dispatch::Unbound { node: nearest.node }
            }
        }
    }
}
