//! Name-keyed view over the nodes the viewer wires behavior to.

use log::warn;

use crate::error::SetupError;
use crate::scene::{NodeId, SceneGraph};

pub const PLAY_BUTTON: &str = "PlayButton";
pub const PAUSE_BUTTON: &str = "PauseButton";
pub const FORWARD_BUTTON: &str = "ForwardButton";
pub const BACKWARD_BUTTON: &str = "BackwardButton";

/// Control nodes that must exist before any action is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlNodes {
    pub play: NodeId,
    pub pause: NodeId,
    pub forward: NodeId,
    pub backward: NodeId,
}

/// References resolved once after the model finished loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneIndex {
    controls: ControlNodes,
    surfaces: Option<Vec<NodeId>>,
}

impl SceneIndex {
    /// Resolves the four control nodes and the configured screen surfaces.
    ///
    /// A missing control node fails the whole index. Surfaces are resolved as
    /// a group: if any of them is absent the index carries no surfaces at all,
    /// so a primary surface is never driven without its duplicate.
    pub fn build(graph: &SceneGraph, surface_names: &[String]) -> Result<Self, SetupError> {
        let controls = ControlNodes {
            play: require(graph, PLAY_BUTTON)?,
            pause: require(graph, PAUSE_BUTTON)?,
            forward: require(graph, FORWARD_BUTTON)?,
            backward: require(graph, BACKWARD_BUTTON)?,
        };

        let resolved: Vec<Option<NodeId>> = surface_names
            .iter()
            .map(|name| resolve(graph, name))
            .collect();
        let surfaces = if resolved.iter().all(Option::is_some) {
            Some(resolved.into_iter().flatten().collect())
        } else {
            let missing: Vec<&str> = surface_names
                .iter()
                .zip(&resolved)
                .filter(|(_, id)| id.is_none())
                .map(|(name, _)| name.as_str())
                .collect();
            warn!("screen surfaces not found in model: {missing:?}");
            None
        };

        Ok(Self { controls, surfaces })
    }

    pub fn controls(&self) -> ControlNodes {
        self.controls
    }

    /// Surface nodes, or `None` when they could not all be resolved.
    pub fn surfaces(&self) -> Option<&[NodeId]> {
        self.surfaces.as_deref()
    }
}

/// Looks up a node by name.
pub fn resolve(graph: &SceneGraph, name: &str) -> Option<NodeId> {
    graph.find_by_name(name)
}

fn require(graph: &SceneGraph, name: &str) -> Result<NodeId, SetupError> {
    resolve(graph, name).ok_or_else(|| SetupError::MissingNode {
        name: name.to_string(),
    })
}
