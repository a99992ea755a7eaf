use log::debug;
use serde::{Deserialize, Serialize};

use crate::scene::{NodeId, SceneGraph};
use crate::scene_index::SceneIndex;

/// Behavior attached to a control node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlAction {
    Play,
    Pause,
    Next,
    Previous,
}

impl ControlAction {
    pub const ALL: [ControlAction; 4] = [
        ControlAction::Play,
        ControlAction::Pause,
        ControlAction::Next,
        ControlAction::Previous,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ControlAction::Play => "play",
            ControlAction::Pause => "pause",
            ControlAction::Next => "next",
            ControlAction::Previous => "previous",
        }
    }
}

/// Binds control actions onto scene nodes.
///
/// Bindings live on the nodes themselves so hit testing can find them by node
/// identity, and a freshly loaded graph starts with none. Binding never
/// invokes anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionRegistry;

impl ActionRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Stores `action` on `node`, replacing any previous binding.
    pub fn bind(&self, graph: &mut SceneGraph, node: NodeId, action: ControlAction) -> bool {
        let Some(target) = graph.node_mut(node) else {
            return false;
        };
        target.set_action(action);
        debug!("bound {} to {}", action.name(), target.name);
        true
    }

    /// Binds the four control actions resolved by `index`.
    pub fn wire(&self, graph: &mut SceneGraph, index: &SceneIndex) -> usize {
        let controls = index.controls();
        [
            (controls.play, ControlAction::Play),
            (controls.pause, ControlAction::Pause),
            (controls.forward, ControlAction::Next),
            (controls.backward, ControlAction::Previous),
        ]
        .into_iter()
        .filter(|(node, action)| self.bind(graph, *node, *action))
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneNode;
    use crate::scene_index::{BACKWARD_BUTTON, FORWARD_BUTTON, PAUSE_BUTTON, PLAY_BUTTON};

    fn control_graph() -> SceneGraph {
        let mut graph = SceneGraph::new(SceneNode::new("Scene"));
        let root = graph.root();
        for name in [PLAY_BUTTON, PAUSE_BUTTON, FORWARD_BUTTON, BACKWARD_BUTTON] {
            graph.add_child(root, SceneNode::new(name));
        }
        graph
    }

    #[test]
    fn wire_binds_each_control() {
        let mut graph = control_graph();
        let index = SceneIndex::build(&graph, &[]).unwrap();
        let registry = ActionRegistry::new();
        assert_eq!(registry.wire(&mut graph, &index), 4);

        let forward = graph.find_by_name(FORWARD_BUTTON).unwrap();
        assert_eq!(graph.node(forward).unwrap().action(), Some(ControlAction::Next));
    }

    #[test]
    fn rebinding_overwrites_previous_action() {
        let mut graph = control_graph();
        let play = graph.find_by_name(PLAY_BUTTON).unwrap();
        let registry = ActionRegistry::new();
        registry.bind(&mut graph, play, ControlAction::Pause);
        registry.bind(&mut graph, play, ControlAction::Play);
        assert_eq!(graph.node(play).unwrap().action(), Some(ControlAction::Play));
    }

    #[test]
    fn wiring_twice_is_idempotent() {
        let mut graph = control_graph();
        let index = SceneIndex::build(&graph, &[]).unwrap();
        let registry = ActionRegistry::new();
        registry.wire(&mut graph, &index);
        let snapshot = graph.clone();
        registry.wire(&mut graph, &index);
        assert_eq!(graph, snapshot);
    }

    #[test]
    fn fresh_graph_carries_no_bindings() {
        let mut wired = control_graph();
        let index = SceneIndex::build(&wired, &[]).unwrap();
        ActionRegistry::new().wire(&mut wired, &index);

        let fresh = control_graph();
        let play = fresh.find_by_name(PLAY_BUTTON).unwrap();
        assert_eq!(fresh.node(play).unwrap().action(), None);
        assert_eq!(
            wired.node(play).unwrap().action(),
            Some(ControlAction::Play)
        );
    }
}
