use log::{debug, warn};

use crate::config::Presentation;
use crate::material::Material;
use crate::media::VideoElement;
use crate::scene::{NodeId, SceneGraph};

/// Result of applying a track's presentation to the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied { surfaces: usize },
    /// Surfaces were never resolved; nothing changed.
    Skipped,
}

/// Maps tracks to screen materials and keeps every surface node in step.
#[derive(Debug, Clone)]
pub struct VisualState {
    presentations: Vec<Presentation>,
    surfaces: Option<Vec<NodeId>>,
}

impl VisualState {
    pub fn new(presentations: Vec<Presentation>) -> Self {
        Self {
            presentations,
            surfaces: None,
        }
    }

    /// Installs the surface nodes resolved by the scene index.
    pub fn set_surfaces(&mut self, surfaces: Option<Vec<NodeId>>) {
        self.surfaces = surfaces;
    }

    pub fn surfaces(&self) -> Option<&[NodeId]> {
        self.surfaces.as_deref()
    }

    pub fn presentation(&self, track: usize) -> Presentation {
        self.presentations.get(track).copied().unwrap_or_default()
    }

    /// Material shown while `track` is active.
    pub fn material_for_track(&self, track: usize) -> Material {
        match self.presentation(track) {
            Presentation::Shader => Material::AnimatedShader,
            Presentation::Video => Material::VideoTexture,
        }
    }

    /// Assigns the track's material to all surfaces and syncs the video element.
    pub fn apply_for_track(
        &self,
        track: usize,
        graph: &mut SceneGraph,
        video: &mut dyn VideoElement,
    ) -> Transition {
        let Some(surfaces) = self.surfaces.as_deref() else {
            warn!("screen surfaces unresolved; skipping visual transition for track {track}");
            return Transition::Skipped;
        };

        let material = self.material_for_track(track);
        for id in surfaces {
            if let Some(node) = graph.node_mut(*id) {
                node.material = Some(material);
            }
        }

        match self.presentation(track) {
            Presentation::Video if !video.is_playing() => video.play(),
            Presentation::Shader if video.is_playing() => video.pause(),
            _ => {}
        }
        debug!(
            "track {track} shows {} on {} surface(s)",
            material.label(),
            surfaces.len()
        );
        Transition::Applied {
            surfaces: surfaces.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::HeadlessVideo;
    use crate::scene::SceneNode;

    fn screen_graph() -> (SceneGraph, Vec<NodeId>) {
        let mut graph = SceneGraph::new(SceneNode::new("Scene"));
        let root = graph.root();
        let primary = graph.add_child(root, SceneNode::new("Glass2"));
        let duplicate = graph.add_child(primary, SceneNode::new("Glass2_Glass1_0"));
        (graph, vec![primary, duplicate])
    }

    #[test]
    fn material_choice_follows_presentation() {
        let visual = VisualState::new(vec![Presentation::Shader, Presentation::Video]);
        assert_eq!(visual.material_for_track(0), Material::AnimatedShader);
        assert_eq!(visual.material_for_track(1), Material::VideoTexture);
        assert_eq!(visual.material_for_track(7), Material::AnimatedShader);
    }

    #[test]
    fn paired_surfaces_switch_together() {
        let (mut graph, surfaces) = screen_graph();
        let mut visual = VisualState::new(vec![Presentation::Shader, Presentation::Video]);
        visual.set_surfaces(Some(surfaces.clone()));
        let mut video = HeadlessVideo::default();

        assert_eq!(
            visual.apply_for_track(1, &mut graph, &mut video),
            Transition::Applied { surfaces: 2 }
        );
        assert!(video.is_playing());
        for id in &surfaces {
            assert_eq!(graph.node(*id).unwrap().material, Some(Material::VideoTexture));
        }

        visual.apply_for_track(0, &mut graph, &mut video);
        assert!(!video.is_playing());
        for id in &surfaces {
            assert_eq!(graph.node(*id).unwrap().material, Some(Material::AnimatedShader));
        }
    }

    #[test]
    fn unresolved_surfaces_are_a_noop() {
        let (mut graph, _) = screen_graph();
        let before = graph.clone();
        let visual = VisualState::new(vec![Presentation::Video]);
        let mut video = HeadlessVideo::default();
        assert_eq!(
            visual.apply_for_track(0, &mut graph, &mut video),
            Transition::Skipped
        );
        assert_eq!(graph, before);
        assert!(!video.is_playing());
    }
}
