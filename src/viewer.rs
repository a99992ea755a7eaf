use std::mem;

use anyhow::{Context, Result};
use glam::{Mat4, Vec2};
use log::{debug, error, info, warn};

use crate::actions::{ActionRegistry, ControlAction};
use crate::assets::{load_audio, AssetSource, AudioBuffer};
use crate::camera::{OrbitCamera, Viewport};
use crate::config::ViewerConfig;
use crate::dispatch::{Dispatch, HitDispatcher};
use crate::error::{LoadError, RenderGuardError, SetupError};
use crate::input::{PointerEvent, PointerState};
use crate::material::{Material, ShaderMaterial};
use crate::media::{AudioSink, HeadlessAudio, HeadlessVideo, VideoElement};
use crate::playback::{LoadOutcome, LoadRequest, Playback};
use crate::scene::SceneGraph;
use crate::scene_index::SceneIndex;
use crate::visual::VisualState;

/// Per-frame data produced for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub frame: u64,
    pub shader_time: f32,
    pub view_proj: Mat4,
}

/// Everything one viewer instance owns, from setup until disposal.
///
/// All entry points are expected to be called from the host's event loop;
/// each runs to completion before the next event is delivered.
pub struct Viewer<A = HeadlessAudio, V = HeadlessVideo> {
    config: ViewerConfig,
    camera: OrbitCamera,
    viewport: Viewport,
    shader: ShaderMaterial,
    playback: Playback,
    visual: VisualState,
    registry: ActionRegistry,
    dispatcher: HitDispatcher,
    pointer: PointerState,
    graph: Option<SceneGraph>,
    index: Option<SceneIndex>,
    audio: A,
    video: V,
    requests: Vec<LoadRequest>,
    frames: u64,
    disposed: bool,
}

impl<A: AudioSink, V: VideoElement> Viewer<A, V> {
    pub fn new(config: ViewerConfig, viewport: Viewport, audio: A, video: V) -> Result<Self> {
        config.validate()?;
        let playback = Playback::new(
            config.track_ids(),
            config.volume,
            config.discard_stale_loads,
        )?;
        let shader = ShaderMaterial::new(
            config.shader_time_step,
            Vec2::new(viewport.width() as f32, viewport.height() as f32),
        );
        Ok(Self {
            camera: OrbitCamera::new(&config.camera),
            visual: VisualState::new(config.presentations()),
            viewport,
            shader,
            playback,
            registry: ActionRegistry::new(),
            dispatcher: HitDispatcher::new(),
            pointer: PointerState::new(),
            graph: None,
            index: None,
            audio,
            video,
            requests: Vec::new(),
            frames: 0,
            disposed: false,
            config,
        })
    }

    /// Fetches and parses the configured model, then runs setup.
    ///
    /// A model that fails to load is logged and leaves the viewer unchanged.
    pub fn load_model(&mut self, assets: &dyn AssetSource) -> Result<usize> {
        let id = self.config.model.clone();
        let graph = assets
            .fetch_text(&id)
            .with_context(|| format!("failed to fetch model {id}"))
            .and_then(|xml| SceneGraph::from_xml(&xml, assets))
            .map_err(|err| {
                let err = LoadError::model(&err);
                error!("{err}");
                err
            })?;
        Ok(self.on_model_loaded(graph)?)
    }

    /// Installs a freshly loaded model and wires controls to it.
    pub fn on_model_loaded(&mut self, mut graph: SceneGraph) -> Result<usize, SetupError> {
        if self.disposed {
            debug!("ignoring model load after dispose");
            return Ok(0);
        }
        let root = graph.root();
        if let Some(node) = graph.node_mut(root) {
            node.transform.scale = self.config.model_scale;
        }
        info!("Model loaded successfully ({} nodes)", graph.len());
        self.graph = Some(graph);
        self.camera.set_target(self.config.camera.target);
        self.setup()
    }

    /// Resolves the scene index and binds every control, or nothing at all.
    pub fn setup(&mut self) -> Result<usize, SetupError> {
        let graph = self.graph.as_mut().ok_or(SetupError::ModelNotLoaded)?;
        let index = match SceneIndex::build(graph, &self.config.surfaces) {
            Ok(index) => index,
            Err(err) => {
                error!("setup aborted, controls stay inert: {err}");
                self.index = None;
                self.visual.set_surfaces(None);
                return Err(err);
            }
        };
        let bound = self.registry.wire(graph, &index);
        self.visual
            .set_surfaces(index.surfaces().map(<[_]>::to_vec));
        self.index = Some(index);
        info!("wired {bound} control(s)");
        Ok(bound)
    }

    /// Hit tests a pointer press and runs at most one action.
    pub fn pointer_down(&mut self, event: PointerEvent) -> Dispatch {
        self.pointer.press(event);
        let Some(graph) = self.graph.as_ref() else {
            debug!("pointer down before the model loaded");
            return Dispatch::Background;
        };
        let dispatch = self
            .dispatcher
            .dispatch(&event, self.viewport, &self.camera, graph);
        if let Dispatch::Action { action, .. } = dispatch {
            self.execute(action);
        }
        dispatch
    }

    /// Records a press for orbiting without hit testing it.
    pub fn begin_drag(&mut self, event: PointerEvent) {
        self.pointer.press(event);
    }

    /// Orbits the camera while the primary button is held.
    pub fn pointer_moved(&mut self, position: Vec2) {
        if let Some(delta) = self.pointer.move_to(position) {
            self.camera.drag(delta, self.viewport);
        }
    }

    pub fn pointer_up(&mut self, event: PointerEvent) {
        self.pointer.release(event);
    }

    /// Dollies the camera; `factor < 1` moves closer to the target.
    pub fn zoom(&mut self, factor: f32) {
        self.camera.zoom(factor);
    }

    /// Runs the behavior bound to a control.
    ///
    /// Track changes only queue a load; the audio and the screen switch
    /// together once [`Viewer::complete_audio_load`] applies it.
    pub fn execute(&mut self, action: ControlAction) {
        if self.disposed {
            return;
        }
        match action {
            ControlAction::Play => {
                let request = self.playback.play();
                self.requests.push(request);
            }
            ControlAction::Pause => {
                self.playback.pause(&mut self.audio);
            }
            ControlAction::Next => {
                let request = self.playback.next();
                self.requests.push(request);
            }
            ControlAction::Previous => {
                let request = self.playback.previous();
                self.requests.push(request);
            }
        }
    }

    /// Shows `track`'s presentation on the screen surfaces.
    fn present_track(&mut self, track: usize) {
        match self.graph.as_mut() {
            Some(graph) => {
                self.visual.apply_for_track(track, graph, &mut self.video);
            }
            None => warn!("no model loaded; skipping visual transition for track {track}"),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.shader
            .set_resolution(self.viewport.width(), self.viewport.height());
    }

    /// Advances per-frame state. Fails harmlessly while nothing can be drawn.
    pub fn frame(&mut self) -> Result<FrameInfo, RenderGuardError> {
        if self.disposed {
            return Err(RenderGuardError::Disposed);
        }
        if self.graph.is_none() {
            return Err(RenderGuardError::SceneNotReady);
        }
        self.camera.update();
        self.shader.advance();
        self.frames += 1;
        Ok(FrameInfo {
            frame: self.frames,
            shader_time: self.shader.time(),
            view_proj: self.camera.view_proj(self.viewport.aspect()),
        })
    }

    /// Drains the audio loads requested since the last call.
    pub fn take_load_requests(&mut self) -> Vec<LoadRequest> {
        mem::take(&mut self.requests)
    }

    pub fn complete_audio_load(
        &mut self,
        generation: u64,
        result: Result<AudioBuffer, LoadError>,
    ) -> Result<LoadOutcome, LoadError> {
        if self.disposed {
            debug!("ignoring audio load completion after dispose");
            return Ok(LoadOutcome::Discarded);
        }
        let outcome = self
            .playback
            .complete_load(generation, result, &mut self.audio)
            .map_err(|err| {
                error!("{err}");
                err
            })?;
        if let LoadOutcome::Applied { track } = outcome {
            self.present_track(track);
        }
        Ok(outcome)
    }

    /// Resolves every pending load synchronously from `assets`, in request order.
    pub fn pump_loads(&mut self, assets: &dyn AssetSource) -> usize {
        self.take_load_requests()
            .into_iter()
            .filter_map(|request| {
                let result = load_audio(assets, &request.id);
                self.complete_audio_load(request.generation, result).ok()
            })
            .filter(|outcome| matches!(outcome, LoadOutcome::Applied { .. }))
            .count()
    }

    pub fn on_audio_ended(&mut self) {
        self.playback.on_ended();
    }

    /// Stops media and releases the model; later events are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.playback.stop(&mut self.audio);
        if self.video.is_playing() {
            self.video.pause();
        }
        self.requests.clear();
        self.pointer.clear();
        self.graph = None;
        self.index = None;
        self.visual.set_surfaces(None);
        self.disposed = true;
        info!("viewer disposed");
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn graph(&self) -> Option<&SceneGraph> {
        self.graph.as_ref()
    }

    pub fn index(&self) -> Option<&SceneIndex> {
        self.index.as_ref()
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn shader(&self) -> &ShaderMaterial {
        &self.shader
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Current material of each configured surface that exists in the model.
    pub fn surface_materials(&self) -> Vec<(String, Option<Material>)> {
        let Some(graph) = self.graph.as_ref() else {
            return Vec::new();
        };
        self.config
            .surfaces
            .iter()
            .filter_map(|name| {
                let id = graph.find_by_name(name)?;
                Some((name.clone(), graph.node(id)?.material))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackConfig;
    use crate::playback::PlaybackStatus;
    use crate::scene::SceneNode;

    fn viewer() -> Viewer {
        let config = ViewerConfig {
            tracks: vec![TrackConfig::shader("a.mp3"), TrackConfig::shader("b.mp3")],
            ..ViewerConfig::default()
        };
        Viewer::new(
            config,
            Viewport::new(800, 600),
            HeadlessAudio::new(),
            HeadlessVideo::default(),
        )
        .unwrap()
    }

    #[test]
    fn frame_before_model_is_guarded() {
        let mut viewer = viewer();
        assert_eq!(viewer.frame(), Err(RenderGuardError::SceneNotReady));
        assert_eq!(viewer.shader().time(), 0.0);
    }

    #[test]
    fn setup_without_model_fails() {
        let mut viewer = viewer();
        assert_eq!(viewer.setup(), Err(SetupError::ModelNotLoaded));
    }

    #[test]
    fn model_root_takes_configured_scale() {
        let mut viewer = viewer();
        let _ = viewer.on_model_loaded(SceneGraph::new(SceneNode::new("Scene")));
        let graph = viewer.graph().unwrap();
        assert_eq!(
            graph.node(graph.root()).unwrap().transform.scale,
            glam::Vec3::splat(200.0)
        );
    }

    #[test]
    fn resize_updates_viewport_and_shader() {
        let mut viewer = viewer();
        viewer.resize(1920, 0);
        assert_eq!(viewer.viewport(), Viewport::new(1920, 1));
        assert_eq!(viewer.shader().resolution(), Vec2::new(1920.0, 1.0));
    }

    #[test]
    fn disposed_viewer_ignores_events() {
        let mut viewer = viewer();
        viewer.execute(ControlAction::Play);
        let request = viewer.take_load_requests().remove(0);
        viewer.dispose();
        assert_eq!(viewer.frame(), Err(RenderGuardError::Disposed));
        let outcome = viewer
            .complete_audio_load(request.generation, Ok(AudioBuffer::new("a.mp3", vec![1])))
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Discarded);
        assert_eq!(viewer.playback().status(), PlaybackStatus::Idle);
    }
}
