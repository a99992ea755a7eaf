use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::scene::{optional_text, parse_vec3};

/// How the screen surfaces look while a track is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    #[default]
    Shader,
    Video,
}

impl Presentation {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "shader" => Ok(Presentation::Shader),
            "video" => Ok(Presentation::Video),
            other => Err(anyhow!("unknown presentation {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackConfig {
    pub id: String,
    #[serde(default)]
    pub presentation: Presentation,
}

impl TrackConfig {
    pub fn shader(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            presentation: Presentation::Shader,
        }
    }

    pub fn video(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            presentation: Presentation::Video,
        }
    }
}

/// Orbit camera parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub damping: f32,
    /// Largest polar angle from the up axis, in degrees.
    pub max_polar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 10_000.0,
            position: Vec3::new(0.0, 50.0, 20.0),
            target: Vec3::ZERO,
            damping: 0.25,
            max_polar: 90.0,
        }
    }
}

/// Everything a viewer instance needs besides the model itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub model: String,
    pub model_scale: Vec3,
    pub volume: f32,
    pub shader_time_step: f32,
    pub discard_stale_loads: bool,
    pub camera: CameraConfig,
    pub tracks: Vec<TrackConfig>,
    pub video: Option<String>,
    pub surfaces: Vec<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model: "Buttons/Buttons2.xml".to_string(),
            model_scale: Vec3::splat(200.0),
            volume: 0.5,
            shader_time_step: 0.05,
            discard_stale_loads: true,
            camera: CameraConfig::default(),
            tracks: [
                "Audio/11_WIP_.mp3",
                "Audio/86_WIP_.mp3",
                "Audio/90 V1_WIP_.mp3",
                "Audio/91_WIP_.mp3",
            ]
            .into_iter()
            .map(TrackConfig::shader)
            .collect(),
            video: None,
            surfaces: vec!["Glass2".to_string(), "Glass2_Glass1_0".to_string()],
        }
    }
}

impl ViewerConfig {
    /// Parses a `<deck>` document; absent elements keep their defaults.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid deck XML")?;
        let deck = document.root_element();
        if !deck.has_tag_name("deck") {
            return Err(anyhow!(
                "expected <deck> root element, found <{}>",
                deck.tag_name().name()
            ));
        }

        let mut config = Self::default();
        if let Some(model) = optional_text(&deck, "model") {
            config.model = model;
        }
        if let Some(scale) = optional_text(&deck, "model-scale") {
            config.model_scale = parse_vec3(&scale).context("invalid <model-scale>")?;
        }
        config.volume = parse_f32(optional_text(&deck, "volume"), config.volume)
            .context("invalid <volume>")?
            .clamp(0.0, 1.0);
        config.shader_time_step = parse_f32(
            optional_text(&deck, "shader-time-step"),
            config.shader_time_step,
        )
        .context("invalid <shader-time-step>")?;
        if let Some(value) = optional_text(&deck, "discard-stale-loads") {
            config.discard_stale_loads = value
                .parse::<bool>()
                .map_err(|err| anyhow!("invalid <discard-stale-loads>: {err}"))?;
        }
        if let Some(camera) = child(&deck, "camera") {
            config.camera = parse_camera(&camera, config.camera)?;
        }
        if let Some(tracks) = child(&deck, "tracks") {
            config.tracks = parse_tracks(&tracks)?;
        }
        config.video = optional_text(&deck, "video");
        if let Some(surfaces) = child(&deck, "surfaces") {
            config.surfaces = surfaces
                .children()
                .filter(|n| n.has_tag_name("surface"))
                .filter_map(|n| n.text())
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the viewer relies on.
    pub fn validate(&self) -> Result<()> {
        if self.tracks.is_empty() {
            return Err(SetupError::EmptyPlaylist.into());
        }
        if self.video.is_none() {
            if let Some(track) = self
                .tracks
                .iter()
                .find(|track| track.presentation == Presentation::Video)
            {
                return Err(anyhow!(
                    "track {} uses a video presentation but no <video> is configured",
                    track.id
                ));
            }
        }
        if self.camera.near <= 0.0 || self.camera.far <= self.camera.near {
            return Err(anyhow!(
                "camera clip planes are invalid (near={}, far={})",
                self.camera.near,
                self.camera.far
            ));
        }
        Ok(())
    }

    pub fn track_ids(&self) -> Vec<String> {
        self.tracks.iter().map(|track| track.id.clone()).collect()
    }

    pub fn presentations(&self) -> Vec<Presentation> {
        self.tracks.iter().map(|track| track.presentation).collect()
    }
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn parse_camera(node: &Node<'_, '_>, defaults: CameraConfig) -> Result<CameraConfig> {
    let mut camera = defaults;
    camera.fov = parse_f32(optional_text(node, "fov"), camera.fov).context("invalid <fov>")?;
    camera.near = parse_f32(optional_text(node, "near"), camera.near).context("invalid <near>")?;
    camera.far = parse_f32(optional_text(node, "far"), camera.far).context("invalid <far>")?;
    camera.damping = parse_f32(optional_text(node, "damping"), camera.damping)
        .context("invalid <damping>")?;
    camera.max_polar = parse_f32(optional_text(node, "max-polar"), camera.max_polar)
        .context("invalid <max-polar>")?;
    if let Some(value) = optional_text(node, "position") {
        camera.position = parse_vec3(&value).context("invalid camera <position>")?;
    }
    if let Some(value) = optional_text(node, "target") {
        camera.target = parse_vec3(&value).context("invalid camera <target>")?;
    }
    Ok(camera)
}

fn parse_tracks(node: &Node<'_, '_>) -> Result<Vec<TrackConfig>> {
    node.children()
        .filter(|n| n.has_tag_name("track"))
        .map(|track| {
            let id = track
                .text()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .ok_or_else(|| anyhow!("<track> is empty"))?
                .to_string();
            let presentation = match track.attribute("presentation") {
                Some(value) => Presentation::parse(value)
                    .with_context(|| format!("invalid presentation for track {id}"))?,
                None => Presentation::Shader,
            };
            Ok(TrackConfig { id, presentation })
        })
        .collect()
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}
