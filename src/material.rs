use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Surface treatment attached to a renderable node.
///
/// `AnimatedShader` and `VideoTexture` are handles to the viewer-wide shared
/// materials; assigning the same handle to several nodes keeps them in sync.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Material {
    Standard { color: Vec3 },
    AnimatedShader,
    VideoTexture,
}

impl Material {
    pub fn label(&self) -> &'static str {
        match self {
            Material::Standard { .. } => "standard",
            Material::AnimatedShader => "shader",
            Material::VideoTexture => "video",
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Standard { color: Vec3::ONE }
    }
}

/// Uniform state of the animated screen shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderMaterial {
    time: f32,
    time_step: f32,
    resolution: Vec2,
}

impl ShaderMaterial {
    pub fn new(time_step: f32, resolution: Vec2) -> Self {
        Self {
            time: 0.0,
            time_step,
            resolution,
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn resolution(&self) -> Vec2 {
        self.resolution
    }

    /// Advances the `time` uniform by one frame.
    pub fn advance(&mut self) {
        self.time += self.time_step;
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = Vec2::new(width as f32, height as f32);
    }
}
