use std::f32::consts::TAU;

use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;
use crate::raycast::Ray;

const MIN_POLAR: f32 = 1.0e-4;

/// Drawable area size in physical pixels, never smaller than 1×1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Maps a pixel position (origin top-left) to normalized device coordinates.
    pub fn to_ndc(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            position.x / self.width as f32 * 2.0 - 1.0,
            -(position.y / self.height as f32) * 2.0 + 1.0,
        )
    }
}

/// Perspective camera orbiting a target point with damped rotation.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    target: Vec3,
    radius: f32,
    azimuth: f32,
    polar: f32,
    fov: f32,
    near: f32,
    far: f32,
    damping: f32,
    max_polar: f32,
    pending: Vec2,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig) -> Self {
        let offset = config.position - config.target;
        let radius = offset.length().max(config.near);
        let azimuth = offset.x.atan2(offset.z);
        let max_polar = config.max_polar.to_radians().max(MIN_POLAR);
        let polar = (offset.x.hypot(offset.z))
            .atan2(offset.y)
            .clamp(MIN_POLAR, max_polar);
        Self {
            target: config.target,
            radius,
            azimuth,
            polar,
            fov: config.fov.to_radians(),
            near: config.near,
            far: config.far,
            damping: config.damping.clamp(0.0, 1.0),
            max_polar,
            pending: Vec2::ZERO,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn position(&self) -> Vec3 {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();
        self.target
            + Vec3::new(
                sin_polar * sin_azimuth,
                cos_polar,
                sin_polar * cos_azimuth,
            ) * self.radius
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, aspect.max(0.01), self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    /// Queues a rotation in radians (x: azimuth, y: polar).
    pub fn rotate(&mut self, delta: Vec2) {
        self.pending += delta;
    }

    /// Queues the rotation produced by dragging `delta` pixels across `viewport`.
    pub fn drag(&mut self, delta: Vec2, viewport: Viewport) {
        let height = viewport.height() as f32;
        self.rotate(Vec2::new(-TAU * delta.x / height, -TAU * delta.y / height));
    }

    /// Moves toward (`factor < 1`) or away from (`factor > 1`) the target.
    pub fn zoom(&mut self, factor: f32) {
        if factor > 0.0 {
            self.radius = (self.radius * factor).clamp(self.near, self.far);
        }
    }

    /// Applies part of the queued rotation; call once per frame.
    pub fn update(&mut self) {
        let factor = if self.damping > 0.0 { self.damping } else { 1.0 };
        self.azimuth += self.pending.x * factor;
        self.polar = (self.polar + self.pending.y * factor).clamp(MIN_POLAR, self.max_polar);
        self.pending *= 1.0 - factor;
        if self.pending.length_squared() < 1.0e-12 {
            self.pending = Vec2::ZERO;
        }
    }

    /// World-space ray from the eye through a point in normalized device coordinates.
    pub fn ray_through(&self, ndc: Vec2, aspect: f32) -> Ray {
        let origin = self.position();
        let inverse = self.view_proj(aspect).inverse();
        let point = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
        Ray::new(origin, point - origin)
    }
}
