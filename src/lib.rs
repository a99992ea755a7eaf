//! Interactive media deck viewer core.
//!
//! The crate turns pointer presses on a loaded 3D model into playback
//! actions: named control nodes are resolved once the model arrives, bound to
//! play/pause/next/previous, and hit tested against camera rays. Rendering,
//! audio decoding and the host window stay outside of the crate so the core
//! remains testable headless and embeddable in a browser host.

pub mod actions;
pub mod assets;
pub mod camera;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod material;
pub mod media;
pub mod obj;
pub mod playback;
pub mod raycast;
pub mod scene;
pub mod scene_index;
pub mod viewer;
pub mod visual;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use actions::{ActionRegistry, ControlAction};
pub use assets::{AssetSource, AudioBuffer, DirAssetSource, MemoryAssetSource};
pub use camera::{OrbitCamera, Viewport};
pub use config::{CameraConfig, Presentation, TrackConfig, ViewerConfig};
pub use dispatch::{Dispatch, HitDispatcher};
pub use error::{LoadError, RenderGuardError, SetupError};
pub use input::{MouseButton, PointerEvent};
pub use material::{Material, ShaderMaterial};
pub use media::{AudioSink, HeadlessAudio, HeadlessVideo, SinkState, VideoElement};
pub use obj::{load_obj_from_str, TriMesh};
pub use playback::{LoadOutcome, LoadRequest, Playback, PlaybackStatus};
pub use raycast::{Hit, Ray};
pub use scene::{Geometry, NodeId, SceneGraph, SceneNode, Transform};
pub use scene_index::SceneIndex;
pub use viewer::{FrameInfo, Viewer};
pub use visual::{Transition, VisualState};
