#![cfg(target_arch = "wasm32")]

use glam::Vec2;
use js_sys::{Array, Function, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::assets::{AudioBuffer, MemoryAssetSource};
use crate::camera::Viewport;
use crate::config::ViewerConfig;
use crate::error::LoadError;
use crate::input::{MouseButton, PointerEvent};
use crate::media::{AudioSink, VideoElement};
use crate::playback::LoadOutcome;
use crate::scene::SceneGraph;
use crate::viewer::Viewer;

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    let _ = wasm_logger::init(wasm_logger::Config::default());
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Looks up an optional function property on the host callback object.
fn callback(host: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(host, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
}

fn invoke(host: &JsValue, name: &str, args: &[JsValue]) {
    let Some(function) = callback(host, name) else {
        log::debug!("host has no {name} callback");
        return;
    };
    let args: Array = args.iter().collect();
    if let Err(err) = function.apply(host, &args) {
        log::error!("{name} callback failed: {err:?}");
    }
}

/// Audio output forwarded to the page's Web Audio graph.
struct JsAudio {
    host: JsValue,
}

impl AudioSink for JsAudio {
    fn start(&mut self, buffer: &AudioBuffer, volume: f32) {
        invoke(
            &self.host,
            "startAudio",
            &[
                JsValue::from_str(&buffer.id),
                JsValue::from_f64(volume as f64),
            ],
        );
    }

    fn pause(&mut self) {
        invoke(&self.host, "pauseAudio", &[]);
    }

    fn stop(&mut self) {
        invoke(&self.host, "stopAudio", &[]);
    }
}

/// The page's `<video>` element, driven through host callbacks.
struct JsVideo {
    host: JsValue,
    playing: bool,
}

impl VideoElement for JsVideo {
    fn play(&mut self) {
        invoke(&self.host, "playVideo", &[]);
        self.playing = true;
    }

    fn pause(&mut self) {
        invoke(&self.host, "pauseVideo", &[]);
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[wasm_bindgen]
pub struct WebViewer {
    viewer: Viewer<JsAudio, JsVideo>,
    assets: MemoryAssetSource,
}

#[wasm_bindgen]
impl WebViewer {
    /// Creates a viewer from deck XML. `host` carries the media callbacks.
    #[wasm_bindgen(constructor)]
    pub fn new(
        deck_xml: &str,
        width: u32,
        height: u32,
        host: JsValue,
    ) -> Result<WebViewer, JsValue> {
        let config =
            ViewerConfig::from_xml(deck_xml).map_err(|err| to_js(format!("{err:#}")))?;
        let viewer = Viewer::new(
            config,
            Viewport::new(width, height),
            JsAudio { host: host.clone() },
            JsVideo {
                host,
                playing: false,
            },
        )
        .map_err(|err| to_js(format!("{err:#}")))?;
        Ok(Self {
            viewer,
            assets: MemoryAssetSource::new(),
        })
    }

    /// Makes an asset (such as a mesh referenced by the model) resolvable by id.
    #[wasm_bindgen(js_name = addAsset)]
    pub fn add_asset(&mut self, id: &str, bytes: Uint8Array) {
        self.assets.insert(id, bytes.to_vec());
    }

    /// Installs the model once the host has fetched it. Returns the bound control count.
    #[wasm_bindgen(js_name = loadModel)]
    pub fn load_model(&mut self, xml: &str) -> Result<usize, JsValue> {
        let graph = SceneGraph::from_xml(xml, &self.assets).map_err(|err| {
            let err = LoadError::model(&err);
            log::error!("{err}");
            to_js(err)
        })?;
        self.viewer.on_model_loaded(graph).map_err(to_js)
    }

    /// Returns the name of the bound action that ran, if any.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32, button: u8) -> Option<String> {
        let event = PointerEvent::new(x, y).with_button(MouseButton::new(button));
        self.viewer
            .pointer_down(event)
            .action()
            .map(|action| action.name().to_string())
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.viewer.pointer_moved(Vec2::new(x, y));
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f32, y: f32, button: u8) {
        let event = PointerEvent::new(x, y).with_button(MouseButton::new(button));
        self.viewer.pointer_up(event);
    }

    /// Wheel input; positive `delta_y` moves away from the target.
    pub fn wheel(&mut self, delta_y: f32) {
        self.viewer.zoom(0.95f32.powf(-delta_y / 100.0));
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewer.resize(width, height);
    }

    /// Advances one animation frame; returns the shader time or nothing when idle.
    pub fn frame(&mut self) -> Option<f32> {
        match self.viewer.frame() {
            Ok(info) => Some(info.shader_time),
            Err(err) => {
                log::trace!("{err}");
                None
            }
        }
    }

    /// Audio loads the host should start, as `{ generation, id }` objects.
    #[wasm_bindgen(js_name = pendingLoads)]
    pub fn pending_loads(&mut self) -> Result<Array, JsValue> {
        let requests = Array::new();
        for request in self.viewer.take_load_requests() {
            let entry = Object::new();
            Reflect::set(
                &entry,
                &JsValue::from_str("generation"),
                &JsValue::from_f64(request.generation as f64),
            )?;
            Reflect::set(
                &entry,
                &JsValue::from_str("id"),
                &JsValue::from_str(&request.id),
            )?;
            requests.push(&entry);
        }
        Ok(requests)
    }

    /// Reports a decoded track. Returns whether it became the active source.
    #[wasm_bindgen(js_name = audioLoaded)]
    pub fn audio_loaded(
        &mut self,
        generation: f64,
        id: &str,
        bytes: Uint8Array,
    ) -> Result<bool, JsValue> {
        let buffer = AudioBuffer::new(id, bytes.to_vec());
        let result = if buffer.is_empty() {
            Err(LoadError::Empty { id: id.to_string() })
        } else {
            Ok(buffer)
        };
        self.viewer
            .complete_audio_load(generation as u64, result)
            .map(|outcome| matches!(outcome, LoadOutcome::Applied { .. }))
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = audioFailed)]
    pub fn audio_failed(&mut self, generation: f64, id: &str, message: &str) {
        let err = LoadError::Asset {
            id: id.to_string(),
            message: message.to_string(),
        };
        let _ = self.viewer.complete_audio_load(generation as u64, Err(err));
    }

    #[wasm_bindgen(js_name = audioEnded)]
    pub fn audio_ended(&mut self) {
        self.viewer.on_audio_ended();
    }

    #[wasm_bindgen(js_name = currentTrack)]
    pub fn current_track(&self) -> usize {
        self.viewer.playback().current_track()
    }

    pub fn status(&self) -> String {
        self.viewer.playback().status().label().to_string()
    }

    pub fn dispose(&mut self) {
        self.viewer.dispose();
    }
}
