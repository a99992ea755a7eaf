use std::env;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;

use jukebox_viewer::{
    DirAssetSource, Dispatch, HeadlessAudio, HeadlessVideo, Material, PointerEvent, VideoElement,
    Viewer, ViewerConfig, Viewport,
};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let deck_path = Path::new(&options.path);
    let xml = fs::read_to_string(deck_path)
        .with_context(|| format!("failed to read deck {}", options.path))?;
    let config = ViewerConfig::from_xml(&xml).context("failed to parse deck XML")?;
    let assets = DirAssetSource::new(
        deck_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(".")),
    );

    println!("Loaded deck with {} track(s)", config.tracks.len());
    let video = HeadlessVideo::new(config.video.clone());
    let mut viewer = Viewer::new(
        config,
        Viewport::new(options.viewport.0, options.viewport.1),
        HeadlessAudio::new(),
        video,
    )?;

    match viewer.load_model(&assets) {
        Ok(bound) => {
            let nodes = viewer.graph().map(|graph| graph.len()).unwrap_or(0);
            println!("Model loaded with {nodes} nodes");
            println!("Wired {bound} control(s)");
        }
        Err(err) => println!("Setup failed: {err:#}"),
    }

    for event in &options.events {
        match *event {
            HostEvent::Click(x, y) => {
                let event = PointerEvent::new(x, y);
                let dispatch = viewer.pointer_down(event);
                viewer.pointer_up(event);
                println!("{}", describe_click(&viewer, x, y, dispatch));
            }
            HostEvent::Drag(dx, dy) => {
                let center = Vec2::new(
                    viewer.viewport().width() as f32 / 2.0,
                    viewer.viewport().height() as f32 / 2.0,
                );
                viewer.begin_drag(PointerEvent::new(center.x, center.y));
                viewer.pointer_moved(center + Vec2::new(dx, dy));
                viewer.pointer_up(PointerEvent::new(center.x + dx, center.y + dy));
            }
            HostEvent::Zoom(factor) => viewer.zoom(factor),
            HostEvent::Resize(width, height) => viewer.resize(width, height),
            HostEvent::Frames(count) => {
                for _ in 0..count {
                    if let Err(err) = viewer.frame() {
                        log::debug!("frame skipped: {err}");
                    }
                }
            }
        }
        viewer.pump_loads(&assets);
    }

    print_final_state(&viewer);
    viewer.dispose();
    Ok(())
}

fn describe_click(viewer: &Viewer, x: f32, y: f32, dispatch: Dispatch) -> String {
    let name = |node| {
        viewer
            .graph()
            .map(|graph| graph.name(node).to_string())
            .unwrap_or_default()
    };
    match dispatch {
        Dispatch::Background => format!("Click at ({x}, {y}): background"),
        Dispatch::Unbound { node } => format!("Click at ({x}, {y}): {} (no action)", name(node)),
        Dispatch::Action { node, action } => {
            format!("Click at ({x}, {y}): {} -> {}", name(node), action.name())
        }
    }
}

fn print_final_state(viewer: &Viewer) {
    let playback = viewer.playback();
    let track = playback.current_track();
    println!("Final playback state:");
    println!(
        " - track {}/{} {} ({})",
        track + 1,
        playback.track_count(),
        playback.track_id(track).unwrap_or("?"),
        playback.status().label()
    );
    println!(
        " - video {} playing: {}",
        viewer.video().source().unwrap_or("(none)"),
        viewer.video().is_playing()
    );
    println!(" - camera distance: {:.2}", viewer.camera().radius());
    println!(" - shader time: {:.2}", viewer.shader().time());
    for (name, material) in viewer.surface_materials() {
        println!(
            " - surface {name}: {}",
            material.as_ref().map(Material::label).unwrap_or("none")
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum HostEvent {
    Click(f32, f32),
    Drag(f32, f32),
    Zoom(f32),
    Resize(u32, u32),
    Frames(u32),
}

struct CliOptions {
    path: String,
    viewport: (u32, u32),
    events: Vec<HostEvent>,
}

const USAGE: &str = "Usage: jukebox-viewer <deck.xml> [--viewport WxH] [--click X,Y]... \
                     [--drag DX,DY]... [--zoom F]... [--resize WxH]... [--frames N]...";

impl CliOptions {
    fn parse(args: impl Iterator<Item = String>) -> Result<Self> {
        let mut args = args;
        let Some(path) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut viewport = (1280, 720);
        let mut events = Vec::new();
        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} expects a value"))
            };
            match flag.as_str() {
                "--viewport" => viewport = parse_pair(&value()?, 'x')?,
                "--click" => {
                    let (x, y) = parse_pair(&value()?, ',')?;
                    events.push(HostEvent::Click(x, y));
                }
                "--drag" => {
                    let (dx, dy) = parse_pair(&value()?, ',')?;
                    events.push(HostEvent::Drag(dx, dy));
                }
                "--zoom" => {
                    let factor = value()?
                        .parse::<f32>()
                        .map_err(|err| anyhow!("invalid zoom factor: {err}"))?;
                    events.push(HostEvent::Zoom(factor));
                }
                "--resize" => {
                    let (width, height) = parse_pair(&value()?, 'x')?;
                    events.push(HostEvent::Resize(width, height));
                }
                "--frames" => {
                    let count = value()?
                        .parse::<u32>()
                        .map_err(|err| anyhow!("invalid frame count: {err}"))?;
                    events.push(HostEvent::Frames(count));
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(Self {
            path,
            viewport,
            events,
        })
    }
}

fn parse_pair<T: std::str::FromStr>(value: &str, separator: char) -> Result<(T, T)>
where
    T::Err: std::fmt::Display,
{
    let (a, b) = value
        .split_once(separator)
        .ok_or_else(|| anyhow!("expected two values separated by '{separator}', got {value}"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<T>()
            .map_err(|err| anyhow!("invalid value {part:?} in {value}: {err}"))
    };
    Ok((parse(a)?, parse(b)?))
}
