use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const MODEL: &str = r#"<model>
  <name>Scene</name>
  <node><name>PlayButton</name><box>1 1 1</box></node>
  <node><name>PauseButton</name><position>3 0 0</position><box>1 1 1</box></node>
  <node><name>ForwardButton</name><position>-3 0 0</position><box>1 1 1</box></node>
  <node><name>BackwardButton</name><position>0 3 0</position><box>1 1 1</box></node>
  <node>
    <name>Screen</name>
    <position>0 -3 0</position>
    <node><name>Glass2</name><box>4 1 0.1</box></node>
    <node><name>Glass2_Glass1_0</name><box>4 1 0.1</box></node>
  </node>
</model>
"#;

fn build_deck(tracks: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let mut deck = String::from(
        "<deck>\n  <model>model.xml</model>\n  <model-scale>1 1 1</model-scale>\n  \
         <camera><position>0 0 10</position></camera>\n  <video>clip.mp4</video>\n  <tracks>\n",
    );
    for (id, presentation) in tracks {
        deck.push_str(&format!(
            "    <track presentation=\"{presentation}\">{id}</track>\n"
        ));
        write(dir.path(), id, id.as_bytes());
    }
    deck.push_str("  </tracks>\n</deck>\n");
    write(dir.path(), "deck.xml", deck.as_bytes());
    write(dir.path(), "model.xml", MODEL.as_bytes());
    dir
}

fn write(root: &Path, id: &str, data: &[u8]) {
    let path = root.join(id);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create asset dir");
    }
    fs::write(path, data).expect("write asset");
}

#[test]
fn cli_replays_clicks_and_prints_final_state() {
    let deck = build_deck(&[
        ("Audio/a.mp3", "shader"),
        ("Audio/b.mp3", "video"),
        ("Audio/c.mp3", "shader"),
    ]);
    let mut cmd = Command::cargo_bin("jukebox-viewer").expect("binary exists");
    cmd.arg(deck.path().join("deck.xml"))
        .args(["--viewport", "800x600"])
        .args(["--click", "400,300"])
        .args(["--click", "283,300"])
        .args(["--click", "10,10"])
        .args(["--frames", "2"]);
    cmd.assert()
        .success()
        .stdout(contains("Loaded deck with 3 track(s)"))
        .stdout(contains("Model loaded with 8 nodes"))
        .stdout(contains("Wired 4 control(s)"))
        .stdout(contains("Click at (400, 300): PlayButton -> play"))
        .stdout(contains("Click at (283, 300): ForwardButton -> next"))
        .stdout(contains("Click at (10, 10): background"))
        .stdout(contains(" - track 2/3 Audio/b.mp3 (playing)"))
        .stdout(contains(" - video clip.mp4 playing: true"))
        .stdout(contains(" - shader time: 0.10"))
        .stdout(contains(" - surface Glass2: video"))
        .stdout(contains(" - surface Glass2_Glass1_0: video"));
}

#[test]
fn cli_reports_setup_failure_and_keeps_running() {
    let deck = build_deck(&[("a.mp3", "shader")]);
    fs::write(
        deck.path().join("model.xml"),
        "<model><node><name>PlayButton</name><box>1 1 1</box></node></model>",
    )
    .expect("overwrite model");
    let mut cmd = Command::cargo_bin("jukebox-viewer").expect("binary exists");
    cmd.arg(deck.path().join("deck.xml"))
        .args(["--viewport", "800x600"])
        .args(["--click", "400,300"]);
    cmd.assert()
        .success()
        .stdout(contains("Setup failed: required node `PauseButton` is missing"))
        .stdout(contains("Click at (400, 300): PlayButton (no action)"))
        .stdout(contains(" - track 1/1 a.mp3 (idle)"));
}

#[test]
fn cli_drag_orbits_without_pressing_buttons() {
    let deck = build_deck(&[("a.mp3", "shader")]);
    let mut cmd = Command::cargo_bin("jukebox-viewer").expect("binary exists");
    cmd.arg(deck.path().join("deck.xml"))
        .args(["--viewport", "800x600"])
        .args(["--drag", "40,0"])
        .args(["--zoom", "0.5"])
        .args(["--frames", "1"]);
    cmd.assert()
        .success()
        .stdout(contains("Click at").not())
        .stdout(contains(" - track 1/1 a.mp3 (idle)"))
        .stdout(contains(" - video clip.mp4 playing: false"))
        .stdout(contains(" - camera distance: 5.00"));
}

#[test]
fn cli_rejects_empty_playlist() {
    let deck = build_deck(&[]);
    let mut cmd = Command::cargo_bin("jukebox-viewer").expect("binary exists");
    cmd.arg(deck.path().join("deck.xml"));
    cmd.assert()
        .failure()
        .stderr(contains("Error:"))
        .stderr(contains("the playlist does not contain any tracks"));
}
