use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod common;
mod proptest_helpers;
use common::{write_fixture, APARTMENT, FLOOR_3X3};

/// Command running inside `dir` with no inherited config.
fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("valetudo-render").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("VALETUDO_RENDER_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn runs() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("valetudo-render"));
}

#[test]
fn outputs_tool_name() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("-V")
        .assert()
        .success()
        .stdout("valetudo-render 0.1.0\n");
}

#[test]
fn render_writes_png_and_metadata() {
    let dir = TempDir::new().unwrap();
    write_fixture(&dir.path().join("map.json"), APARTMENT.as_bytes());

    cmd(&dir)
        .args(["render", "map.json", "-o", "out.png", "--meta", "out.json"])
        .assert()
        .success();

    let image = image::open(dir.path().join("out.png")).unwrap();
    assert_eq!((image.width(), image.height()), (88, 24));

    let meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out.json")).unwrap()).unwrap();
    assert_eq!(meta["image_size"]["width"], 88);
    assert_eq!(meta["image_size"]["height"], 24);
    assert_eq!(meta["pixel_size"], 5);
    assert_eq!(meta["calibration"].as_array().unwrap().len(), 3);
    assert_eq!(meta["calibration"][1]["vacuum"]["x"], 150);
}

#[test]
fn render_flags_override_config() {
    let dir = TempDir::new().unwrap();
    write_fixture(&dir.path().join("map.json"), APARTMENT.as_bytes());
    write_fixture(
        &dir.path().join("config.yml"),
        b"log_level: warn\nmap:\n  scale: 2\n  rotate: 1\n",
    );

    cmd(&dir)
        .args(["render", "map.json"])
        .assert()
        .success();
    let image = image::open(dir.path().join("map.png")).unwrap();
    assert_eq!((image.width(), image.height()), (12, 44));

    cmd(&dir)
        .args(["render", "map.json", "--scale", "1", "--rotate", "0", "-o", "flat.png"])
        .assert()
        .success();
    let image = image::open(dir.path().join("flat.png")).unwrap();
    assert_eq!((image.width(), image.height()), (22, 6));
}

#[test]
fn explicit_config_path_is_used() {
    let dir = TempDir::new().unwrap();
    write_fixture(&dir.path().join("map.json"), FLOOR_3X3.as_bytes());
    write_fixture(&dir.path().join("custom.yml"), b"map:\n  scale: 3\n");

    cmd(&dir)
        .args(["-c", "custom.yml", "render", "map.json", "-o", "floor.png"])
        .assert()
        .success();
    let image = image::open(dir.path().join("floor.png")).unwrap();
    assert_eq!((image.width(), image.height()), (9, 9));
}

#[test]
fn invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    write_fixture(&dir.path().join("map.json"), FLOOR_3X3.as_bytes());
    write_fixture(&dir.path().join("config.yml"), b"map:\n  png_compression: 9\n");

    cmd(&dir)
        .args(["render", "map.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("png_compression"));
}

#[test]
fn scale_out_of_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_fixture(&dir.path().join("map.json"), FLOOR_3X3.as_bytes());

    cmd(&dir)
        .args(["render", "map.json", "--scale", "0"])
        .assert()
        .failure();
}

#[test]
fn missing_input_fails() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["render", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn empty_map_fails() {
    let dir = TempDir::new().unwrap();
    write_fixture(
        &dir.path().join("empty.json"),
        br#"{"pixelSize":5,"layers":[],"entities":[]}"#,
    );
    cmd(&dir)
        .args(["render", "empty.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no layers"));
}

#[test]
fn decode_png_payload_to_stdout() {
    let dir = TempDir::new().unwrap();
    write_fixture(
        &dir.path().join("map.png"),
        &proptest_helpers::map_png(FLOOR_3X3.as_bytes()),
    );

    cmd(&dir)
        .args(["decode", "map.png"])
        .assert()
        .success()
        .stdout(FLOOR_3X3);
}

#[test]
fn decode_zlib_payload_to_file() {
    let dir = TempDir::new().unwrap();
    write_fixture(
        &dir.path().join("map.bin"),
        &proptest_helpers::zlib(APARTMENT.as_bytes()),
    );

    cmd(&dir)
        .args(["decode", "map.bin", "-o", "map.json"])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(dir.path().join("map.json")).unwrap(),
        APARTMENT
    );
}

#[test]
fn decode_truncated_png_fails() {
    let dir = TempDir::new().unwrap();
    let mut data = proptest_helpers::map_png(FLOOR_3X3.as_bytes());
    data.truncate(20);
    write_fixture(&dir.path().join("map.png"), &data);

    cmd(&dir)
        .args(["decode", "map.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IEND"));
}

#[test]
fn inspect_summarizes_map() {
    let dir = TempDir::new().unwrap();
    write_fixture(&dir.path().join("map.json"), APARTMENT.as_bytes());

    cmd(&dir)
        .args(["inspect", "map.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pixel size: 5"))
        .stdout(predicate::str::contains("Layers: floor=1, segment=2, wall=1"))
        .stdout(predicate::str::contains("go_to_target=1"))
        .stdout(predicate::str::contains("Robot bounds: (9, 9)..(30, 14), 22x6 cells"))
        .stdout(predicate::str::contains("Kitchen"))
        .stdout(predicate::str::contains("Hall"));
}
