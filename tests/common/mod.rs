#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// One 3x3 floor block at grid (100, 200), no entities.
pub const FLOOR_3X3: &str = r#"{
    "__class": "ValetudoMap",
    "pixelSize": 5,
    "layers": [{"type": "floor", "compressedPixels": [100, 200, 3, 100, 201, 3, 100, 202, 3]}],
    "entities": []
}"#;

/// A small apartment: floor, walls, two rooms and every drawable entity.
pub const APARTMENT: &str = r#"{
    "__class": "ValetudoMap",
    "metaData": {"version": 2, "nonce": "0d6a5c54"},
    "size": {"x": 5120, "y": 5120},
    "pixelSize": 5,
    "layers": [
        {"type": "floor", "compressedPixels": [10, 10, 20, 10, 11, 20, 10, 12, 20, 10, 13, 20]},
        {"type": "wall", "compressedPixels": [9, 9, 22, 9, 14, 22]},
        {"type": "segment", "metaData": {"segmentId": "16", "name": "Kitchen", "active": false},
         "dimensions": {"x": {"min": 10, "max": 19, "mid": 15, "avg": 15},
                        "y": {"min": 10, "max": 13, "mid": 12, "avg": 12}, "pixelCount": 40},
         "compressedPixels": [10, 10, 10, 10, 11, 10, 10, 12, 10, 10, 13, 10]},
        {"type": "segment", "metaData": {"segmentId": "17", "name": "Hall"},
         "dimensions": {"x": {"min": 20, "max": 29, "mid": 25, "avg": 25},
                        "y": {"min": 10, "max": 13, "mid": 12, "avg": 12}, "pixelCount": 40},
         "compressedPixels": [20, 10, 10, 20, 11, 10, 20, 12, 10, 20, 13, 10]}
    ],
    "entities": [
        {"type": "path", "points": [60, 55, 100, 55, 100, 65], "metaData": {}},
        {"type": "virtual_wall", "points": [120, 50, 120, 70]},
        {"type": "no_go_area", "points": [130, 50, 145, 50, 145, 60, 130, 60]},
        {"type": "charger_location", "points": [55, 55]},
        {"type": "robot_position", "points": [100, 65], "metaData": {"angle": 90}},
        {"type": "go_to_target", "points": [80, 60]}
    ]
}"#;

pub fn write_fixture(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write fixture");
}
