//! Static anatomical spot table for the body diagram.
//!
//! The diagram is a 200 x 500 canvas; every spot id the assistant may emit has fixed
//! coordinates and a human-readable title.

use serde::Serialize;

pub const DIAGRAM_WIDTH: f64 = 200.0;
pub const DIAGRAM_HEIGHT: f64 = 500.0;

/// Multiplier applied to the centering offset so the zoomed view exaggerates the pan.
const ZOOM_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spot {
    pub id: u32,
    pub title: &'static str,
    pub x: f64,
    pub y: f64,
}

/// Pan offset that brings a spot to the center of the zoomed diagram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomOffset {
    pub zx: f64,
    pub zy: f64,
}

impl Spot {
    pub fn zoom_offset(&self) -> ZoomOffset {
        ZoomOffset {
            zx: (DIAGRAM_WIDTH / 2.0 - self.x) * ZOOM_FACTOR,
            zy: (DIAGRAM_HEIGHT / 2.0 - self.y) * ZOOM_FACTOR,
        }
    }
}

const fn spot(id: u32, title: &'static str, x: f64, y: f64) -> Spot {
    Spot { id, title, x, y }
}

pub static SPOTS: [Spot; 30] = [
    spot(1, "Head", 100.0, 30.0),
    spot(2, "Forehead", 100.0, 45.0),
    spot(3, "Face", 100.0, 60.0),
    spot(4, "Jaw", 100.0, 75.0),
    spot(5, "Neck", 100.0, 92.0),
    spot(6, "Back of Neck", 100.0, 100.0),
    spot(7, "Left Chest", 80.0, 140.0),
    spot(8, "Chest", 100.0, 140.0),
    spot(9, "Right Chest", 120.0, 140.0),
    spot(10, "Upper Abdomen", 100.0, 185.0),
    spot(11, "Abdomen", 100.0, 210.0),
    spot(12, "Lower Abdomen", 100.0, 235.0),
    spot(13, "Left Shoulder", 62.0, 120.0),
    spot(14, "Right Shoulder", 138.0, 120.0),
    spot(15, "Left Upper Arm", 52.0, 160.0),
    spot(16, "Right Upper Arm", 148.0, 160.0),
    spot(17, "Left Forearm", 44.0, 210.0),
    spot(18, "Right Forearm", 156.0, 210.0),
    spot(19, "Left Hand", 38.0, 255.0),
    spot(20, "Right Hand", 162.0, 255.0),
    spot(21, "Left Hip", 82.0, 265.0),
    spot(22, "Right Hip", 118.0, 265.0),
    spot(23, "Left Thigh", 82.0, 310.0),
    spot(24, "Right Thigh", 118.0, 310.0),
    spot(25, "Left Knee", 84.0, 355.0),
    spot(26, "Right Knee", 116.0, 355.0),
    spot(27, "Left Shin", 86.0, 410.0),
    spot(28, "Right Shin", 114.0, 410.0),
    spot(29, "Left Foot", 86.0, 470.0),
    spot(30, "Right Foot", 114.0, 470.0),
];

pub fn lookup(id: u32) -> Option<&'static Spot> {
    SPOTS.iter().find(|s| s.id == id)
}
