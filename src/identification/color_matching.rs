use crate::entities::Vehicle;
use crate::global_variables::COLOR_TOLERANCE;
use crate::intersection_model::geometry::Rect;

/// A pixel in the camera's BGR channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bgr(pub [u8; 3]);

impl Bgr {
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        Bgr([rgb[2], rgb[1], rgb[0]])
    }
}

/// A captured camera frame as a dense row-major BGR raster.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Bgr>,
}

impl Frame {
    pub fn new(width: u32, height: u32, fill: Bgr) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    // Clips `bounds` to the frame, as half-open pixel ranges.
    fn clip(&self, bounds: &Rect) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let clamp_x = |v: i32| v.clamp(0, self.width as i32) as usize;
        let clamp_y = |v: i32| v.clamp(0, self.height as i32) as usize;
        (
            clamp_x(bounds.x)..clamp_x(bounds.right()),
            clamp_y(bounds.y)..clamp_y(bounds.bottom()),
        )
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Bgr> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Fills the part of `bounds` that lies inside the frame.
    pub fn paint(&mut self, bounds: &Rect, color: Bgr) {
        let (xs, ys) = self.clip(bounds);
        let width = self.width as usize;
        for y in ys {
            for x in xs.clone() {
                self.pixels[y * width + x] = color;
            }
        }
    }

    /// Pixels under `bounds`, clipped to the frame.
    pub fn region(&self, bounds: &Rect) -> impl Iterator<Item = Bgr> + '_ {
        let (xs, ys) = self.clip(bounds);
        let width = self.width as usize;
        ys.flat_map(move |y| {
            let row = y * width;
            xs.clone().map(move |x| self.pixels[row + x])
        })
    }
}

/// Whether every channel of `pixel` lies within `tolerance` of the RGB `signature`.
pub fn matches_signature(pixel: Bgr, signature: [u8; 3], tolerance: u8) -> bool {
    let target = Bgr::from_rgb(signature);
    pixel
        .0
        .iter()
        .zip(target.0.iter())
        .all(|(channel, reference)| channel.abs_diff(*reference) <= tolerance)
}

/// Finds the first fleet vehicle whose color appears anywhere under `bounds`.
/// `None` means the detection stays unidentified.
pub fn identify_vehicle<'a>(frame: &Frame, bounds: &Rect, fleet: &'a [Vehicle]) -> Option<&'a Vehicle> {
    fleet.iter().find(|vehicle| {
        frame
            .region(bounds)
            .any(|pixel| matches_signature(pixel, vehicle.color_signature, COLOR_TOLERANCE))
    })
}
