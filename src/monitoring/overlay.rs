use crate::global_variables::FRAME_SIZE;
use crate::intersection_model::geometry::{Rect, Segment};
use crate::intersection_model::layout::IntersectionLayout;
use crate::intersection_model::lanes::Side;
use crate::pipeline::frame_processor::Annotation;
use crate::shared_data::DetectionClass;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;

const LANE_LINE: RGBColor = RGBColor(0, 200, 0);
const STOP_LINE: RGBColor = RGBColor(220, 0, 0);
const CLOSED_STOP_LINE: RGBColor = RGBColor(255, 140, 0);
const VEHICLE_BOX: RGBColor = RGBColor(0, 0, 220);
const PEDESTRIAN_BOX: RGBColor = RGBColor(200, 0, 200);

fn segment_points(segment: &Segment) -> Vec<(i32, i32)> {
    vec![(segment.0.x(), segment.0.y()), (segment.1.x(), segment.1.y())]
}

fn rect_corners(rect: &Rect) -> [(i32, i32); 2] {
    [(rect.x, rect.y), (rect.right(), rect.bottom())]
}

/// Draws the intersection geometry and one frame's annotations to a PNG.
/// Stop lines of sides closed to vehicles are drawn in orange.
pub fn render_overlay(
    path: &Path,
    layout: &IntersectionLayout,
    closed_sides: &BTreeMap<Side, bool>,
    annotations: &[Annotation],
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, FRAME_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    for line in &layout.boundary_lines {
        root.draw(&PathElement::new(segment_points(line), LANE_LINE.stroke_width(2)))?;
    }

    for (side, line) in &layout.stop_lines {
        let color = if closed_sides.get(side).copied().unwrap_or(false) {
            CLOSED_STOP_LINE
        } else {
            STOP_LINE
        };
        root.draw(&PathElement::new(segment_points(line), color.stroke_width(3)))?;
    }

    let label_style = TextStyle::from(("sans-serif", 12).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    for (lane, midpoint) in &layout.lane_midpoints {
        root.draw(&Text::new(
            lane.to_string(),
            (midpoint.x(), midpoint.y()),
            label_style.clone(),
        ))?;
    }

    for annotation in annotations {
        let color = match annotation.class {
            DetectionClass::Vehicle => VEHICLE_BOX,
            DetectionClass::Pedestrian => PEDESTRIAN_BOX,
        };
        root.draw(&Rectangle::new(rect_corners(&annotation.bounds), color.stroke_width(2)))?;
        root.draw(&Text::new(
            annotation.label.clone(),
            (annotation.bounds.x, annotation.bounds.y.saturating_sub(10)),
            TextStyle::from(("sans-serif", 12).into_font()).color(&color),
        ))?;
    }

    root.present()?;
    log::info!("Intersection overlay saved to {}", path.display());
    Ok(())
}
