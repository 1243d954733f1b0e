use std::cmp::Ordering;

use tracing::{debug, error};

use crate::error::DiagramError;

use super::{Point, Size};

#[derive(Debug, Clone)]
struct Region {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    children: Option<[usize; 2]>,
    used: bool,
}

impl Region {
    fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            children: None,
            used: false,
        }
    }
}

/// Guillotine packer: a binary tree of free regions kept in an arena. Index 0 is the root.
#[derive(Debug, Clone)]
pub struct Packer {
    regions: Vec<Region>,
}

impl Packer {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            regions: vec![Region::new(0.0, 0.0, width, height)],
        }
    }

    /// Finds a free spot for a `width` x `height` box and claims it.
    pub fn place(&mut self, width: f32, height: f32) -> Option<Point> {
        self.place_in(0, width, height)
    }

    fn place_in(&mut self, idx: usize, width: f32, height: f32) -> Option<Point> {
        let region = self.regions.get(idx)?.clone();
        if let Some([first, second]) = region.children {
            return self
                .place_in(first, width, height)
                .or_else(|| self.place_in(second, width, height));
        }

        if region.used || width > region.width || height > region.height {
            return None;
        }
        if width == region.width && height == region.height {
            self.regions[idx].used = true;
            return Some(Point::new(region.x, region.y));
        }

        let slack_w = region.width - width;
        let slack_h = region.height - height;
        let (exact, rest) = if slack_w > slack_h {
            (
                Region::new(region.x, region.y, width, region.height),
                Region::new(region.x + width, region.y, slack_w, region.height),
            )
        } else {
            (
                Region::new(region.x, region.y, region.width, height),
                Region::new(region.x, region.y + height, region.width, slack_h),
            )
        };
        let first = self.regions.len();
        self.regions.push(exact);
        self.regions.push(rest);
        self.regions[idx].children = Some([first, first + 1]);
        self.place_in(first, width, height)
    }
}

/// Side of a square envelope that can always hold `sizes`: every box can be stacked
/// along its larger dimension, so the sum of those dimensions never runs out of room.
pub fn envelope_side(sizes: &[Size]) -> f32 {
    sizes
        .iter()
        .map(|size| size.width.max(size.height).max(0.0))
        .sum()
}

/// Packs boxes largest-area first and returns each box's top-left corner in input order.
pub fn pack_boxes(sizes: &[Size]) -> Result<Vec<Point>, DiagramError> {
    let sizes: Vec<Size> = sizes
        .iter()
        .map(|size| Size::new(size.width.max(0.0), size.height.max(0.0)))
        .collect();
    let side = envelope_side(&sizes);
    debug!(boxes = sizes.len(), side, "packing components");

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| {
        sizes[b]
            .area()
            .partial_cmp(&sizes[a].area())
            .unwrap_or(Ordering::Equal)
    });

    let mut packer = Packer::new(side, side);
    let mut placements = vec![Point::default(); sizes.len()];
    for idx in order {
        let size = sizes[idx];
        match packer.place(size.width, size.height) {
            Some(point) => placements[idx] = point,
            None => {
                error!(
                    width = size.width,
                    height = size.height,
                    side,
                    "packing envelope too small"
                );
                return Err(DiagramError::PackingOverflow {
                    width: size.width,
                    height: size.height,
                });
            }
        }
    }
    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Bounds;

    fn placed(sizes: &[Size]) -> Vec<Bounds> {
        let points = pack_boxes(sizes).unwrap();
        points
            .iter()
            .zip(sizes)
            .map(|(p, s)| Bounds::from_rect(p.x, p.y, s.width, s.height))
            .collect()
    }

    fn assert_disjoint(boxes: &[Bounds]) {
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn exact_fit_claims_whole_region() {
        let mut packer = Packer::new(10.0, 20.0);
        assert_eq!(packer.place(10.0, 20.0), Some(Point::new(0.0, 0.0)));
        assert_eq!(packer.place(1.0, 1.0), None);
    }

    #[test]
    fn oversized_box_is_refused() {
        let mut packer = Packer::new(10.0, 10.0);
        assert_eq!(packer.place(11.0, 5.0), None);
        assert_eq!(packer.place(5.0, 11.0), None);
        assert_eq!(packer.place(5.0, 5.0), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn split_follows_larger_slack() {
        let mut packer = Packer::new(100.0, 40.0);
        assert_eq!(packer.place(30.0, 40.0), Some(Point::new(0.0, 0.0)));
        // width slack was larger, so the remainder sits to the right
        assert_eq!(packer.place(70.0, 40.0), Some(Point::new(30.0, 0.0)));

        let mut packer = Packer::new(40.0, 100.0);
        assert_eq!(packer.place(40.0, 30.0), Some(Point::new(0.0, 0.0)));
        assert_eq!(packer.place(40.0, 70.0), Some(Point::new(0.0, 30.0)));
    }

    #[test]
    fn three_components_pack_without_overlap() {
        let sizes = [
            Size::new(100.0, 50.0),
            Size::new(80.0, 80.0),
            Size::new(40.0, 200.0),
        ];
        let boxes = placed(&sizes);
        assert_eq!(boxes.len(), 3);
        assert_disjoint(&boxes);
        let side = envelope_side(&sizes);
        for (b, s) in boxes.iter().zip(&sizes) {
            assert_eq!(b.size(), *s);
            assert!(b.min_x >= 0.0 && b.min_y >= 0.0);
            assert!(b.max_x <= side && b.max_y <= side);
        }
        let occupied: f32 = boxes.iter().map(|b| b.width() * b.height()).sum();
        let expected: f32 = sizes.iter().map(|s| s.area()).sum();
        assert_eq!(occupied, expected);
    }

    #[test]
    fn many_mixed_boxes_all_placed() {
        let sizes: Vec<Size> = (1..40)
            .map(|i| Size::new(((i * 37) % 90 + 5) as f32, ((i * 53) % 70 + 5) as f32))
            .collect();
        let boxes = placed(&sizes);
        assert_eq!(boxes.len(), sizes.len());
        assert_disjoint(&boxes);
    }

    #[test]
    fn degenerate_inputs_still_place() {
        let sizes = [Size::new(0.0, 0.0), Size::new(12.5, 0.0), Size::new(3.0, 3.0)];
        let points = pack_boxes(&sizes).unwrap();
        assert_eq!(points.len(), 3);
        assert!(pack_boxes(&[]).unwrap().is_empty());
    }
}
