//! Hand skeleton geometry for visualization.

use crate::{
    frame::FrameSize,
    landmark::{HandLandmarks, Landmark, HAND_LANDMARKS},
};

/// Landmark index pairs joined by bones, per finger, then the palm edge.
#[rustfmt::skip]
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (17, 18), (18, 19), (19, 20),
    (0, 17),
];

/// Integer pixel position of a landmark, truncated towards zero.
pub fn pixel_position(landmark: &Landmark, size: FrameSize) -> (i32, i32) {
    (
        (f64::from(landmark.x) * f64::from(size.width)) as i32,
        (f64::from(landmark.y) * f64::from(size.height)) as i32,
    )
}

pub fn pixel_positions(hand: &HandLandmarks, size: FrameSize) -> [(i32, i32); HAND_LANDMARKS] {
    let mut positions = [(0, 0); HAND_LANDMARKS];
    for (position, landmark) in positions.iter_mut().zip(hand.points()) {
        *position = pixel_position(landmark, size);
    }
    positions
}

/// Line segments of a hand skeleton in pixels.
pub fn bones(hand: &HandLandmarks, size: FrameSize) -> Vec<((i32, i32), (i32, i32))> {
    let positions = pixel_positions(hand, size);
    HAND_CONNECTIONS
        .iter()
        .map(|&(start, end)| (positions[start], positions[end]))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Bounding box of all landmarks grown by `margin`, clamped to the frame.
///
/// `None` if there are no hands or the clamped box is empty.
pub fn landmark_bounds(hands: &[HandLandmarks], size: FrameSize, margin: i32) -> Option<PixelRect> {
    let mut positions = hands
        .iter()
        .flat_map(|hand| pixel_positions(hand, size).to_vec());

    let first = positions.next()?;
    let (min, max) = positions.fold((first, first), |(min, max), (x, y)| {
        ((min.0.min(x), min.1.min(y)), (max.0.max(x), max.1.max(y)))
    });

    let x1 = (min.0 - margin).max(0);
    let y1 = (min.1 - margin).max(0);
    let x2 = (max.0 + margin).min(size.width as i32 - 1);
    let y2 = (max.1 + margin).min(size.height as i32 - 1);

    if x2 > x1 && y2 > y1 {
        Some(PixelRect {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Handedness;

    const SIZE: FrameSize = FrameSize::new(640, 480);

    fn hand_at(x: f32, y: f32) -> HandLandmarks {
        HandLandmarks::new(Handedness::Right, [Landmark::new(x, y, 0.0); HAND_LANDMARKS])
    }

    #[test]
    fn connections_cover_every_landmark() {
        let mut seen = [false; HAND_LANDMARKS];
        for &(a, b) in HAND_CONNECTIONS.iter() {
            seen[a] = true;
            seen[b] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn pixel_positions_truncate() {
        assert_eq!(pixel_position(&Landmark::new(0.5, 0.5, 0.3), SIZE), (320, 240));
        assert_eq!(pixel_position(&Landmark::new(0.0999, 0.999, 0.0), SIZE), (63, 479));
        assert_eq!(bones(&hand_at(0.25, 0.25), SIZE).len(), HAND_CONNECTIONS.len());
    }

    #[test]
    fn bounds_are_clamped() {
        let bounds = landmark_bounds(&[hand_at(0.5, 0.5)], SIZE, 40).unwrap();
        assert_eq!(
            bounds,
            PixelRect {
                x: 280,
                y: 200,
                width: 80,
                height: 80
            }
        );

        let corner = landmark_bounds(&[hand_at(0.0, 0.0), hand_at(0.1, 0.1)], SIZE, 40).unwrap();
        assert_eq!(corner.x, 0);
        assert_eq!(corner.y, 0);
        assert_eq!(corner.width, 64 + 40);

        assert!(landmark_bounds(&[], SIZE, 40).is_none());
        assert!(landmark_bounds(&[hand_at(2.0, 2.0)], SIZE, 40).is_none());
    }
}
