//! Detector output: raw wire format and validated landmark sets.

use std::{convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Number of landmarks in a hand skeleton.
pub const HAND_LANDMARKS: usize = 21;

/// Pose landmark indices of the shoulders.
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;

/// A keypoint as reported by the detector.
///
/// `x` and `y` are normalized to `[0, 1]` of the frame width and height, `z` is a depth estimate
/// relative to the hand's wrist.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn from_coords([x, y, z]: [f32; 3]) -> Option<Self> {
        if x.is_finite() && y.is_finite() && z.is_finite() {
            Some(Self { x, y, z })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl FromStr for Handedness {
    type Err = ();

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        if label.eq_ignore_ascii_case("left") {
            Ok(Handedness::Left)
        } else if label.eq_ignore_ascii_case("right") {
            Ok(Handedness::Right)
        } else {
            Err(())
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => f.write_str("Left"),
            Handedness::Right => f.write_str("Right"),
        }
    }
}

/// The 21 landmarks of one detected hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    handedness: Handedness,
    points: [Landmark; HAND_LANDMARKS],
}

impl HandLandmarks {
    pub fn new(handedness: Handedness, points: [Landmark; HAND_LANDMARKS]) -> Self {
        Self { handedness, points }
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn points(&self) -> &[Landmark; HAND_LANDMARKS] {
        &self.points
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoseLandmarks {
    points: Vec<Landmark>,
}

impl PoseLandmarks {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// Returns the left and right shoulder, if the pose has both.
    pub fn shoulders(&self) -> Option<(Landmark, Landmark)> {
        Some((
            *self.points.get(LEFT_SHOULDER)?,
            *self.points.get(RIGHT_SHOULDER)?,
        ))
    }
}

/// One hand as it arrives from the detector, before validation.
///
/// Points are kept as plain lists so that a reply with the wrong number of coordinates still
/// parses and can be rejected per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHand {
    pub handedness: String,
    pub landmarks: Vec<Vec<f32>>,
}

/// Detector output as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawDetection {
    #[serde(default)]
    pub hands: Vec<RawHand>,
    #[serde(default)]
    pub pose: Option<Vec<Vec<f32>>>,
}

/// Reasons a [`RawDetection`] is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedDetection {
    LandmarkCount { hand: usize, found: usize },
    CoordinateCount { hand: usize, landmark: usize, found: usize },
    PoseCoordinateCount { landmark: usize, found: usize },
    Handedness { hand: usize, label: String },
    NonFiniteHand { hand: usize },
    NonFinitePose,
}

impl fmt::Display for MalformedDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedDetection::LandmarkCount { hand, found } => write!(
                f,
                "hand {hand} has {found} landmarks, expected {HAND_LANDMARKS}"
            ),
            MalformedDetection::CoordinateCount {
                hand,
                landmark,
                found,
            } => write!(
                f,
                "hand {hand} landmark {landmark} has {found} coordinates, expected 3"
            ),
            MalformedDetection::PoseCoordinateCount { landmark, found } => write!(
                f,
                "pose landmark {landmark} has {found} coordinates, expected 3"
            ),
            MalformedDetection::Handedness { hand, label } => {
                write!(f, "hand {hand} has unknown handedness {label:?}")
            }
            MalformedDetection::NonFiniteHand { hand } => {
                write!(f, "hand {hand} has non-finite coordinates")
            }
            MalformedDetection::NonFinitePose => f.write_str("pose has non-finite coordinates"),
        }
    }
}

impl std::error::Error for MalformedDetection {}

/// Validated detector output for one frame.
///
/// Hands are kept in detector order, including hands that share a handedness label.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Detection {
    hands: Vec<HandLandmarks>,
    pose: Option<PoseLandmarks>,
}

impl Detection {
    pub fn new(hands: Vec<HandLandmarks>, pose: Option<PoseLandmarks>) -> Self {
        Self { hands, pose }
    }

    pub fn hands(&self) -> &[HandLandmarks] {
        &self.hands
    }

    pub fn pose(&self) -> Option<&PoseLandmarks> {
        self.pose.as_ref()
    }

    /// Collapses the detected hands into at most one hand per side.
    ///
    /// When two hands report the same handedness, the later one in detector order wins.
    pub fn observation(&self) -> HandObservation<'_> {
        if self.hands.is_empty() {
            return HandObservation::NoDetection;
        }

        let mut left = None;
        let mut right = None;
        for hand in &self.hands {
            match hand.handedness {
                Handedness::Left => left = Some(hand),
                Handedness::Right => right = Some(hand),
            }
        }

        HandObservation::HandSet { left, right }
    }
}

impl TryFrom<RawDetection> for Detection {
    type Error = MalformedDetection;

    fn try_from(raw: RawDetection) -> Result<Self, Self::Error> {
        let mut hands = Vec::with_capacity(raw.hands.len());

        for (index, raw_hand) in raw.hands.into_iter().enumerate() {
            let handedness = raw_hand.handedness.parse().map_err(|_| {
                MalformedDetection::Handedness {
                    hand: index,
                    label: raw_hand.handedness.clone(),
                }
            })?;

            if raw_hand.landmarks.len() != HAND_LANDMARKS {
                return Err(MalformedDetection::LandmarkCount {
                    hand: index,
                    found: raw_hand.landmarks.len(),
                });
            }

            let mut points = [Landmark::default(); HAND_LANDMARKS];
            for (landmark, (point, coords)) in
                points.iter_mut().zip(&raw_hand.landmarks).enumerate()
            {
                let coords = xyz(coords).ok_or(MalformedDetection::CoordinateCount {
                    hand: index,
                    landmark,
                    found: coords.len(),
                })?;
                *point = Landmark::from_coords(coords)
                    .ok_or(MalformedDetection::NonFiniteHand { hand: index })?;
            }

            hands.push(HandLandmarks { handedness, points });
        }

        let pose = match raw.pose {
            Some(raw_points) if !raw_points.is_empty() => {
                let mut points = Vec::with_capacity(raw_points.len());
                for (landmark, coords) in raw_points.iter().enumerate() {
                    let coords = xyz(coords).ok_or(MalformedDetection::PoseCoordinateCount {
                        landmark,
                        found: coords.len(),
                    })?;
                    points.push(
                        Landmark::from_coords(coords).ok_or(MalformedDetection::NonFinitePose)?,
                    );
                }
                Some(PoseLandmarks { points })
            }
            _ => None,
        };

        Ok(Detection { hands, pose })
    }
}

fn xyz(coords: &[f32]) -> Option<[f32; 3]> {
    coords.try_into().ok()
}

/// Which hands a frame contains, after duplicate handedness has been resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandObservation<'a> {
    NoDetection,
    HandSet {
        left: Option<&'a HandLandmarks>,
        right: Option<&'a HandLandmarks>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_hand(label: &str, x: f32) -> RawHand {
        RawHand {
            handedness: label.to_string(),
            landmarks: vec![vec![x, 0.5, 0.0]; HAND_LANDMARKS],
        }
    }

    #[test]
    fn parses_wire_json() {
        let json = r#"{"hands":[{"handedness":"Left","landmarks":[[0.1,0.2,0.3]]}],"pose":null}"#;
        let raw: RawDetection = serde_json::from_str(json).unwrap();
        assert_eq!(raw.hands.len(), 1);
        assert_eq!(raw.hands[0].landmarks, vec![vec![0.1, 0.2, 0.3]]);
        assert!(raw.pose.is_none());

        let empty: RawDetection = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, RawDetection::default());
    }

    #[test]
    fn handedness_is_case_insensitive() {
        assert_eq!("Left".parse(), Ok(Handedness::Left));
        assert_eq!("RIGHT".parse(), Ok(Handedness::Right));
        assert!("middle".parse::<Handedness>().is_err());
    }

    #[test]
    fn rejects_wrong_landmark_count() {
        let raw = RawDetection {
            hands: vec![RawHand {
                handedness: "Left".to_string(),
                landmarks: vec![vec![0.0; 3]; 20],
            }],
            pose: None,
        };

        assert_eq!(
            Detection::try_from(raw),
            Err(MalformedDetection::LandmarkCount { hand: 0, found: 20 })
        );
    }

    #[test]
    fn rejects_wrong_coordinate_count() {
        let mut hand = raw_hand("Right", 0.4);
        hand.landmarks[5] = vec![0.4, 0.5, 0.0, 0.9];
        let raw = RawDetection {
            hands: vec![hand],
            pose: None,
        };
        assert_eq!(
            Detection::try_from(raw),
            Err(MalformedDetection::CoordinateCount {
                hand: 0,
                landmark: 5,
                found: 4
            })
        );

        let json = r#"{"hands":[],"pose":[[0.5,0.5]]}"#;
        let raw: RawDetection = serde_json::from_str(json).unwrap();
        assert_eq!(
            Detection::try_from(raw),
            Err(MalformedDetection::PoseCoordinateCount {
                landmark: 0,
                found: 2
            })
        );
    }

    #[test]
    fn rejects_unknown_handedness_and_nan() {
        let raw = RawDetection {
            hands: vec![raw_hand("Left", 0.1), raw_hand("Both", 0.2)],
            pose: None,
        };
        assert!(matches!(
            Detection::try_from(raw),
            Err(MalformedDetection::Handedness { hand: 1, .. })
        ));

        let raw = RawDetection {
            hands: vec![raw_hand("Right", f32::NAN)],
            pose: None,
        };
        assert_eq!(
            Detection::try_from(raw),
            Err(MalformedDetection::NonFiniteHand { hand: 0 })
        );

        let raw = RawDetection {
            hands: Vec::new(),
            pose: Some(vec![vec![f32::INFINITY, 0.0, 0.0]]),
        };
        assert_eq!(
            Detection::try_from(raw),
            Err(MalformedDetection::NonFinitePose)
        );
    }

    #[test]
    fn empty_pose_is_absent() {
        let raw = RawDetection {
            hands: Vec::new(),
            pose: Some(Vec::new()),
        };
        let detection = Detection::try_from(raw).unwrap();
        assert!(detection.pose().is_none());
        assert_eq!(detection.observation(), HandObservation::NoDetection);
    }

    #[test]
    fn short_pose_has_no_shoulders() {
        let pose = PoseLandmarks::new(vec![Landmark::default(); RIGHT_SHOULDER]);
        assert!(pose.shoulders().is_none());

        let mut points = vec![Landmark::default(); 33];
        points[LEFT_SHOULDER] = Landmark::new(0.4, 0.3, 0.0);
        points[RIGHT_SHOULDER] = Landmark::new(0.6, 0.3, 0.0);
        let pose = PoseLandmarks::new(points);
        assert_eq!(
            pose.shoulders(),
            Some((Landmark::new(0.4, 0.3, 0.0), Landmark::new(0.6, 0.3, 0.0)))
        );
    }

    #[test]
    fn duplicate_handedness_keeps_the_later_hand() {
        let raw = RawDetection {
            hands: vec![raw_hand("Left", 0.1), raw_hand("Left", 0.9)],
            pose: None,
        };
        let detection = Detection::try_from(raw).unwrap();
        assert_eq!(detection.hands().len(), 2);

        match detection.observation() {
            HandObservation::HandSet { left, right } => {
                assert_eq!(left.unwrap().points()[0].x, 0.9);
                assert!(right.is_none());
            }
            HandObservation::NoDetection => panic!("expected a hand set"),
        }
    }
}
