/// Chooses which frames of a `total_frames`-long video make up a `desired`-long sample.
///
/// Short videos are read front to back and then hold their last frame. Long videos are
/// subsampled evenly over `[0, total_frames - 1]`, rounding half to even. An empty video yields
/// no indices; the caller pads with zero vectors.
pub fn sample_frame_indices(total_frames: usize, desired: usize) -> Vec<usize> {
    if total_frames == 0 || desired == 0 {
        return Vec::new();
    }

    if total_frames <= desired {
        let last = total_frames - 1;
        return (0..desired).map(|i| i.min(last)).collect();
    }

    linspace(0.0, (total_frames - 1) as f64, desired)
        .map(|value| value.round_ties_even() as usize)
        .collect()
}

/// `num` evenly spaced values over `[start, stop]`, with the last one pinned to `stop`.
fn linspace(start: f64, stop: f64, num: usize) -> impl Iterator<Item = f64> {
    let step = if num > 1 {
        (stop - start) / (num - 1) as f64
    } else {
        0.0
    };

    (0..num).map(move |i| {
        if num > 1 && i == num - 1 {
            stop
        } else {
            start + i as f64 * step
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_video_has_no_indices() {
        assert!(sample_frame_indices(0, 30).is_empty());
    }

    #[test]
    fn short_video_holds_last_frame() {
        assert_eq!(sample_frame_indices(3, 6), vec![0, 1, 2, 2, 2, 2]);
        assert_eq!(sample_frame_indices(1, 3), vec![0, 0, 0]);
        assert_eq!(sample_frame_indices(4, 4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn long_video_is_subsampled_evenly() {
        assert_eq!(sample_frame_indices(10, 4), vec![0, 3, 6, 9]);
        // 0, 1.67, 3.33, 5
        assert_eq!(sample_frame_indices(6, 4), vec![0, 2, 3, 5]);
        assert_eq!(sample_frame_indices(100, 1), vec![0]);
    }

    #[test]
    fn rounds_half_to_even() {
        // 0, 2.5, 5
        assert_eq!(sample_frame_indices(6, 3), vec![0, 2, 5]);
        // 0, 1.5, 3
        assert_eq!(sample_frame_indices(4, 3), vec![0, 2, 3]);
        assert_eq!(
            sample_frame_indices(8, 3),
            vec![0, 4, 7],
            "3.5 rounds to the even 4"
        );
    }

    #[test]
    fn always_returns_desired_indices_in_range() {
        for total in 0..64 {
            for desired in 1..48 {
                let indices = sample_frame_indices(total, desired);

                if total == 0 {
                    assert!(indices.is_empty());
                    continue;
                }

                assert_eq!(indices.len(), desired, "total={total} desired={desired}");
                assert!(indices.iter().all(|&i| i < total));
                assert!(indices.windows(2).all(|w| w[0] <= w[1]));
                assert_eq!(indices[0], 0);

                if total > desired && desired > 1 {
                    assert_eq!(*indices.last().unwrap(), total - 1);
                } else if total > desired {
                    assert_eq!(indices, vec![0]);
                } else {
                    assert!(indices[total - 1..].iter().all(|&i| i == total - 1));
                }
            }
        }
    }
}
