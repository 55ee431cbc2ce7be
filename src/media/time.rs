//! Elapsed/remaining labels, progress fraction and click-to-seek

/// Format seconds as `M:SS`; minutes are unbounded
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// What the progress bar and time labels show
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub elapsed: String,
    pub remaining: String,
    /// Played share of the track, in [0, 1]
    pub fraction: f64,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            elapsed: format_time(0.0),
            remaining: format_time(0.0),
            fraction: 0.0,
        }
    }
}

/// Progress for a media element at `current` seconds
///
/// Without a known, positive duration everything reads zero.
pub fn progress(current: f64, duration: Option<f64>) -> Progress {
    match duration {
        Some(duration) if duration.is_finite() && duration > 0.0 => Progress {
            elapsed: format_time(current),
            remaining: format_time(duration - current),
            fraction: (current / duration).clamp(0.0, 1.0),
        },
        _ => Progress::default(),
    }
}

/// Playback position for a click `x` cells into a control `width` wide
pub fn seek_position(x: f64, width: f64, duration: f64) -> Option<f64> {
    if !(width > 0.0) || !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    Some(((x / width) * duration).clamp(0.0, duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(5.0), "0:05");
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.9), "0:59");
        assert_eq!(format_time(3671.0), "61:11");
    }

    #[test]
    fn test_format_time_degenerate_input() {
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn test_progress_labels_and_fraction() {
        let p = progress(30.0, Some(120.0));
        assert_eq!(p.elapsed, "0:30");
        assert_eq!(p.remaining, "1:30");
        assert!((p.fraction - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_clamps_fraction() {
        assert_eq!(progress(130.0, Some(120.0)).fraction, 1.0);
        assert_eq!(progress(5.0, None), Progress::default());
    }

    #[test]
    fn test_seek_edges() {
        assert_eq!(seek_position(0.0, 40.0, 200.0), Some(0.0));
        assert_eq!(seek_position(40.0, 40.0, 200.0), Some(200.0));
        assert_eq!(seek_position(10.0, 40.0, 200.0), Some(50.0));
        assert_eq!(seek_position(55.0, 40.0, 200.0), Some(200.0));
        assert_eq!(seek_position(-2.0, 40.0, 200.0), Some(0.0));
    }

    #[test]
    fn test_seek_needs_duration_and_width() {
        assert_eq!(seek_position(5.0, 0.0, 200.0), None);
        assert_eq!(seek_position(5.0, 40.0, f64::NAN), None);
    }
}
