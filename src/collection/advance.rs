//! Advance policies for timer ticks and track ends

use rand::Rng;

/// Player toggles, per player instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackMode {
    pub shuffle: bool,
    /// Loop back to the first track after the last one
    pub repeat_at_end: bool,
}

/// How the cursor moves on an autonomous advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancePolicy {
    /// Gallery slideshow: step forward, always wrap
    Wrap,
    /// Playlist: honor shuffle and repeat-at-end
    Playlist(PlaybackMode),
}

/// Outcome of an advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Move to this index
    To(usize),
    /// At the last entry with nowhere to go; playback halts
    StopAtEnd,
}

/// Pick the entry after `current` in a list of `len` entries
///
/// Returns `None` for an empty list. Shuffle only applies before the last
/// entry; the last entry always follows the repeat rule.
pub fn next_index<R: Rng>(
    current: usize,
    len: usize,
    policy: AdvancePolicy,
    rng: &mut R,
) -> Option<Advance> {
    if len == 0 {
        return None;
    }
    let last = len - 1;
    let current = current.min(last);

    let advance = match policy {
        AdvancePolicy::Wrap if current == last => Advance::To(0),
        AdvancePolicy::Wrap => Advance::To(current + 1),
        AdvancePolicy::Playlist(mode) if current == last => {
            if mode.repeat_at_end {
                Advance::To(0)
            } else {
                Advance::StopAtEnd
            }
        }
        AdvancePolicy::Playlist(mode) if mode.shuffle => Advance::To(rng.gen_range(0..len)),
        AdvancePolicy::Playlist(_) => Advance::To(current + 1),
    };
    Some(advance)
}

/// Entry before `current`, clamped at the first one
pub fn previous_index(current: usize) -> usize {
    current.saturating_sub(1)
}

/// Enabled state of the player's navigation controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationInfo {
    pub has_previous: bool,
    pub has_next: bool,
    pub current_index: Option<usize>,
    pub total_count: usize,
}

impl NavigationInfo {
    pub fn for_playlist(current_index: Option<usize>, total_count: usize, mode: PlaybackMode) -> Self {
        match current_index {
            Some(index) if total_count > 0 => Self {
                has_previous: index > 0,
                has_next: index + 1 < total_count || mode.repeat_at_end,
                current_index,
                total_count,
            },
            _ => Self {
                total_count,
                ..Self::default()
            },
        }
    }
}
