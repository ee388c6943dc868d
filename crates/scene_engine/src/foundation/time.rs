//! Time management utilities

/// Playback clock that drives scene animation
///
/// Time only advances through [`AnimationClock::advance`], so frame loops and
/// tests control it explicitly.
#[derive(Debug, Clone)]
pub struct AnimationClock {
    time: f32,
    duration: f32,
    playing: bool,
    looping: bool,
}

impl AnimationClock {
    /// Create a playing, looping clock over `duration` seconds
    pub fn new(duration: f32) -> Self {
        Self {
            time: 0.0,
            duration: duration.max(0.0),
            playing: true,
            looping: true,
        }
    }

    /// Advance by `delta` seconds and return the new playback time
    pub fn advance(&mut self, delta: f32) -> f32 {
        if !self.playing {
            return self.time;
        }

        self.time += delta;
        if self.looping && self.duration > 0.0 {
            self.time = self.time.rem_euclid(self.duration);
        }
        self.time
    }

    /// Jump to an absolute time
    pub fn seek(&mut self, time: f32) {
        self.time = time;
    }

    /// Current playback time
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Pause or resume playback
    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Whether the clock advances
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Enable or disable wrap-around at the end of the duration
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }
}
