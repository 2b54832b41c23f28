//! Course playback state machine.
//!
//! Progress is simulated: while playing, a ticker fires every
//! [`TICK_INTERVAL_MS`] and each tick adds `PROGRESS_PER_TICK * playback_rate`
//! percent. A slide can be left forward only after its progress reaches
//! [`ADVANCE_THRESHOLD`].
//!
//! The ticker itself lives in the UI. The player hands out a [`TimerLease`]
//! whenever playback starts and revokes it on pause, slide change and slide
//! end; ticks presented with any other lease are dropped, so two tickers can
//! never drive the same player.

use crate::backend::models::Slide;

pub const TICK_INTERVAL_MS: u64 = 100;
pub const PROGRESS_PER_TICK: f64 = 0.5;
pub const ADVANCE_THRESHOLD: f64 = 80.0;
pub const MIN_PLAYBACK_RATE: f64 = 0.5;
pub const MAX_PLAYBACK_RATE: f64 = 2.0;
pub const PLAYBACK_RATES: [f64; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

pub const GATE_NOTICE: &str = "Please watch at least 80% of this slide before moving on.";
pub const LOCKED_NOTICE: &str = "Complete the previous slides first.";
pub const FINISHED_NOTICE: &str = "This slide has finished. Continue to the next one.";

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_index: usize,
    pub is_playing: bool,
    pub progress_percent: f64,
    pub can_advance: bool,
    pub playback_rate: f64,
    pub volume: f64,
    pub is_muted: bool,
    pub show_subtitles: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_index: 0,
            is_playing: false,
            progress_percent: 0.0,
            can_advance: false,
            playback_rate: 1.0,
            volume: 1.0,
            is_muted: false,
            show_subtitles: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Idle,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideStatus {
    Completed,
    Current,
    Available,
    Locked,
}

/// Authorises ticks for one stretch of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerLease(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    TimerStarted(TimerLease),
    TimerStopped,
    SlideChanged(usize),
    GateOpened(usize),
    SlideFinished(usize),
    CourseCompleted,
    Rejected(&'static str),
}

#[derive(Debug, Clone)]
pub struct SlidePlayer {
    slides: Vec<Slide>,
    state: PlaybackState,
    lease: Option<TimerLease>,
    next_lease: u64,
}

impl SlidePlayer {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self {
            slides,
            state: PlaybackState::default(),
            lease: None,
            next_lease: 0,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        self.slides.get(self.state.current_index)
    }

    pub fn is_last_slide(&self) -> bool {
        !self.slides.is_empty() && self.state.current_index == self.slides.len() - 1
    }

    pub fn play_state(&self) -> PlayState {
        if self.state.is_playing {
            PlayState::Playing
        } else if self.state.progress_percent > 0.0 {
            PlayState::Paused
        } else {
            PlayState::Idle
        }
    }

    pub fn active_lease(&self) -> Option<TimerLease> {
        self.lease
    }

    pub fn completed_count(&self) -> usize {
        self.slides.iter().filter(|s| s.completed).count()
    }

    pub fn toggle_playback(&mut self) -> Vec<PlayerEvent> {
        if self.slides.is_empty() {
            return vec![];
        }
        if self.state.is_playing {
            self.state.is_playing = false;
            return self.revoke_lease().into_iter().collect();
        }
        if self.state.progress_percent >= 100.0 {
            return vec![PlayerEvent::Rejected(FINISHED_NOTICE)];
        }

        self.state.is_playing = true;
        let lease = TimerLease(self.next_lease);
        self.next_lease += 1;
        self.lease = Some(lease);
        vec![PlayerEvent::TimerStarted(lease)]
    }

    pub fn tick(&mut self, lease: TimerLease) -> Vec<PlayerEvent> {
        if self.lease != Some(lease) {
            return vec![];
        }

        let mut events = Vec::new();
        let index = self.state.current_index;
        self.state.progress_percent =
            (self.state.progress_percent + PROGRESS_PER_TICK * self.state.playback_rate).min(100.0);

        if !self.state.can_advance && self.state.progress_percent >= ADVANCE_THRESHOLD {
            self.state.can_advance = true;
            if let Some(slide) = self.slides.get_mut(index) {
                slide.completed = true;
            }
            events.push(PlayerEvent::GateOpened(index));
        }

        if self.state.progress_percent >= 100.0 {
            self.state.is_playing = false;
            events.extend(self.revoke_lease());
            events.push(PlayerEvent::SlideFinished(index));
            if self.is_last_slide() {
                events.push(PlayerEvent::CourseCompleted);
            }
        }
        events
    }

    pub fn handle_next(&mut self) -> Vec<PlayerEvent> {
        if self.slides.is_empty() {
            return vec![];
        }
        if !self.state.can_advance {
            return vec![PlayerEvent::Rejected(GATE_NOTICE)];
        }
        if self.is_last_slide() {
            return vec![PlayerEvent::CourseCompleted];
        }
        self.go_to(self.state.current_index + 1)
    }

    pub fn handle_prev(&mut self) -> Vec<PlayerEvent> {
        if self.state.current_index == 0 {
            return vec![];
        }
        self.go_to(self.state.current_index - 1)
    }

    pub fn handle_slide_select(&mut self, index: usize) -> Vec<PlayerEvent> {
        if !self.is_reachable(index) {
            return vec![PlayerEvent::Rejected(LOCKED_NOTICE)];
        }
        self.go_to(index)
    }

    /// Highest index a jump may land on: the first slide not yet completed, or
    /// the current one if that is further along.
    pub fn reachable_limit(&self) -> usize {
        let first_incomplete = self
            .slides
            .iter()
            .position(|s| !s.completed)
            .unwrap_or(self.slides.len().saturating_sub(1));
        first_incomplete.max(self.state.current_index)
    }

    pub fn is_reachable(&self, index: usize) -> bool {
        index < self.slides.len() && index <= self.reachable_limit()
    }

    pub fn slide_statuses(&self) -> Vec<SlideStatus> {
        let limit = self.reachable_limit();
        self.slides
            .iter()
            .enumerate()
            .map(|(i, slide)| {
                if i == self.state.current_index {
                    SlideStatus::Current
                } else if slide.completed {
                    SlideStatus::Completed
                } else if i <= limit {
                    SlideStatus::Available
                } else {
                    SlideStatus::Locked
                }
            })
            .collect()
    }

    /// Ticks still needed before the gate opens at the current rate.
    pub fn ticks_until_gate(&self) -> u32 {
        if self.state.can_advance {
            return 0;
        }
        let remaining = ADVANCE_THRESHOLD - self.state.progress_percent;
        (remaining / (PROGRESS_PER_TICK * self.state.playback_rate)).ceil().max(0.0) as u32
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        if rate.is_finite() {
            self.state.playback_rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        if volume.is_finite() {
            self.state.volume = volume.clamp(0.0, 1.0);
        }
    }

    pub fn toggle_mute(&mut self) {
        self.state.is_muted = !self.state.is_muted;
    }

    pub fn toggle_subtitles(&mut self) {
        self.state.show_subtitles = !self.state.show_subtitles;
    }

    pub fn effective_volume(&self) -> f64 {
        if self.state.is_muted {
            0.0
        } else {
            self.state.volume
        }
    }

    /// Revokes the timer, e.g. when the player is unmounted.
    pub fn stop(&mut self) -> Vec<PlayerEvent> {
        self.state.is_playing = false;
        self.revoke_lease().into_iter().collect()
    }

    fn go_to(&mut self, index: usize) -> Vec<PlayerEvent> {
        if index == self.state.current_index || index >= self.slides.len() {
            return vec![];
        }
        let mut events: Vec<PlayerEvent> = self.revoke_lease().into_iter().collect();
        self.state.current_index = index;
        self.state.progress_percent = 0.0;
        self.state.can_advance = false;
        self.state.is_playing = false;
        events.push(PlayerEvent::SlideChanged(index));
        events
    }

    fn revoke_lease(&mut self) -> Option<PlayerEvent> {
        self.lease.take().map(|_| PlayerEvent::TimerStopped)
    }
}

/// Progress a slide reaches after `ticks` uninterrupted ticks at `rate`.
#[cfg(test)]
fn progress_after(ticks: u32, rate: f64) -> f64 {
    (ticks as f64 * PROGRESS_PER_TICK * rate).min(100.0)
}
