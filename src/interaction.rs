//! Mirror-refresh timer.
//!
//! Runs only while an interaction (pointer press → release on the primary
//! view) is open. Time is egui's input clock in seconds, so the timer itself
//! never touches the OS clock and can be driven by hand in tests.

use std::time::Duration;

pub struct RefreshTimer {
    interval: f64,
    /// `Some(t)` while running; `t` is when the next tick is due.
    next_due: Option<f64>,
}

impl RefreshTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.as_secs_f64(),
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval)
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Start ticking. Starting an already running timer keeps its phase.
    pub fn start(&mut self, now: f64) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.interval);
        }
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    /// True once per elapsed interval. Missed ticks collapse into one.
    pub fn poll(&mut self, now: f64) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let mut next = due + self.interval;
                if next <= now {
                    next = now + self.interval;
                }
                self.next_due = Some(next);
                true
            }
            _ => false,
        }
    }

    /// Time left until the next tick, for `request_repaint_after`.
    pub fn remaining(&self, now: f64) -> Option<Duration> {
        self.next_due
            .map(|due| Duration::from_secs_f64((due - now).max(0.0)))
    }
}

/// Open/closed state of the press → release span, with its timer.
pub struct Interaction {
    open: bool,
    timer: RefreshTimer,
}

impl Interaction {
    pub fn new(interval: Duration) -> Self {
        Self {
            open: false,
            timer: RefreshTimer::new(interval),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn timer(&self) -> &RefreshTimer {
        &self.timer
    }

    pub fn begin(&mut self, now: f64) {
        self.open = true;
        self.timer.start(now);
    }

    pub fn end(&mut self) {
        self.open = false;
        self.timer.stop();
    }

    /// Whether a mirror refresh is due on this frame.
    pub fn poll(&mut self, now: f64) -> bool {
        self.open && self.timer.poll(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_50: Duration = Duration::from_millis(50);

    #[test]
    fn idle_timer_never_fires() {
        let mut t = RefreshTimer::new(MS_50);
        assert!(!t.is_active());
        assert!(!t.poll(10.0));
        assert_eq!(t.remaining(10.0), None);
    }

    #[test]
    fn fires_once_per_interval() {
        let mut t = RefreshTimer::new(MS_50);
        t.start(1.0);
        assert!(!t.poll(1.01));
        assert!(t.poll(1.051));
        assert!(!t.poll(1.06));
        assert!(t.poll(1.101));
    }

    #[test]
    fn missed_ticks_collapse() {
        let mut t = RefreshTimer::new(MS_50);
        t.start(0.0);
        assert!(t.poll(1.0));
        assert!(!t.poll(1.01));
        assert!(t.poll(1.051));
    }

    #[test]
    fn restart_while_running_keeps_phase() {
        let mut t = RefreshTimer::new(MS_50);
        t.start(0.0);
        t.start(0.04);
        assert!(t.poll(0.051));
    }

    #[test]
    fn timer_active_iff_interaction_open() {
        let mut i = Interaction::new(MS_50);
        assert!(!i.is_open() && !i.timer().is_active());

        i.begin(2.0);
        assert!(i.is_open() && i.timer().is_active());
        assert!(i.poll(2.051));

        i.end();
        assert!(!i.is_open() && !i.timer().is_active());
        assert!(!i.poll(3.0));

        // A release without a press keeps everything closed
        i.end();
        assert!(!i.is_open() && !i.timer().is_active());
    }

    #[test]
    fn remaining_counts_down() {
        let mut t = RefreshTimer::new(MS_50);
        t.start(0.0);
        let left = t.remaining(0.02).unwrap();
        assert!((left.as_secs_f64() - 0.03).abs() < 1e-9);
        assert_eq!(t.remaining(0.2), Some(Duration::ZERO));
        assert_eq!(t.interval(), MS_50);
    }
}
