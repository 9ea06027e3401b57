use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{Outcome, SlotOutcome};

/// One recorded probe result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub latency: Duration,
    pub outcome: SlotOutcome,
    pub collected_at: DateTime<Utc>,
}

impl Sample {
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SlotOutcome::Success => None,
            SlotOutcome::Failure(reason) => Some(reason.as_str()),
        }
    }
}

/// Fixed-capacity ring of the most recent probe samples for one host.
///
/// The cursor always points at the most recently written slot. Writing
/// overwrites the oldest slot in place; there is no separate eviction.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    slots: Vec<Option<Sample>>,
    cursor: usize,
}

impl HistoryBuffer {
    /// Creates an empty buffer. A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; capacity],
            // First record advances to slot 0
            cursor: capacity - 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[allow(dead_code)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn record(&mut self, outcome: &Outcome, at: DateTime<Utc>) {
        self.cursor = (self.cursor + 1) % self.slots.len();
        self.slots[self.cursor] = Some(Sample {
            latency: outcome.latency(),
            outcome: SlotOutcome::from(outcome),
            collected_at: at,
        });
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.slots[self.cursor].as_ref()
    }

    /// Display string for the slot at the cursor
    pub fn status(&self) -> String {
        match self.latest() {
            None => "no data".to_string(),
            Some(sample) => match &sample.outcome {
                SlotOutcome::Failure(reason) => format!("Error: {}", reason),
                SlotOutcome::Success => format!("{}ms", sample.latency.as_millis()),
            },
        }
    }

    /// Copy of every slot in physical order (length == capacity)
    pub fn snapshot(&self) -> Vec<Option<Sample>> {
        self.slots.clone()
    }

    /// Filled slots from oldest to newest. This is what charts plot.
    pub fn samples(&self) -> Vec<Sample> {
        let mut slots = self.snapshot();
        // Oldest slot sits just past the cursor
        let len = slots.len();
        slots.rotate_left((self.cursor + 1) % len);
        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn latencies(buf: &HistoryBuffer) -> Vec<Option<Duration>> {
        buf.snapshot()
            .into_iter()
            .map(|slot| slot.map(|s| s.latency))
            .collect()
    }

    #[test]
    fn test_empty_buffer_has_no_status() {
        let buf = HistoryBuffer::new(4);
        assert_eq!(buf.status(), "no data");
        assert!(buf.latest().is_none());
        assert_eq!(buf.snapshot().len(), 4);
        assert!(buf.samples().is_empty());
    }

    #[test]
    fn test_first_record_lands_in_slot_zero() {
        let mut buf = HistoryBuffer::new(3);
        buf.record(&Outcome::success(ms(10)), Utc::now());
        assert_eq!(buf.cursor(), 0);
        assert_eq!(latencies(&buf), vec![Some(ms(10)), None, None]);
    }

    #[test]
    fn test_wraparound_overwrites_oldest() {
        let mut buf = HistoryBuffer::new(3);
        for n in [10, 20, 30, 40] {
            buf.record(&Outcome::success(ms(n)), Utc::now());
        }

        assert_eq!(latencies(&buf), vec![Some(ms(40)), Some(ms(20)), Some(ms(30))]);
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.status(), "40ms");
    }

    #[test]
    fn test_snapshot_length_is_capacity_after_many_writes() {
        let mut buf = HistoryBuffer::new(5);
        for n in 0..=5 {
            buf.record(&Outcome::success(ms(n)), Utc::now());
        }
        let snapshot = buf.snapshot();
        assert_eq!(snapshot.len(), 5);
        // Sample 0 was the oldest and is gone
        assert!(snapshot.iter().flatten().all(|s| s.latency != ms(0)));
        assert_eq!(snapshot[buf.cursor()].as_ref().map(|s| s.latency), Some(ms(5)));
    }

    #[test]
    fn test_samples_are_chronological() {
        let mut buf = HistoryBuffer::new(3);
        for n in [10, 20, 30, 40] {
            buf.record(&Outcome::success(ms(n)), Utc::now());
        }
        let ordered: Vec<_> = buf.samples().into_iter().map(|s| s.latency).collect();
        assert_eq!(ordered, vec![ms(20), ms(30), ms(40)]);
    }

    #[test]
    fn test_failure_status_shows_reason() {
        let mut buf = HistoryBuffer::new(2);
        buf.record(&Outcome::success(ms(12)), Utc::now());
        buf.record(&Outcome::failure("503 Service Unavailable", ms(7)), Utc::now());

        assert_eq!(buf.status(), "Error: 503 Service Unavailable");
        assert_eq!(buf.latest().and_then(|s| s.error()), Some("503 Service Unavailable"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut buf = HistoryBuffer::new(0);
        buf.record(&Outcome::success(ms(1)), Utc::now());
        buf.record(&Outcome::success(ms(2)), Utc::now());
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.status(), "2ms");
    }
}
