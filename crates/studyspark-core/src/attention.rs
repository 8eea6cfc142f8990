//! Per-second attention samples collected during a work phase.

use serde::{Deserialize, Serialize};

/// Drain capability the phase timer uses at the end of a work phase.
pub trait AttentionSource {
    /// Return every sample recorded so far and leave the source empty.
    fn drain(&mut self) -> Vec<f64>;
}

/// Append-only collector of attention scores.
///
/// Scores are expected in `[0.0, 1.0]` but are not checked; gating samples to
/// running work phases is the caller's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttentionBuffer {
    samples: Vec<f64>,
}

impl AttentionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, score: f64) {
        self.samples.push(score);
    }

    /// Take the current samples, leaving the buffer empty.
    pub fn flush_and_clear(&mut self) -> Vec<f64> {
        std::mem::take(&mut self.samples)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean of the buffered samples, `None` when empty.
    pub fn average(&self) -> Option<f64> {
        crate::adaptive::average_attention(&self.samples)
    }
}

impl AttentionSource for AttentionBuffer {
    fn drain(&mut self) -> Vec<f64> {
        self.flush_and_clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_returns_samples_in_order_and_clears() {
        let mut buf = AttentionBuffer::new();
        buf.record(0.9);
        buf.record(0.4);
        buf.record(1.0);
        assert_eq!(buf.len(), 3);

        let flushed = buf.flush_and_clear();
        assert_eq!(flushed, vec![0.9, 0.4, 1.0]);
        assert!(buf.is_empty());
        assert!(buf.flush_and_clear().is_empty());
    }

    #[test]
    fn out_of_range_scores_are_kept() {
        let mut buf = AttentionBuffer::new();
        buf.record(1.5);
        buf.record(-0.2);
        assert_eq!(buf.samples(), &[1.5, -0.2]);
    }

    #[test]
    fn average_of_samples() {
        let mut buf = AttentionBuffer::new();
        assert_eq!(buf.average(), None);
        buf.record(0.5);
        buf.record(1.0);
        assert_eq!(buf.average(), Some(0.75));
    }

    #[test]
    fn samples_after_drain_start_a_new_phase() {
        let mut buf = AttentionBuffer::new();
        buf.record(0.2);
        let first = buf.drain();
        buf.record(0.8);
        assert_eq!(first, vec![0.2]);
        assert_eq!(buf.drain(), vec![0.8]);
    }
}
