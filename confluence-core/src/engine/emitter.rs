//! Signal delivery to subscribed collaborators.
//!
//! The analyzer hands every emitted signal to each subscribed sink, in
//! subscription order, before returning it from the pass.

use std::fmt;
use std::sync::mpsc::{Sender, SyncSender, TrySendError};

use crate::domain::Signal;

/// Receiver of emitted signals.
///
/// Delivery runs inside the analysis pass, so implementations must return
/// without waiting on the consumer.
pub trait SignalSink: Send {
    fn deliver(&mut self, signal: &Signal);
}

/// A disconnected receiver is not the analyzer's concern; the send is dropped.
impl SignalSink for Sender<Signal> {
    fn deliver(&mut self, signal: &Signal) {
        let _ = self.send(signal.clone());
    }
}

/// Never blocks: a signal that finds the channel full is dropped.
impl SignalSink for SyncSender<Signal> {
    fn deliver(&mut self, signal: &Signal) {
        match self.try_send(signal.clone()) {
            Ok(()) | Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Ordered list of subscribed sinks.
#[derive(Default)]
pub struct SignalEmitter {
    sinks: Vec<Box<dyn SignalSink>>,
}

impl SignalEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: impl SignalSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn publish(&mut self, signal: &Signal) {
        for sink in &mut self.sinks {
            sink.deliver(signal);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sinks.len()
    }
}

impl fmt::Debug for SignalEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalEmitter")
            .field("subscribers", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RiskPlan, SignalDirection, TakeProfit};
    use chrono::DateTime;
    use std::sync::mpsc;

    fn signal() -> Signal {
        Signal::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            SignalDirection::Short,
            64.0,
            RiskPlan {
                entry: 100.0,
                stop_loss: 101.0,
                targets: vec![TakeProfit { price: 98.0, percent: 100 }],
                risk_reward: 2.0,
            },
            Vec::new(),
            "cfg".into(),
        )
    }

    #[test]
    fn publishes_to_every_subscriber() {
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::sync_channel(4);
        let mut emitter = SignalEmitter::new();
        emitter.subscribe(tx_a);
        emitter.subscribe(tx_b);
        assert_eq!(emitter.subscriber_count(), 2);

        emitter.publish(&signal());
        assert_eq!(rx_a.try_recv().unwrap().score, 64.0);
        assert_eq!(rx_b.try_recv().unwrap().direction, SignalDirection::Short);
    }

    #[test]
    fn full_bounded_channel_does_not_block() {
        let (tx, rx) = mpsc::sync_channel(1);
        let mut emitter = SignalEmitter::new();
        emitter.subscribe(tx);

        // the second and third publish find the channel full
        for _ in 0..3 {
            emitter.publish(&signal());
        }
        assert_eq!(rx.try_iter().count(), 1);

        emitter.publish(&signal());
        assert_eq!(rx.try_recv().unwrap().score, 64.0);
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut emitter = SignalEmitter::new();
        emitter.subscribe(tx);
        emitter.publish(&signal());
    }
}
