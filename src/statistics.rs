use std::sync::atomic::{AtomicUsize, Ordering};

use service::Outcome;

/// The type of information passed to the counters
#[derive(Debug, Clone, Copy)]
pub enum Stats {
    ReceivedBytes(usize),
    ReceivedPkts(usize),
    AcceptedPkts(usize),
    DroppedPkts(usize),
    PassedPkts(usize),
    RewrittenPorts(usize),
    InsertedChannels(usize),
}

pub trait Number {
    fn add(&self, value: usize);
    fn get(&self) -> usize;
}

#[derive(Default)]
pub struct Count(AtomicUsize);

impl Number for Count {
    fn add(&self, value: usize) {
        self.0.fetch_add(value, Ordering::Relaxed);
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// Frame counters of one replay
#[derive(Default, Debug, PartialEq, Eq)]
pub struct Counts<T> {
    pub received_bytes: T,
    pub received_pkts: T,
    pub accepted_pkts: T,
    pub dropped_pkts: T,
    pub passed_pkts: T,
    pub rewritten_ports: T,
    pub inserted_channels: T,
}

impl<T: Number> Counts<T> {
    /// # Example
    ///
    /// ```
    /// use turn_offload::statistics::*;
    ///
    /// let counts = Counts::<Count>::default();
    ///
    /// counts.add(&Stats::ReceivedBytes(64));
    /// assert_eq!(counts.received_bytes.get(), 64);
    ///
    /// counts.add(&Stats::ReceivedPkts(1));
    /// assert_eq!(counts.received_pkts.get(), 1);
    ///
    /// counts.add(&Stats::DroppedPkts(1));
    /// assert_eq!(counts.dropped_pkts.get(), 1);
    ///
    /// counts.add(&Stats::InsertedChannels(1));
    /// assert_eq!(counts.inserted_channels.get(), 1);
    /// ```
    pub fn add(&self, payload: &Stats) {
        match payload {
            Stats::ReceivedBytes(v) => self.received_bytes.add(*v),
            Stats::ReceivedPkts(v) => self.received_pkts.add(*v),
            Stats::AcceptedPkts(v) => self.accepted_pkts.add(*v),
            Stats::DroppedPkts(v) => self.dropped_pkts.add(*v),
            Stats::PassedPkts(v) => self.passed_pkts.add(*v),
            Stats::RewrittenPorts(v) => self.rewritten_ports.add(*v),
            Stats::InsertedChannels(v) => self.inserted_channels.add(*v),
        }
    }

    /// Count an accepted frame by what the program did to it.
    pub fn add_outcome(&self, outcome: &Outcome) {
        self.add(&Stats::AcceptedPkts(1));
        match *outcome {
            Outcome::PassThrough(_) => self.add(&Stats::PassedPkts(1)),
            Outcome::Rewritten {
                port_rewritten,
                channel_inserted,
            } => {
                self.add(&Stats::RewrittenPorts(port_rewritten as usize));
                self.add(&Stats::InsertedChannels(channel_inserted as usize));
            }
            Outcome::Matched { .. } => (),
        }
    }

    pub fn add_all(&self, reports: &[Stats]) {
        for item in reports {
            self.add(item);
        }
    }

    /// Read every counter at once.
    pub fn snapshot(&self) -> Counts<usize> {
        Counts {
            received_bytes: self.received_bytes.get(),
            received_pkts: self.received_pkts.get(),
            accepted_pkts: self.accepted_pkts.get(),
            dropped_pkts: self.dropped_pkts.get(),
            passed_pkts: self.passed_pkts.get(),
            rewritten_ports: self.rewritten_ports.get(),
            inserted_channels: self.inserted_channels.get(),
        }
    }
}
