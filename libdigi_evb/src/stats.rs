use std::fmt::Display;

use super::hardware_id::{ChannelId, ChannelLayout};

/// Counters for a single input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub received: u64,  // fragments handed in by the decoder
    pub lost: u64,      // rejected because the queue was full
    pub popped: u64,    // taken off the queue for any reason
    pub matched: u64,   // made it into a built event
    pub discarded: u64, // dropped as too old, or flushed
}

/// Running statistics of a readout
#[derive(Debug, Clone)]
pub struct ReadoutStats {
    n_channels: usize,
    channels: Vec<ChannelStats>,
    pub built_events: u64,
    pub built_fragments: u64,
    pub empty_builds: u64,
}

impl ReadoutStats {
    pub fn new(layout: &ChannelLayout) -> Self {
        ReadoutStats {
            n_channels: layout.n_channels(),
            channels: vec![ChannelStats::default(); layout.size()],
            built_events: 0,
            built_fragments: 0,
            empty_builds: 0,
        }
    }

    pub fn channel(&self, id: &ChannelId) -> &ChannelStats {
        &self.channels[id.flat_index(self.n_channels)]
    }

    pub fn channel_mut(&mut self, id: &ChannelId) -> &mut ChannelStats {
        &mut self.channels[id.flat_index(self.n_channels)]
    }

    /// Record the outcome of one build
    pub fn record_build(&mut self, n_fragments: usize) {
        if n_fragments == 0 {
            self.empty_builds += 1;
        } else {
            self.built_events += 1;
            self.built_fragments += n_fragments as u64;
        }
    }

    /// Fraction of the received fragments of a channel that made it into an event
    pub fn matched_fraction(&self, id: &ChannelId) -> f64 {
        let stats = self.channel(id);
        if stats.received == 0 {
            0.0
        } else {
            stats.matched as f64 / stats.received as f64
        }
    }

    pub fn total_received(&self) -> u64 {
        self.channels.iter().map(|s| s.received).sum()
    }

    pub fn total_lost(&self) -> u64 {
        self.channels.iter().map(|s| s.lost).sum()
    }

    pub fn total_discarded(&self) -> u64 {
        self.channels.iter().map(|s| s.discarded).sum()
    }

    /// Channels with any activity, in board-major order
    pub fn iter_active(&self) -> impl Iterator<Item = (ChannelId, &ChannelStats)> {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, s)| s.received > 0)
            .map(|(index, s)| (ChannelId::from_flat_index(index, self.n_channels), s))
    }
}

impl Display for ReadoutStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Built {} events from {} fragments ({} empty builds)",
            self.built_events, self.built_fragments, self.empty_builds
        )?;
        writeln!(
            f,
            "Received: {} Lost: {} Discarded: {}",
            self.total_received(),
            self.total_lost(),
            self.total_discarded()
        )?;
        for (id, stats) in self.iter_active() {
            writeln!(
                f,
                "{:>3} {:>3} | received {:>10} matched {:>10} ({:6.2}%) lost {:>8} discarded {:>8}",
                id.board,
                id.channel,
                stats.received,
                stats.matched,
                100.0 * self.matched_fraction(&id),
                stats.lost,
                stats.discarded
            )?;
        }
        Ok(())
    }
}
