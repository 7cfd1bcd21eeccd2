use bit_set::BitSet;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// ChannelId is the full hardware address of a digitizer input.
///
/// Ordering is board-major, channel-minor, which is the order the event builder harvests
/// channels in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ChannelId {
    pub board: usize,
    pub channel: usize,
}

impl ChannelId {
    /// Construct a new channel id
    pub fn new(board: usize, channel: usize) -> Self {
        ChannelId { board, channel }
    }

    /// Flat (board-major) index of this channel in a table with `n_channels` per board
    pub fn flat_index(&self, n_channels: usize) -> usize {
        self.board * n_channels + self.channel
    }

    /// Inverse of [ChannelId::flat_index]
    pub fn from_flat_index(index: usize, n_channels: usize) -> Self {
        ChannelId {
            board: index / n_channels,
            channel: index % n_channels,
        }
    }
}

impl Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "board {} channel {}", self.board, self.channel)
    }
}

/// ChannelLayout is the shape of the acquisition: how many boards, how many channels on
/// each board, and which of those inputs are enabled.
///
/// Set once at configuration time. Every fixed-size table in the readout is sized from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayout {
    n_boards: usize,
    n_channels: usize,
    enabled: BitSet,
}

impl ChannelLayout {
    /// A layout with every input enabled
    pub fn new(n_boards: usize, n_channels: usize) -> Self {
        let mut enabled = BitSet::with_capacity(n_boards * n_channels);
        for index in 0..(n_boards * n_channels) {
            enabled.insert(index);
        }
        ChannelLayout {
            n_boards,
            n_channels,
            enabled,
        }
    }

    /// A layout with only the given inputs enabled
    pub fn with_enabled(n_boards: usize, n_channels: usize, enabled: &[ChannelId]) -> Self {
        let mut layout = ChannelLayout {
            n_boards,
            n_channels,
            enabled: BitSet::with_capacity(n_boards * n_channels),
        };
        for id in enabled {
            if layout.contains(id) {
                layout.enabled.insert(id.flat_index(n_channels));
            }
        }
        layout
    }

    pub fn n_boards(&self) -> usize {
        self.n_boards
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Total number of inputs, enabled or not
    pub fn size(&self) -> usize {
        self.n_boards * self.n_channels
    }

    /// Is the id inside the layout
    pub fn contains(&self, id: &ChannelId) -> bool {
        id.board < self.n_boards && id.channel < self.n_channels
    }

    pub fn is_enabled(&self, id: &ChannelId) -> bool {
        self.contains(id) && self.enabled.contains(id.flat_index(self.n_channels))
    }

    pub fn n_enabled(&self) -> usize {
        self.enabled.len()
    }

    pub fn index(&self, id: &ChannelId) -> usize {
        id.flat_index(self.n_channels)
    }

    /// All inputs in board-major, channel-minor order
    pub fn iter(&self) -> impl Iterator<Item = ChannelId> + '_ {
        (0..self.size()).map(|index| ChannelId::from_flat_index(index, self.n_channels))
    }

    /// Enabled inputs in board-major, channel-minor order
    pub fn iter_enabled(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.enabled
            .iter()
            .map(|index| ChannelId::from_flat_index(index, self.n_channels))
    }
}
