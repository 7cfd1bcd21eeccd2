use serde::{Deserialize, Serialize};

use super::constants::{SATURATED_CHARGE_LONG, SATURATED_CHARGE_SHORT};
use super::hardware_id::ChannelId;

/// The decoded pulse information of a single DPP trigger.
///
/// The event builder never looks inside the payload; it is carried along with the
/// fragment as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DppPayload {
    pub fine_timestamp: u16, // ps
    pub energy: u16,
    pub energy_short: u16,
    pub baseline: u16,
    pub flags: u32,
    pub psd: f32,
    pub waveform: Option<Vec<u16>>,
}

impl DppPayload {
    /// Make a payload from the long and short gate charges, computing the PSD parameter
    pub fn from_charges(energy: u16, energy_short: u16) -> Self {
        DppPayload {
            energy,
            energy_short,
            psd: Self::compute_psd(energy, energy_short),
            ..Default::default()
        }
    }

    /// Pulse shape discrimination parameter, (long - short) / long.
    ///
    /// Saturated or empty integrals give 0.
    pub fn compute_psd(energy: u16, energy_short: u16) -> f32 {
        if energy == 0
            || energy == SATURATED_CHARGE_LONG
            || energy_short == SATURATED_CHARGE_SHORT
        {
            return 0.0;
        }
        (energy as f32 - energy_short as f32) / energy as f32
    }
}

/// Fragment is one decoded hardware event from one digitizer input.
///
/// The timestamp is whatever the producer put there. On the readout path it has already
/// been widened to a monotonic 64-bit counter by a
/// [TimestampExtender](crate::timestamp::TimestampExtender).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: ChannelId,
    pub timestamp: u64,
    pub payload: DppPayload,
}

impl Fragment {
    pub fn new(id: ChannelId, timestamp: u64, payload: DppPayload) -> Self {
        Fragment {
            id,
            timestamp,
            payload,
        }
    }

    pub fn board(&self) -> usize {
        self.id.board
    }

    pub fn channel(&self) -> usize {
        self.id.channel
    }
}
