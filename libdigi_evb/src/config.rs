use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::*;
use super::error::ConfigError;
use super::hardware_id::{ChannelId, ChannelLayout};

/// Structure representing the acquisition configuration seen by the event builder.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
///
/// The configuration is loaded once at startup and never changes while a readout runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub n_boards: usize,
    pub n_channels: usize,
    pub trigger_board: usize,
    pub trigger_channel: usize,
    pub coincidence_window: u64,
    pub correlate: bool,
    pub require_partner: bool,
    pub queue_size: usize,
    pub almost_full_level: Option<usize>,
    pub tag_bits: u32,
    pub sample_period: u64,
    pub delay_lines: Option<Vec<Vec<u64>>>,
    pub enabled_inputs: Option<Vec<Vec<bool>>>,
    pub replay_path: Option<PathBuf>,
}

impl Default for Config {
    /// Generate a new Config object for a single board with every input enabled
    fn default() -> Self {
        Self {
            n_boards: 1,
            n_channels: 16,
            trigger_board: 0,
            trigger_channel: 0,
            coincidence_window: DEFAULT_COINCIDENCE_WINDOW,
            correlate: true,
            require_partner: false,
            queue_size: DEFAULT_QUEUE_SIZE,
            almost_full_level: None,
            tag_bits: DEFAULT_TAG_BITS,
            sample_period: 1,
            delay_lines: None,
            enabled_inputs: None,
            replay_path: None,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        let config = serde_yaml::from_str::<Self>(&yaml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    /// Check that the configuration describes a layout the readout can be built for
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_boards == 0 || self.n_boards > MAX_BOARDS {
            return Err(ConfigError::BadBoardCount(self.n_boards));
        }
        if self.n_channels == 0 || self.n_channels > MAX_CHANNELS {
            return Err(ConfigError::BadChannelCount(self.n_channels));
        }
        if self.trigger_board >= self.n_boards || self.trigger_channel >= self.n_channels {
            return Err(ConfigError::TriggerOutOfRange(
                self.trigger_board,
                self.trigger_channel,
            ));
        }
        if !(1..=63).contains(&self.tag_bits) {
            return Err(ConfigError::BadTagBits(self.tag_bits));
        }
        if self.queue_size == 0 {
            return Err(ConfigError::EmptyQueue);
        }
        if self.get_almost_full_level() >= self.queue_size {
            return Err(ConfigError::BadAlmostFullLevel(
                self.get_almost_full_level(),
                self.queue_size,
            ));
        }
        if self.sample_period == 0 {
            return Err(ConfigError::BadSamplePeriod);
        }
        if let Some(table) = &self.delay_lines {
            if table.len() != self.n_boards {
                return Err(ConfigError::BadTableShape(
                    "delay_lines",
                    table.len(),
                    self.n_boards,
                ));
            }
        }
        if let Some(table) = &self.enabled_inputs {
            if table.len() != self.n_boards {
                return Err(ConfigError::BadTableShape(
                    "enabled_inputs",
                    table.len(),
                    self.n_boards,
                ));
            }
        }
        if !self.get_layout().is_enabled(&self.get_trigger()) {
            return Err(ConfigError::TriggerDisabled(
                self.trigger_board,
                self.trigger_channel,
            ));
        }
        Ok(())
    }

    pub fn get_trigger(&self) -> ChannelId {
        ChannelId::new(self.trigger_board, self.trigger_channel)
    }

    /// Build the channel layout. Inputs missing from the `enabled_inputs` table count as
    /// disabled; no table at all means every input is enabled.
    pub fn get_layout(&self) -> ChannelLayout {
        match &self.enabled_inputs {
            None => ChannelLayout::new(self.n_boards, self.n_channels),
            Some(table) => {
                let enabled: Vec<ChannelId> = table
                    .iter()
                    .enumerate()
                    .flat_map(|(board, row)| {
                        row.iter()
                            .enumerate()
                            .filter(|(_, on)| **on)
                            .map(move |(channel, _)| ChannelId::new(board, channel))
                    })
                    .collect();
                ChannelLayout::with_enabled(self.n_boards, self.n_channels, &enabled)
            }
        }
    }

    pub fn get_almost_full_level(&self) -> usize {
        self.almost_full_level
            .unwrap_or(default_almost_full_level(self.queue_size))
    }

    /// Delay line of an input in time units; inputs missing from the table have none
    pub fn get_delay_line(&self, id: &ChannelId) -> u64 {
        self.delay_lines
            .as_ref()
            .and_then(|table| table.get(id.board))
            .and_then(|row| row.get(id.channel))
            .copied()
            .unwrap_or(0)
    }

    pub fn has_replay_path(&self) -> bool {
        self.replay_path.is_some()
    }
}
