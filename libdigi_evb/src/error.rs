use std::path::PathBuf;
use thiserror::Error;

use super::constants::*;
use super::status::ReadoutStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config has {0} boards; expected between 1 and {max}", max=MAX_BOARDS)]
    BadBoardCount(usize),
    #[error("Config has {0} channels per board; expected between 1 and {max}", max=MAX_CHANNELS)]
    BadChannelCount(usize),
    #[error("Config trigger board {0} channel {1} is outside of the configured layout")]
    TriggerOutOfRange(usize, usize),
    #[error("Config trigger board {0} channel {1} is not an enabled input")]
    TriggerDisabled(usize, usize),
    #[error("Config has a coarse tag width of {0} bits; expected between 1 and 63")]
    BadTagBits(u32),
    #[error("Config has a queue size of zero")]
    EmptyQueue,
    #[error("Config almost full level {0} must be below the queue size {1}")]
    BadAlmostFullLevel(usize, usize),
    #[error("Config has a sample period of zero")]
    BadSamplePeriod,
    #[error("Config {0} table has {1} boards; expected {2}")]
    BadTableShape(&'static str, usize, usize),
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Could not open replay file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Replay failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Replay file has a malformed record at line {0}: {1}")]
    BadLine(usize, String),
    #[error("Replay file failed to parse an integer at line {0}: {1}")]
    ParsingError(usize, std::num::ParseIntError),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("EventSink failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ReadoutError {
    #[error("Readout failed due to configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Readout failed due to replay error: {0}")]
    ReplayError(#[from] ReplayError),
    #[error("Readout failed due to sink error: {0}")]
    SinkError(#[from] SinkError),
    #[error("Readout received a fragment for board {0} channel {1}, which is outside of the configured layout")]
    UnknownChannel(usize, usize),
    #[error("Readout failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<ReadoutStatus>),
}
