use tempo_paper::PaperError;
use tempo_twap::{AlgoError, AlgoId};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Algorithm {0} is no longer running")]
    AlgoGone(AlgoId),

    #[error("Unknown algorithm: {0}")]
    UnknownAlgo(AlgoId),

    #[error(transparent)]
    Algo(#[from] AlgoError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Paper venue error: {0}")]
    Paper(#[from] PaperError),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
