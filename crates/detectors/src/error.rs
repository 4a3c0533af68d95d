use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DetectorError>;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("failed to parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },
}
