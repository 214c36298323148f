//! Byte-retrievable inputs.

use irislab_training::TrainingResult;
use std::path::PathBuf;

/// A handle whose contents can be fetched as bytes.
pub trait ByteSource {
    fn get(&self) -> TrainingResult<Vec<u8>>;

    /// Human readable origin, used in log lines.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct FileSource(pub PathBuf);

impl ByteSource for FileSource {
    fn get(&self) -> TrainingResult<Vec<u8>> {
        Ok(std::fs::read(&self.0)?)
    }

    fn describe(&self) -> String {
        self.0.display().to_string()
    }
}

impl ByteSource for Vec<u8> {
    fn get(&self) -> TrainingResult<Vec<u8>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory bytes", self.len())
    }
}
