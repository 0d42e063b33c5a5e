//! Recorded player commands, enough to rebuild a run from its seed.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::JournalError;
use crate::types::Command;

pub const JOURNAL_FORMAT_VERSION: u16 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputJournal {
    pub format_version: u16,
    pub seed: u64,
    pub inputs: Vec<InputRecord>,
}

/// One accepted command. `seq` matches `Game::next_input_seq` at the time
/// the command was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    pub seq: u64,
    pub command: Command,
}

impl InputJournal {
    pub fn new(seed: u64) -> Self {
        Self { format_version: JOURNAL_FORMAT_VERSION, seed, inputs: Vec::new() }
    }

    pub fn append(&mut self, seq: u64, command: Command) {
        self.inputs.push(InputRecord { seq, command });
    }

    pub fn to_json(&self) -> Result<String, JournalError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, JournalError> {
        let journal: InputJournal = serde_json::from_str(raw)?;
        journal.check_version()?;
        Ok(journal)
    }

    pub fn save(&self, path: &Path) -> Result<(), JournalError> {
        let io_err = |source| JournalError::Io { path: path.to_path_buf(), source };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(io_err)
    }

    pub fn load(path: &Path) -> Result<Self, JournalError> {
        let file =
            File::open(path).map_err(|source| JournalError::Io { path: path.to_path_buf(), source })?;
        let journal: InputJournal = serde_json::from_reader(BufReader::new(file))?;
        journal.check_version()?;
        Ok(journal)
    }

    fn check_version(&self) -> Result<(), JournalError> {
        if self.format_version != JOURNAL_FORMAT_VERSION {
            return Err(JournalError::UnsupportedVersion(self.format_version));
        }
        Ok(())
    }
}
