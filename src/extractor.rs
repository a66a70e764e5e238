// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

use super::{CounterTable, Entry, Error};

/// How a snapshot is taken out of the counter table. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// Atomic read-and-clear, nothing is lost between read and clear.
    Batch,
    /// Read, then clear in a separate step. Increments landing in between
    /// are dropped for the interval.
    ReadThenClear,
}

impl Extractor {
    /// Picks `Batch` only if the table positively reports support for it.
    pub fn probe<T>(table: &T) -> Self
    where
        T: CounterTable + ?Sized,
    {
        match table.supports_batch() {
            Ok(true) => Extractor::Batch,
            Ok(false) => {
                tracing::debug!("batch lookup-and-delete is not supported, using read then clear");
                Extractor::ReadThenClear
            },
            Err(error) => {
                tracing::warn!("cannot detect batch lookup-and-delete support: {}", error);
                Extractor::ReadThenClear
            },
        }
    }

    pub fn snapshot_and_clear<T>(&self, table: &T) -> Result<Vec<Entry>, Error>
    where
        T: CounterTable + ?Sized,
    {
        match self {
            Extractor::Batch => table.lookup_and_delete_batch(),
            Extractor::ReadThenClear => {
                let entries = table.entries()?;
                table.clear()?;
                Ok(entries)
            },
        }
    }
}
