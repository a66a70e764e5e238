// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

use std::{collections::HashMap, mem, sync::Mutex};
use bpf_swapin::CounterKey;
use super::Error;

/// One row of a snapshot, the key and its count since the previous drain.
pub type Entry = (CounterKey, u64);

/// Key to count map filled by an event source and drained by the report loop.
///
/// The table is shared: implementations take `&self` and provide their own
/// synchronization, the event source keeps incrementing while any of these
/// methods runs.
pub trait CounterTable {
    /// Reads every entry without removing anything.
    fn entries(&self) -> Result<Vec<Entry>, Error>;

    /// Removes every entry.
    fn clear(&self) -> Result<(), Error>;

    /// Reads and removes every entry in one indivisible step. An increment
    /// either lands in the returned entries or in the table afterwards.
    fn lookup_and_delete_batch(&self) -> Result<Vec<Entry>, Error>;

    /// Whether `lookup_and_delete_batch` is available on this table.
    fn supports_batch(&self) -> Result<bool, Error>;
}

/// Runs `step` until it reports the source exhausted. Each step appends the
/// entries it removed. If a step fails, the entries already removed are gone
/// with the error, the loss is logged.
#[cfg_attr(not(feature = "kernel"), allow(dead_code))]
pub(crate) fn collect_batches<F>(mut step: F) -> Result<Vec<Entry>, Error>
where
    F: FnMut(&mut Vec<Entry>) -> Result<bool, Error>,
{
    let mut entries = Vec::new();
    loop {
        match step(&mut entries) {
            Ok(true) => return Ok(entries),
            Ok(false) => (),
            Err(error) => {
                if !entries.is_empty() {
                    tracing::warn!(
                        "batch drain failed after removing {} entries, they are lost: {}",
                        entries.len(),
                        error,
                    );
                }
                return Err(error);
            },
        }
    }
}

#[derive(Default)]
struct Inner {
    index: HashMap<CounterKey, usize>,
    entries: Vec<Entry>,
}

/// In-process counter table, iterates in first-insertion order.
pub struct MemoryTable {
    batch: bool,
    inner: Mutex<Inner>,
}

impl Default for MemoryTable {
    fn default() -> Self {
        MemoryTable::new(true)
    }
}

impl MemoryTable {
    /// `batch` tells whether the table advertises atomic batch extraction.
    pub fn new(batch: bool) -> Self {
        MemoryTable {
            batch,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn increment(&self, key: CounterKey) {
        self.add(key, 1)
    }

    pub fn add(&self, key: CounterKey, n: u64) {
        let mut inner = self.lock();
        let Inner { index, entries } = &mut *inner;
        match index.get(&key) {
            Some(&i) => entries[i].1 += n,
            None => {
                index.insert(key, entries.len());
                entries.push((key, n));
            },
        }
    }

    pub fn get(&self, key: &CounterKey) -> Option<u64> {
        let inner = self.lock();
        inner.index.get(key).map(|&i| inner.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // the map stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CounterTable for MemoryTable {
    fn entries(&self) -> Result<Vec<Entry>, Error> {
        Ok(self.lock().entries.clone())
    }

    fn clear(&self) -> Result<(), Error> {
        let mut inner = self.lock();
        inner.index.clear();
        inner.entries.clear();
        Ok(())
    }

    fn lookup_and_delete_batch(&self) -> Result<Vec<Entry>, Error> {
        let mut inner = self.lock();
        inner.index.clear();
        Ok(mem::take(&mut inner.entries))
    }

    fn supports_batch(&self) -> Result<bool, Error> {
        Ok(self.batch)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};
    use bpf_swapin::CounterKey;
    use crate::Error;
    use super::{collect_batches, CounterTable, MemoryTable};

    #[test]
    fn insertion_order() {
        let table = MemoryTable::default();
        table.increment(CounterKey::new(3, "c"));
        table.increment(CounterKey::new(1, "a"));
        table.increment(CounterKey::new(3, "c"));
        table.increment(CounterKey::new(2, "b"));

        let pids = table
            .entries()
            .unwrap()
            .into_iter()
            .map(|(k, v)| (k.pid, v))
            .collect::<Vec<_>>();
        assert_eq!(pids, vec![(3, 2), (1, 1), (2, 1)]);
    }

    #[test]
    fn same_pid_different_comm() {
        let table = MemoryTable::default();
        table.increment(CounterKey::new(10, "sh"));
        table.increment(CounterKey::new(10, "bash"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn clear_after_entries() {
        let table = MemoryTable::default();
        table.add(CounterKey::new(1, "a"), 5);
        assert_eq!(table.entries().unwrap().len(), 1);
        assert_eq!(table.len(), 1);
        table.clear().unwrap();
        assert!(table.is_empty());
        assert_eq!(table.get(&CounterKey::new(1, "a")), None);
    }

    #[test]
    fn batch_leaves_table_empty() {
        let table = MemoryTable::default();
        table.add(CounterKey::new(1, "a"), 2);
        let entries = table.lookup_and_delete_batch().unwrap();
        assert_eq!(entries, vec![(CounterKey::new(1, "a"), 2)]);
        assert!(table.is_empty());

        // index is reset together with the entries
        table.increment(CounterKey::new(1, "a"));
        assert_eq!(table.get(&CounterKey::new(1, "a")), Some(1));
    }

    #[test]
    fn concurrent_increments() {
        let table = Arc::new(MemoryTable::default());
        let threads = (0..8)
            .map(|i| {
                let table = table.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        table.increment(CounterKey::new(i % 2, "worker"));
                    }
                })
            })
            .collect::<Vec<_>>();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(table.get(&CounterKey::new(0, "worker")), Some(4000));
        assert_eq!(table.get(&CounterKey::new(1, "worker")), Some(4000));
    }

    #[test]
    fn batches_accumulate_until_exhausted() {
        let mut calls = 0;
        let entries = collect_batches(|entries| {
            calls += 1;
            entries.push((CounterKey::new(calls, "batch"), 1));
            Ok(calls == 3)
        })
        .unwrap();
        assert_eq!(entries.iter().map(|(k, _)| k.pid).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn failed_batch_reports_error() {
        let mut calls = 0;
        let result = collect_batches(|entries| {
            calls += 1;
            if calls == 2 {
                return Err(Error::Bpf("map vanished".to_string()));
            }
            entries.push((CounterKey::new(calls, "batch"), 4));
            Ok(false)
        });
        match result {
            Err(Error::Bpf(message)) => assert_eq!(message, "map vanished"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(calls, 2);
    }
}
