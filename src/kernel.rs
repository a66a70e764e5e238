// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

use std::{io, mem, os::unix::io::{AsRawFd, RawFd}};
use redbpf::{load::{Loaded, Loader}, HashMap as BpfHashMap, Map};
use bpf_swapin::{CounterKey, COUNTS_MAP, MAX_ENTRIES};
use super::{table::collect_batches, CounterTable, Entry, Error};

// `enum bpf_cmd` in include/uapi/linux/bpf.h
const BPF_MAP_LOOKUP_AND_DELETE_BATCH: libc::c_long = 25;

// `union bpf_attr`, the member used by the `BPF_MAP_*_BATCH` commands
#[repr(C)]
#[derive(Default)]
struct BatchAttr {
    in_batch: u64,
    out_batch: u64,
    keys: u64,
    values: u64,
    count: u32,
    map_fd: u32,
    elem_flags: u64,
    flags: u64,
}

/// Counter table living in the kernel: the `counts` map of the swap-in probe.
pub struct KernelTable {
    loaded: Loaded,
}

impl KernelTable {
    /// Loads the probe and its map without attaching anything.
    pub fn load() -> Result<Self, Error> {
        bump_memlock_rlimit();
        let loaded = Loader::load(bpf_swapin::CODE)
            .map_err(|error| Error::Bpf(format!("error loading probe: {:?}", error)))?;
        tracing::info!("loaded bpf module");
        Ok(KernelTable { loaded })
    }

    /// Attaches the probe to the kernel function `hook`.
    pub fn attach(&mut self, hook: &str) -> Result<(), Error> {
        for probe in self.loaded.kprobes_mut() {
            probe.attach_kprobe(hook, 0).map_err(|error| {
                Error::Bpf(format!(
                    "error attaching kprobe program {} to {}: {:?}",
                    probe.name(),
                    hook,
                    error,
                ))
            })?;
            tracing::info!("attached {} to {}", probe.name(), hook);
        }
        Ok(())
    }

    fn map(&self) -> Result<&Map, Error> {
        self.loaded
            .map(COUNTS_MAP)
            .ok_or_else(|| Error::Bpf(format!("probe should contain `{}` map", COUNTS_MAP)))
    }

    fn counts(&self) -> Result<BpfHashMap<'_, CounterKey, u64>, Error> {
        BpfHashMap::new(self.map()?)
            .map_err(|error| Error::Bpf(format!("`{}` is not a hash map: {:?}", COUNTS_MAP, error)))
    }
}

impl CounterTable for KernelTable {
    fn entries(&self) -> Result<Vec<Entry>, Error> {
        Ok(self.counts()?.iter().collect())
    }

    fn clear(&self) -> Result<(), Error> {
        let counts = self.counts()?;
        let keys = counts.iter().map(|(k, _)| k).collect::<Vec<_>>();
        for key in keys {
            counts.delete(key);
        }
        Ok(())
    }

    fn lookup_and_delete_batch(&self) -> Result<Vec<Entry>, Error> {
        let fd = self.map()?.as_raw_fd();
        let capacity = MAX_ENTRIES as usize;
        let mut keys = vec![CounterKey::default(); capacity];
        let mut values = vec![0u64; capacity];
        let (mut token, mut next_token) = (0u64, 0u64);
        let mut first = true;
        collect_batches(|entries| {
            let in_batch = if first { None } else { Some(&token) };
            let (n, done) = batch_step(fd, in_batch, &mut next_token, &mut keys, &mut values)?;
            entries.extend(keys[..n].iter().copied().zip(values[..n].iter().copied()));
            token = next_token;
            first = false;
            Ok(done)
        })
    }

    // Must run before the probe is attached, on an empty map the kernel
    // answers ENOENT if the command exists.
    fn supports_batch(&self) -> Result<bool, Error> {
        let mut keys = [CounterKey::default(); 1];
        let mut values = [0u64; 1];
        let mut token = 0u64;
        let fd = self.map()?.as_raw_fd();
        match batch_step(fd, None, &mut token, &mut keys, &mut values) {
            Ok(_) => Ok(true),
            Err(error) => {
                tracing::debug!("batch lookup-and-delete probe: {}", error);
                Ok(false)
            },
        }
    }
}

// One `BPF_MAP_LOOKUP_AND_DELETE_BATCH` call, returns the number of
// entries written and whether the map is exhausted.
fn batch_step(
    fd: RawFd,
    in_batch: Option<&u64>,
    out_batch: &mut u64,
    keys: &mut [CounterKey],
    values: &mut [u64],
) -> io::Result<(usize, bool)> {
    let mut attr = BatchAttr {
        in_batch: in_batch.map(|t| t as *const u64 as u64).unwrap_or(0),
        out_batch: out_batch as *mut u64 as u64,
        keys: keys.as_mut_ptr() as u64,
        values: values.as_mut_ptr() as u64,
        count: keys.len().min(values.len()) as u32,
        map_fd: fd as u32,
        ..BatchAttr::default()
    };
    let ret = unsafe {
        libc::syscall(
            libc::SYS_bpf,
            BPF_MAP_LOOKUP_AND_DELETE_BATCH,
            &mut attr as *mut BatchAttr,
            mem::size_of::<BatchAttr>(),
        )
    };
    // the kernel reports how many entries it copied even on ENOENT
    let n = attr.count as usize;
    if ret < 0 {
        let error = io::Error::last_os_error();
        if error.raw_os_error() == Some(libc::ENOENT) {
            Ok((n, true))
        } else {
            Err(error)
        }
    } else {
        Ok((n, false))
    }
}

fn bump_memlock_rlimit() {
    // needed on kernels without memcg based accounting of bpf memory
    let rlim = libc::rlimit {
        rlim_cur: libc::RLIM_INFINITY,
        rlim_max: libc::RLIM_INFINITY,
    };
    let ret = unsafe { libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlim) };
    if ret != 0 {
        tracing::debug!("remove limit on locked memory failed: {}", io::Error::last_os_error());
    }
}
