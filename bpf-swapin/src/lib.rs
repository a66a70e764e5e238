// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

#![cfg_attr(feature = "probes", no_std)]

use core::{fmt, hash::{Hash, Hasher}};

/// Length of the kernel's task name buffer, `TASK_COMM_LEN`.
pub const COMM_LEN: usize = 16;

/// Name of the hash map the probe counts into.
pub const COUNTS_MAP: &str = "counts";

/// Capacity of the `counts` map.
pub const MAX_ENTRIES: u32 = 10240;

/// Aggregation bucket, laid out exactly as the probe writes it into the map.
#[repr(C)]
#[derive(Default, Clone, Copy)]
pub struct CounterKey {
    pub pid: u32,
    pub comm: [u8; COMM_LEN],
}

impl CounterKey {
    /// Truncates `name` to `COMM_LEN - 1` bytes so the buffer stays
    /// NUL-terminated, like the kernel does for `task_struct::comm`.
    pub fn new(pid: u32, name: &str) -> Self {
        let mut comm = [0; COMM_LEN];
        let bytes = name.as_bytes();
        let len = bytes.len().min(COMM_LEN - 1);
        comm[..len].clone_from_slice(&bytes[..len]);
        CounterKey { pid, comm }
    }

    /// Command name bytes up to the first NUL, or the whole buffer if there is none.
    pub fn comm(&self) -> &[u8] {
        let len = self
            .comm
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(COMM_LEN);
        &self.comm[..len]
    }
}

// Equality and hashing ignore whatever follows the terminator.
impl PartialEq for CounterKey {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid && self.comm() == other.comm()
    }
}

impl Eq for CounterKey {}

impl Hash for CounterKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
        self.comm().hash(state);
    }
}

impl fmt::Debug for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterKey")
            .field("pid", &self.pid)
            .field("comm", &ByteStr(self.comm()))
            .finish()
    }
}

struct ByteStr<'a>(&'a [u8]);

impl fmt::Debug for ByteStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;
        for &b in self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        write!(f, "\"")
    }
}

#[cfg(feature = "facade")]
#[repr(C, align(8))]
struct Aligned<T: ?Sized>(T);

/// The compiled probe object. The ELF loader reads it in place, so it is
/// embedded on an 8-byte boundary.
#[cfg(feature = "facade")]
pub static CODE: &[u8] = {
    static ELF: &Aligned<[u8]> =
        &Aligned(*include_bytes!(concat!(env!("OUT_DIR"), "/target/bpf/programs/kprobe/kprobe.elf")));
    &ELF.0
};
