// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

#![no_std]
#![no_main]
#![cfg(feature = "probes")]

use core::{mem, sync::atomic::{AtomicU64, Ordering}};
use redbpf_probes::kprobe::prelude::*;
use bpf_swapin::{CounterKey, MAX_ENTRIES};

program!(0xFFFFFFFE, "GPL");

#[map]
static mut counts: HashMap<CounterKey, u64> = HashMap::with_max_entries(MAX_ENTRIES);

// attached at runtime to `swap_readpage` or `swap_read_folio`
#[kprobe]
fn trace_swap_read(regs: Registers) {
    let _ = regs;
    let pid = (bpf_get_current_pid_tgid() >> 32) as u32;
    let comm = unsafe { mem::transmute::<[c_char; 16], [u8; 16]>(bpf_get_current_comm()) };
    let key = CounterKey { pid, comm };

    unsafe {
        match counts.get_mut(&key) {
            Some(value) => {
                // compiles to an atomic add, concurrent hits on other cpus are not lost
                let value = &*(value as *mut u64 as *const AtomicU64);
                value.fetch_add(1, Ordering::Relaxed);
            },
            None => counts.set(&key, &1),
        }
    }
}
