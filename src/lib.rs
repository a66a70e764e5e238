// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

mod error;
pub use self::error::Error;

mod table;
pub use self::table::{CounterTable, Entry, MemoryTable};

mod extractor;
pub use self::extractor::Extractor;

mod report;
pub use self::report::Report;

mod interrupt;
pub use self::interrupt::Interrupt;

mod drain;
pub use self::drain::{run, Config};

mod options;
pub use self::options::Opts;

pub mod symbols;

#[cfg(feature = "kernel")]
mod kernel;
#[cfg(feature = "kernel")]
pub use self::kernel::KernelTable;

pub use bpf_swapin::{CounterKey, COMM_LEN};
