// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "swap_readpage() and swap_read_folio() kernel function not found or traceable. \
         The kernel might be too old or the function has been inlined."
    )]
    NoSwapHook,
    #[error("{}", _0)]
    Io(#[from] io::Error),
    #[error("bpf: {}", _0)]
    Bpf(String),
    #[error("failed to obtain superuser permission: {}", _0)]
    Privileges(String),
    #[cfg(feature = "kernel")]
    #[error("failed to setup ctrl+c handler: {}", _0)]
    Signal(#[from] ctrlc::Error),
}
