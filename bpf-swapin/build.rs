// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

// Compiles the `kprobe` binary for the BPF target, `CODE` embeds the result.
#[cfg(feature = "facade")]
fn main() {
    use std::{env, path::{Path, PathBuf}};
    use cargo_bpf_lib as cargo_bpf;

    println!("cargo:rerun-if-env-changed=KERNEL_SOURCE");
    let kernel_source = match env::var("KERNEL_SOURCE") {
        Ok(dir) => dir,
        Err(_) => panic!("set `KERNEL_SOURCE` to the kernel headers the swap-in probe builds against"),
    };
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("cargo sets `OUT_DIR`"));
    let cargo = PathBuf::from(env::var_os("CARGO").expect("cargo sets `CARGO`"));
    let crate_dir = Path::new(".");

    for file in cargo_bpf::probe_files(crate_dir).expect("listing probe sources") {
        println!("cargo:rerun-if-changed={}", file);
    }

    let programs = vec!["kprobe".to_string()];
    if let Err(error) = cargo_bpf::build_ext(
        &cargo,
        crate_dir,
        &out_dir.join("target"),
        programs,
        Some(kernel_source.as_ref()),
    ) {
        panic!("swap-in probe failed to compile: {:?}", error);
    }
}

#[cfg(not(feature = "facade"))]
fn main() {}
