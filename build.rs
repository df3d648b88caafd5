//! Selects the atomic primitive family for the target.
//!
//! Emits exactly one `memorder_backend="..."` cfg, plus `memorder_broken_64` when
//! 64-bit cells must go through the lock-based fallback and
//! `memorder_native_atomics` when the target has 8/16/32-bit hardware atomics.

use std::env;

const FORCED: &[(&str, &str)] = &[
    ("CARGO_FEATURE_BACKEND_BUILTIN", "builtin"),
    ("CARGO_FEATURE_BACKEND_LEGACY", "legacy"),
    ("CARGO_FEATURE_BACKEND_NATIVE", "native"),
    ("CARGO_FEATURE_BACKEND_LOCK", "lock"),
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!(
        "cargo:rustc-check-cfg=cfg(memorder_backend, values(\"builtin\", \"legacy\", \"native\", \"lock\"))"
    );
    println!("cargo:rustc-check-cfg=cfg(memorder_broken_64)");
    println!("cargo:rustc-check-cfg=cfg(memorder_native_atomics)");

    let os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let pointer_width = env::var("CARGO_CFG_TARGET_POINTER_WIDTH").unwrap_or_default();
    let has_atomic = env::var("CARGO_CFG_TARGET_HAS_ATOMIC").unwrap_or_default();
    let has = |width: &str| has_atomic.split(',').any(|w| w == width);

    let native_atomics = has("8") && has("16") && has("32");
    if native_atomics {
        println!("cargo:rustc-cfg=memorder_native_atomics");
    }

    let forced: Vec<&str> = FORCED
        .iter()
        .filter(|(var, _)| env::var_os(var).is_some())
        .map(|&(_, name)| name)
        .collect();

    let backend = match forced.as_slice() {
        [] if !native_atomics => "lock",
        [] if os == "windows" => "native",
        [] => "builtin",
        [name] => {
            if *name != "lock" && !native_atomics {
                panic!("backend-{name} requires 8/16/32-bit atomics, which {arch} does not provide");
            }
            *name
        }
        many => panic!("at most one backend-* feature may be enabled, got {many:?}"),
    };
    println!("cargo:rustc-cfg=memorder_backend=\"{backend}\"");

    // 64-bit builtins are absent or miscompiled on these 32-bit families. The
    // native intrinsics are unaffected; they only need the hardware atomic.
    let broken_family = pointer_width == "32"
        && matches!(arch.as_str(), "arm" | "mips" | "mips32r6" | "powerpc");
    let broken_builtins = broken_family && matches!(backend, "builtin" | "legacy");
    if backend != "lock" && (broken_builtins || !has("64")) {
        println!("cargo:rustc-cfg=memorder_broken_64");
    }
}
