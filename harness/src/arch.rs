//! Target architecture descriptors
//!
//! An [`Architecture`] is plain data: naming prefix, GNU triple, run wrapper
//! and the flag fragments its toolchain needs. Flag strings that depend on
//! debug/optimization choices are computed by the free functions
//! [`cc_flags`] and [`llc_flags`].

use crate::config::Dirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flags common to every C compilation
pub const CFLAGS: &str = "-fno-exceptions";

const OPT_FLAG: &str = "-O3";
const NO_OPT_FLAG: &str = "-O0";

const RV32_TRIPLE: &str = "riscv32-unknown-elf";
const RV32_LINUX_TRIPLE: &str = "riscv64-unknown-linux-gnu";
const RV32_MARCH: &str = "riscv32";
const RV32_MATTR: &str = "-a,-c,+m,+f,+d";
const RV32_LINUX_GCC_FLAGS: &str = "-march=rv32g -mabi=ilp32";
const RV32_LINUX_LD_FLAGS: &str = "-m elf32lriscv";

/// Static description of a compilation/execution target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    /// Unique name inside an [`ArchSet`] (e.g. `rv32-linux`)
    pub name: String,
    /// Prefix used for binary and object names (e.g. `rv32`)
    pub prefix: String,
    /// GNU triple; the compiler is `<triple>-gcc`, the linker `<triple>-ld`
    pub triple: String,
    /// Wrapper prepended to run a binary (simulator, emulator); empty for host
    #[serde(default)]
    pub run: String,
    pub march: String,
    #[serde(default)]
    pub mattr: String,
    /// Architecture specific gcc flags
    #[serde(default)]
    pub gcc_flags: String,
    /// Architecture specific llc flags
    #[serde(default)]
    pub llc_flags: String,
    /// Flags for relocatable links with `<triple>-ld`
    #[serde(default)]
    pub ld_flags: String,
}

/// Debug / optimization toggles for generated compile commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    pub debug: bool,
    pub optimize: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            debug: false,
            optimize: true,
        }
    }
}

fn opt_flag(optimize: bool) -> &'static str {
    if optimize {
        OPT_FLAG
    } else {
        NO_OPT_FLAG
    }
}

fn join_nonempty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// C compiler driver for an architecture.
pub fn cc(arch: &Architecture) -> String {
    format!("{}-gcc", arch.triple)
}

/// Linker used for relocatable links.
pub fn ld(arch: &Architecture) -> String {
    format!("{}-ld", arch.triple)
}

/// gcc flags for `arch` under `opts`.
pub fn cc_flags(arch: &Architecture, opts: BuildOptions) -> String {
    join_nonempty(&[
        if opts.debug { "-g" } else { "" },
        opt_flag(opts.optimize),
        CFLAGS,
        &arch.gcc_flags,
    ])
}

/// llc flags for lowering translated IR to `arch`.
pub fn llc_flags(arch: &Architecture, opts: BuildOptions) -> String {
    join_nonempty(&[
        "-relocation-model=static",
        opt_flag(opts.optimize),
        &arch.llc_flags,
    ])
}

fn march_mattr(march: &str, mattr: &str) -> String {
    format!("-march={march} -mattr={mattr}")
}

/// Bare-metal RISC-V 32, run under spike + proxy kernel.
pub fn rv32(dirs: &Dirs) -> Architecture {
    let release = &dirs.toolchain_release;
    let pk = release.join(RV32_TRIPLE).join("bin").join("pk");
    Architecture {
        name: "rv32".into(),
        prefix: "rv32".into(),
        triple: RV32_TRIPLE.into(),
        run: format!(
            "LD_LIBRARY_PATH={}/lib spike {}",
            release.display(),
            pk.display()
        ),
        march: RV32_MARCH.into(),
        mattr: RV32_MATTR.into(),
        gcc_flags: String::new(),
        llc_flags: march_mattr(RV32_MARCH, RV32_MATTR),
        ld_flags: String::new(),
    }
}

/// Linux RISC-V 32, run under qemu user mode.
pub fn rv32_linux(dirs: &Dirs) -> Architecture {
    let sysroot = dirs.toolchain_release.join("opt").join("riscv").join("sysroot");
    Architecture {
        name: "rv32-linux".into(),
        prefix: "rv32".into(),
        triple: RV32_LINUX_TRIPLE.into(),
        run: format!("qemu-riscv32 -L {}", sysroot.display()),
        march: RV32_MARCH.into(),
        mattr: RV32_MATTR.into(),
        gcc_flags: RV32_LINUX_GCC_FLAGS.into(),
        llc_flags: march_mattr(RV32_MARCH, RV32_MATTR),
        ld_flags: RV32_LINUX_LD_FLAGS.into(),
    }
}

/// 32-bit x86 host.
pub fn x86() -> Architecture {
    Architecture {
        name: "x86".into(),
        prefix: "x86".into(),
        triple: "x86_64-linux-gnu".into(),
        run: String::new(),
        march: "x86".into(),
        mattr: "avx".into(),
        gcc_flags: "-m32".into(),
        llc_flags: march_mattr("x86", "avx"),
        ld_flags: "-m elf_i386".into(),
    }
}

/// RISC-V 32 code built against the x86 host headers, for translation.
pub fn rv32_for_x86() -> Architecture {
    Architecture {
        name: "rv32-for-x86".into(),
        prefix: "rv32-for-x86".into(),
        triple: RV32_LINUX_TRIPLE.into(),
        run: String::new(),
        march: RV32_MARCH.into(),
        mattr: RV32_MATTR.into(),
        gcc_flags: RV32_LINUX_GCC_FLAGS.into(),
        llc_flags: march_mattr(RV32_MARCH, RV32_MATTR),
        ld_flags: RV32_LINUX_LD_FLAGS.into(),
    }
}

/// Architectures addressable by name, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchSet {
    archs: BTreeMap<String, Architecture>,
}

impl ArchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four built-in targets.
    pub fn standard(dirs: &Dirs) -> Self {
        let mut set = Self::new();
        for arch in [rv32(dirs), rv32_linux(dirs), x86(), rv32_for_x86()] {
            set.insert(arch);
        }
        set
    }

    /// Add or replace an architecture. Returns the replaced descriptor.
    pub fn insert(&mut self, arch: Architecture) -> Option<Architecture> {
        self.archs.insert(arch.name.clone(), arch)
    }

    pub fn get(&self, name: &str) -> Option<&Architecture> {
        self.archs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.archs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.archs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Architecture> {
        self.archs.values()
    }
}
