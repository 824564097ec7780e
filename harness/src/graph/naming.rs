//! Variant and target naming
//!
//! Shared by the generator and the measurement engine so that the binaries a
//! Makefile builds are exactly the ones `xbench measure` looks for.

use crate::mode::TranslationMode;
use serde::{Deserialize, Serialize};

/// Prefix a logical name with an architecture prefix: `x86` + `crc32` → `x86-crc32`.
pub fn add_prefix(prefix: &str, name: &str) -> String {
    format!("{prefix}-{name}")
}

/// Combined object file for a benchmark: `rv32` + `dijkstra` → `rv32-dijkstra.o`.
pub fn object_name(prefix: &str, bench: &str) -> String {
    format!("{}.o", add_prefix(prefix, bench))
}

/// Object file for a C source: `x86` + `aes.c` → `x86-aes.o`.
pub fn source_object_name(prefix: &str, source: &str) -> String {
    let stem = source
        .rsplit_once('.')
        .map_or(source, |(stem, _ext)| stem);
    format!("{}.o", add_prefix(prefix, stem))
}

pub fn run_target(out: &str) -> String {
    format!("{out}-run")
}

pub fn phase_run_target(out: &str, suffix: &str) -> String {
    format!("{out}{suffix}-run")
}

pub fn test_target(out: &str) -> String {
    format!("{out}-test")
}

pub fn measure_target(bench: &str) -> String {
    format!("{bench}-measure")
}

pub fn phase_measure_target(bench: &str, suffix: &str) -> String {
    format!("{bench}{suffix}-measure")
}

/// One executable flavour of a benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variant {
    /// Compiled directly for the architecture with `prefix`
    Native { prefix: String },
    /// Translated from `foreign` to `native` under `mode`
    Translated {
        foreign: String,
        native: String,
        mode: TranslationMode,
    },
}

impl Variant {
    pub fn native(prefix: impl Into<String>) -> Self {
        Variant::Native {
            prefix: prefix.into(),
        }
    }

    pub fn translated(
        foreign: impl Into<String>,
        native: impl Into<String>,
        mode: TranslationMode,
    ) -> Self {
        Variant::Translated {
            foreign: foreign.into(),
            native: native.into(),
            mode,
        }
    }

    /// `x86` or `rv32-x86`
    pub fn prefix(&self) -> String {
        match self {
            Variant::Native { prefix } => prefix.clone(),
            Variant::Translated {
                foreign, native, ..
            } => add_prefix(foreign, native),
        }
    }

    pub fn mode(&self) -> Option<TranslationMode> {
        match self {
            Variant::Native { .. } => None,
            Variant::Translated { mode, .. } => Some(*mode),
        }
    }

    /// Report label: `native` or the mode name.
    pub fn label(&self) -> &'static str {
        self.mode().map_or("native", TranslationMode::as_str)
    }

    /// Binary name: `x86-crc32`, `rv32-x86-crc32-globals`.
    pub fn output_name(&self, bench: &str) -> String {
        let base = add_prefix(&self.prefix(), bench);
        match self.mode() {
            None => base,
            Some(mode) => format!("{base}-{mode}"),
        }
    }

    /// `{prefix}` template value: the variant prefix followed by `-`.
    pub fn prefix_token(&self) -> String {
        format!("{}-", self.prefix())
    }

    /// `{mode}` template value: `-` followed by the mode, empty for native.
    pub fn mode_token(&self) -> String {
        self.mode().map(|m| format!("-{m}")).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_names() {
        let v = Variant::native("x86");
        assert_eq!(v.output_name("crc32"), "x86-crc32");
        assert_eq!(v.label(), "native");
        assert_eq!(v.prefix_token(), "x86-");
        assert_eq!(v.mode_token(), "");
    }

    #[test]
    fn test_translated_names() {
        let v = Variant::translated("rv32", "x86", TranslationMode::Locals);
        assert_eq!(v.prefix(), "rv32-x86");
        assert_eq!(v.output_name("crc32"), "rv32-x86-crc32-locals");
        assert_eq!(v.label(), "locals");
        assert_eq!(v.prefix_token(), "rv32-x86-");
        assert_eq!(v.mode_token(), "-locals");
    }

    #[test]
    fn test_translated_never_collides_with_native() {
        let native = Variant::native("rv32-x86").output_name("crc32");
        for mode in TranslationMode::ALL {
            let xlated = Variant::translated("rv32", "x86", mode).output_name("crc32");
            assert_ne!(native, xlated);
        }
    }

    #[test]
    fn test_object_names() {
        assert_eq!(object_name("rv32", "dijkstra"), "rv32-dijkstra.o");
        assert_ne!(object_name("a", "ab"), object_name("ab", "ab"));
        assert_eq!(object_name("ab", "ab"), "ab-ab.o");
        assert_eq!(source_object_name("x86", "aesxam.c"), "x86-aesxam.o");
        assert_eq!(source_object_name("x86", "noext"), "x86-noext.o");
    }

    #[test]
    fn test_target_names() {
        assert_eq!(run_target("x86-sha"), "x86-sha-run");
        assert_eq!(phase_run_target("x86-rijndael", "-encode"), "x86-rijndael-encode-run");
        assert_eq!(test_target("x86-sha"), "x86-sha-test");
        assert_eq!(measure_target("sha"), "sha-measure");
        assert_eq!(phase_measure_target("rijndael", "-decode"), "rijndael-decode-measure");
    }
}
