//! Process-wide configuration
//!
//! Resolved exactly once at startup and passed by reference into the
//! generator and the measurement engine. Nothing downstream reads the
//! environment or the current directory again.
//!
//! | Variable         | Meaning                                   | Default            |
//! |------------------|-------------------------------------------|--------------------|
//! | `TOPDIR`         | project root (sources, toolchain, build)  | required           |
//! | `BUILD_TYPE`     | toolchain flavour (`Debug` / `Release`)   | `Debug`            |
//! | `XBENCH_BIN`     | command used by generated measure tasks   | `xbench`           |
//! | `XBENCH_SCRATCH` | directory for per-trial output files      | system temp dir    |
//! | `XBENCH_MODES`   | comma separated translation modes         | `globals,locals`   |
//! | `XBENCH_TRIALS`  | trials per variant                        | `10`               |
//! | `SBT_FLAGS`      | extra flags passed to the translator      | empty              |
//! | `XBENCH_OBJDUMP` | foreign-arch disassembler (optional tool) | riscv objdump      |

use crate::mode::{ModeError, ModeSet};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Result type alias for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Trials per variant when nothing else is configured.
pub const DEFAULT_TRIALS: usize = 10;

/// A standard deviation needs at least two samples.
pub const MIN_TRIALS: usize = 2;

const DEFAULT_OBJDUMP: &str = "riscv64-unknown-linux-gnu-objdump";

/// Errors resolving configuration or loading a suite
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("required environment variable {var} is not set")]
    MissingEnvironment { var: &'static str },

    /// `TOPDIR` is set but unusable
    #[error("TOPDIR {} is not a directory", path.display())]
    InvalidTopDir { path: PathBuf },

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },

    #[error(transparent)]
    Mode(#[from] ModeError),

    /// Suite file could not be read
    #[error("failed to read suite {}: {source}", path.display())]
    SuiteRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Suite file is not valid TOML for a suite
    #[error("invalid suite definition: {0}")]
    InvalidSuite(#[from] toml::de::Error),
}

/// Toolchain flavour, selects `toolchain/debug` or `toolchain/release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
    Debug,
    Release,
}

impl BuildType {
    fn parse(s: &str) -> ConfigResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            other => Err(ConfigError::InvalidValue {
                var: "BUILD_TYPE",
                message: format!("`{other}` (expected Debug or Release)"),
            }),
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            BuildType::Debug => "debug",
            BuildType::Release => "release",
        }
    }
}

/// Directory layout under `TOPDIR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirs {
    pub top: PathBuf,
    /// Root of every build output
    pub build: PathBuf,
    /// Toolchain matching the selected build type
    pub toolchain: PathBuf,
    /// Release toolchain (simulators and sysroots always come from here)
    pub toolchain_release: PathBuf,
    /// Per-trial output files of the measurement engine
    pub scratch: PathBuf,
}

impl Dirs {
    pub fn new(top: impl Into<PathBuf>, build_type: BuildType, scratch: impl Into<PathBuf>) -> Self {
        let top = top.into();
        let toolchain_root = top.join("toolchain");
        Self {
            build: top.join("build"),
            toolchain: toolchain_root.join(build_type.dir_name()),
            toolchain_release: toolchain_root.join("release"),
            scratch: scratch.into(),
            top,
        }
    }

    /// Translator data (runtime objects) installed with the toolchain.
    pub fn sbt_share(&self) -> PathBuf {
        self.toolchain.join("share").join("riscv-sbt")
    }
}

/// External commands referenced by generated recipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    /// Command generated measure tasks invoke
    pub xbench: String,
    /// Binary translator
    pub translator: String,
    /// IR to object lowering
    pub llc: String,
    /// Foreign-arch disassembler; `None` when it is not installed
    pub disassembler: Option<String>,
}

impl Tools {
    fn for_dirs(dirs: &Dirs) -> Self {
        Self {
            xbench: "xbench".to_string(),
            translator: dirs.toolchain.join("bin").join("riscv-sbt").display().to_string(),
            llc: "llc".to_string(),
            disassembler: None,
        }
    }
}

/// Immutable configuration shared by the generator and the measurement engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub dirs: Dirs,
    pub build_type: BuildType,
    pub tools: Tools,
    /// Translation modes to generate and measure
    pub modes: ModeSet,
    /// Extra translator flags, added before `-regs=<mode>`
    pub sbt_flags: Vec<String>,
    /// Trials per variant in a measurement session
    pub trials: usize,
}

impl Config {
    /// Configuration rooted at `top` with every default applied and no
    /// optional tools. Does not touch the environment.
    pub fn for_topdir(top: impl Into<PathBuf>) -> Self {
        let dirs = Dirs::new(top, BuildType::Debug, std::env::temp_dir());
        let tools = Tools::for_dirs(&dirs);
        Self {
            dirs,
            build_type: BuildType::Debug,
            tools,
            modes: ModeSet::default(),
            sbt_flags: Vec::new(),
            trials: DEFAULT_TRIALS,
        }
    }

    /// Resolve configuration from the process environment.
    ///
    /// Fails with [`ConfigError::MissingEnvironment`] when `TOPDIR` is unset.
    /// A missing disassembler only disables the tasks that need it.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), tool_available)
    }

    /// Resolve configuration from an arbitrary variable lookup and tool probe.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        probe: impl Fn(&str) -> bool,
    ) -> ConfigResult<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let top = var("TOPDIR").ok_or(ConfigError::MissingEnvironment { var: "TOPDIR" })?;
        let top = PathBuf::from(top);
        if !top.is_dir() {
            return Err(ConfigError::InvalidTopDir { path: top });
        }

        let build_type = match var("BUILD_TYPE") {
            Some(bt) => BuildType::parse(&bt)?,
            None => BuildType::Debug,
        };
        let scratch = var("XBENCH_SCRATCH")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let dirs = Dirs::new(top, build_type, scratch);

        let mut tools = Tools::for_dirs(&dirs);
        if let Some(bin) = var("XBENCH_BIN") {
            tools.xbench = bin;
        }
        let objdump = var("XBENCH_OBJDUMP").unwrap_or_else(|| DEFAULT_OBJDUMP.to_string());
        tools.disassembler = if probe(&objdump) {
            Some(objdump)
        } else {
            debug!(tool = %objdump, "Disassembler not available, skipping disassembly tasks");
            None
        };

        let modes = match var("XBENCH_MODES") {
            Some(list) => ModeSet::parse_list(&list)?,
            None => ModeSet::default(),
        };

        let sbt_flags = var("SBT_FLAGS")
            .map(|flags| flags.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let trials = match var("XBENCH_TRIALS") {
            Some(n) => match n.trim().parse::<usize>() {
                Ok(trials) if trials >= MIN_TRIALS => trials,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "XBENCH_TRIALS",
                        message: format!("`{n}` is not an integer of at least {MIN_TRIALS}"),
                    })
                }
            },
            None => DEFAULT_TRIALS,
        };

        Ok(Self {
            dirs,
            build_type,
            tools,
            modes,
            sbt_flags,
            trials,
        })
    }

    /// Replace the translation mode set.
    pub fn with_modes(mut self, modes: ModeSet) -> Self {
        self.modes = modes;
        self
    }

    /// Replace the trial count.
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Replace the scratch directory.
    pub fn with_scratch(mut self, scratch: impl AsRef<Path>) -> Self {
        self.dirs.scratch = scratch.as_ref().to_path_buf();
        self
    }
}

/// Check whether an external tool can be launched.
pub fn tool_available(bin: &str) -> bool {
    Command::new(bin)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_topdir_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[]), |_| false).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvironment { var: "TOPDIR" }));
    }

    #[test]
    fn test_empty_topdir_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[("TOPDIR", "  ")]), |_| false).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvironment { .. }));
    }

    #[test]
    fn test_nonexistent_topdir_rejected() {
        let err = Config::from_lookup(
            lookup_from(&[("TOPDIR", "/definitely/not/a/real/topdir")]),
            |_| false,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTopDir { .. }));
    }

    #[test]
    fn test_defaults_applied() {
        let dir = tempfile::tempdir().unwrap();
        let top = dir.path().to_str().unwrap();
        let config = Config::from_lookup(lookup_from(&[("TOPDIR", top)]), |_| false).unwrap();

        assert_eq!(config.build_type, BuildType::Debug);
        assert_eq!(config.dirs.build, dir.path().join("build"));
        assert_eq!(config.dirs.toolchain, dir.path().join("toolchain/debug"));
        assert_eq!(config.dirs.toolchain_release, dir.path().join("toolchain/release"));
        assert_eq!(config.modes, ModeSet::default());
        assert_eq!(config.trials, DEFAULT_TRIALS);
        assert_eq!(config.tools.xbench, "xbench");
        assert!(config.tools.disassembler.is_none());
        assert!(config.sbt_flags.is_empty());
    }

    #[test]
    fn test_overrides_applied() {
        let dir = tempfile::tempdir().unwrap();
        let top = dir.path().to_str().unwrap();
        let config = Config::from_lookup(
            lookup_from(&[
                ("TOPDIR", top),
                ("BUILD_TYPE", "Release"),
                ("XBENCH_BIN", "/opt/xbench"),
                ("XBENCH_MODES", "abi,globals"),
                ("XBENCH_TRIALS", "3"),
                ("XBENCH_SCRATCH", "/var/tmp/xb"),
                ("SBT_FLAGS", "-debug  -enable-fcsr"),
            ]),
            |_| false,
        )
        .unwrap();

        assert_eq!(config.build_type, BuildType::Release);
        assert_eq!(config.dirs.toolchain, dir.path().join("toolchain/release"));
        assert_eq!(config.tools.xbench, "/opt/xbench");
        assert_eq!(config.modes.to_list(), "abi,globals");
        assert_eq!(config.trials, 3);
        assert_eq!(config.dirs.scratch, PathBuf::from("/var/tmp/xb"));
        assert_eq!(config.sbt_flags, vec!["-debug", "-enable-fcsr"]);
    }

    #[test]
    fn test_invalid_build_type_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let top = dir.path().to_str().unwrap();
        let err = Config::from_lookup(
            lookup_from(&[("TOPDIR", top), ("BUILD_TYPE", "fast")]),
            |_| false,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "BUILD_TYPE", .. }));
    }

    #[test]
    fn test_disassembler_enabled_when_probe_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let top = dir.path().to_str().unwrap();
        let config = Config::from_lookup(
            lookup_from(&[("TOPDIR", top), ("XBENCH_OBJDUMP", "my-objdump")]),
            |bin| bin == "my-objdump",
        )
        .unwrap();
        assert_eq!(config.tools.disassembler.as_deref(), Some("my-objdump"));
    }

    #[test]
    fn test_bad_modes_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let top = dir.path().to_str().unwrap();
        let err = Config::from_lookup(
            lookup_from(&[("TOPDIR", top), ("XBENCH_MODES", "globals,fast")]),
            |_| false,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Mode(ModeError::Unknown(_))));
    }

    #[test]
    fn test_too_few_trials_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let top = dir.path().to_str().unwrap();
        for n in ["0", "1", "-3", "ten"] {
            let err = Config::from_lookup(
                lookup_from(&[("TOPDIR", top), ("XBENCH_TRIALS", n)]),
                |_| false,
            )
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { var: "XBENCH_TRIALS", .. }),
                "{n}"
            );
        }
        let config = Config::from_lookup(
            lookup_from(&[("TOPDIR", top), ("XBENCH_TRIALS", "2")]),
            |_| false,
        )
        .unwrap();
        assert_eq!(config.trials, MIN_TRIALS);
    }

    #[test]
    fn test_missing_tool_probe_fails_quietly() {
        assert!(!tool_available("xbench-no-such-tool-on-path"));
    }
}
