//! Benchmark descriptor types

use serde::{Deserialize, Serialize};

/// A foreign architecture whose binary is translated to run on a native one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationPair {
    /// Architecture the translated binary was compiled for
    pub foreign: String,
    /// Architecture the translation targets
    pub native: String,
}

impl TranslationPair {
    pub fn new(foreign: impl Into<String>, native: impl Into<String>) -> Self {
        Self {
            foreign: foreign.into(),
            native: native.into(),
        }
    }
}

/// One step of a round-trip benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// Appended to target and measure names (e.g. `-encode`)
    pub suffix: String,
    /// Argument template for this phase
    pub args: Vec<String>,
}

impl Phase {
    pub fn new(suffix: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            suffix: suffix.into(),
            args,
        }
    }
}

/// Two or more runs that must reproduce `input` byte for byte in `output`.
///
/// Each phase consumes what the previous one produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTrip {
    /// Template of the original input file
    pub input: String,
    /// Template of the file the last phase writes
    pub output: String,
    pub phases: Vec<Phase>,
}

/// Declarative description of one benchmark program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benchmark {
    /// Logical name; binaries are `<prefix>-<name>`
    pub name: String,
    /// Source directory relative to the suite root
    pub dir: String,
    /// C sources inside `dir`
    pub sources: Vec<String>,
    /// Run argument template (unused by round-trip benchmarks)
    #[serde(default)]
    pub args: Vec<String>,
    /// Template of a file redirected to standard input
    #[serde(default)]
    pub stdin: Option<String>,
    /// Exit code a correct run returns
    #[serde(default)]
    pub exp_rc: i32,
    /// Extra compiler flags
    #[serde(default)]
    pub cflags: Vec<String>,
    /// Extra link arguments (e.g. `-lm`)
    #[serde(default)]
    pub libs: Vec<String>,
    /// Architecture names the benchmark is built for natively
    #[serde(default = "default_natives")]
    pub natives: Vec<String>,
    /// Cross translations to build
    #[serde(default = "default_pairs")]
    pub pairs: Vec<TranslationPair>,
    #[serde(default)]
    pub round_trip: Option<RoundTrip>,
}

fn default_natives() -> Vec<String> {
    vec!["rv32-linux".to_string(), "x86".to_string()]
}

fn default_pairs() -> Vec<TranslationPair> {
    vec![TranslationPair::new("rv32-linux", "x86")]
}

impl Benchmark {
    /// Create a benchmark built for rv32-linux and x86, translated rv32 → x86.
    pub fn new(name: impl Into<String>, dir: impl Into<String>, sources: &[&str]) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            args: Vec::new(),
            stdin: None,
            exp_rc: 0,
            cflags: Vec::new(),
            libs: Vec::new(),
            natives: default_natives(),
            pairs: default_pairs(),
            round_trip: None,
        }
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn with_exp_rc(mut self, exp_rc: i32) -> Self {
        self.exp_rc = exp_rc;
        self
    }

    pub fn with_libs(mut self, libs: &[&str]) -> Self {
        self.libs = libs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_natives(mut self, natives: &[&str]) -> Self {
        self.natives = natives.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_pairs(mut self, pairs: Vec<TranslationPair>) -> Self {
        self.pairs = pairs;
        self
    }

    pub fn with_round_trip(mut self, round_trip: RoundTrip) -> Self {
        self.round_trip = Some(round_trip);
        self
    }

    pub fn is_round_trip(&self) -> bool {
        self.round_trip.is_some()
    }
}
