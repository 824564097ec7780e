//! Benchmark suites
//!
//! A suite lives at `<TOPDIR>/<name>` and builds into `<TOPDIR>/build/<name>`.

use crate::arch::Architecture;
use crate::bench::descriptor::{Benchmark, Phase, RoundTrip};
use crate::config::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// AES key used by the rijndael round trip.
const RIJNDAEL_KEY: &str = "1234567890abcdeffedcba09876543211234567890abcdeffedcba0987654321";

/// Ordered collection of benchmarks sharing a source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    /// Directory name under `TOPDIR` and under the build directory
    pub name: String,
    /// Extra or overriding architecture descriptors
    #[serde(default)]
    pub architectures: Vec<Architecture>,
    pub benchmarks: Vec<Benchmark>,
}

impl Suite {
    pub fn new(name: impl Into<String>, benchmarks: Vec<Benchmark>) -> Self {
        Self {
            name: name.into(),
            architectures: Vec::new(),
            benchmarks,
        }
    }

    /// The MiBench programs known to run correctly on rv32.
    pub fn mibench() -> Self {
        let rijndael_enc = "{dstdir}/{prefix}output_large{mode}.enc";
        let rijndael_dec = "{dstdir}/{prefix}output_large{mode}.dec";
        let rijndael_in = "{srcdir}/input_large.asc";

        Self::new(
            "mibench",
            vec![
                Benchmark::new("dijkstra", "network/dijkstra", &["dijkstra_large.c"])
                    .with_args(&["{root}/network/dijkstra/input.dat"]),
                Benchmark::new("crc32", "telecomm/CRC32", &["crc_32.c"])
                    .with_args(&["{root}/telecomm/adpcm/data/large.pcm"]),
                Benchmark::new("rijndael", "security/rijndael", &["aes.c", "aesxam.c"])
                    .with_round_trip(RoundTrip {
                        input: rijndael_in.to_string(),
                        output: rijndael_dec.to_string(),
                        phases: vec![
                            Phase::new(
                                "-encode",
                                vec![
                                    rijndael_in.to_string(),
                                    rijndael_enc.to_string(),
                                    "e".to_string(),
                                    RIJNDAEL_KEY.to_string(),
                                ],
                            ),
                            Phase::new(
                                "-decode",
                                vec![
                                    rijndael_enc.to_string(),
                                    rijndael_dec.to_string(),
                                    "d".to_string(),
                                    RIJNDAEL_KEY.to_string(),
                                ],
                            ),
                        ],
                    }),
                Benchmark::new("sha", "security/sha", &["sha_driver.c", "sha.c"])
                    .with_args(&["{srcdir}/input_large.asc"]),
                Benchmark::new(
                    "stringsearch",
                    "office/stringsearch",
                    &["bmhasrch.c", "bmhisrch.c", "bmhsrch.c", "pbmsrch_large.c"],
                ),
                Benchmark::new("rawcaudio", "telecomm/adpcm/src", &["rawcaudio.c", "adpcm.c"])
                    .with_stdin("{root}/telecomm/adpcm/data/large.pcm"),
            ],
        )
    }

    /// Parse a suite from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a suite from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::SuiteRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn get(&self, name: &str) -> Option<&Benchmark> {
        self.benchmarks.iter().find(|b| b.name == name)
    }
}

impl Default for Suite {
    fn default() -> Self {
        Self::mibench()
    }
}
