//! Benchmark descriptors
//!
//! A [`Benchmark`] names its sources, its argument template and the
//! architectures it is built for and translated between. Benchmarks whose
//! correctness can only be checked across two runs (encrypt, then decrypt)
//! carry a [`RoundTrip`] description instead of a plain argument list.
//!
//! Descriptors are grouped into a [`Suite`], either the built-in MiBench
//! selection or one loaded from TOML.

pub mod descriptor;
pub mod suite;
pub mod template;

pub use descriptor::{Benchmark, Phase, RoundTrip, TranslationPair};
pub use suite::Suite;
pub use template::{render, TemplateError, TemplateVars};
