//! Configuration for the provisioning pipeline, in the teacher's
//! `CliArgs`/`structopt` idiom (`control-plane/agents/core/src/server.rs`).

use crate::constant::{DEFAULT_POLLING_INTERVAL, DEFAULT_TIMEOUT_INTERVAL};
use std::time::Duration;
use structopt::StructOpt;

/// Runtime-tunable intervals for the pipeline. Library consumers build
/// this directly; [`CliArgs`] is how the demo binary collects the same
/// values from the command line.
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    /// Overall per-operation wall-clock budget.
    pub timeout_interval: Duration,
    /// Interval between status polls / retries when the server doesn't
    /// specify its own `retry-after`.
    pub polling_interval: Duration,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            timeout_interval: DEFAULT_TIMEOUT_INTERVAL,
            polling_interval: DEFAULT_POLLING_INTERVAL,
        }
    }
}

impl From<CliArgs> for ProvisioningConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            timeout_interval: args.timeout_interval.into(),
            polling_interval: args.polling_interval.into(),
        }
    }
}

/// CLI flags for the demo binary, mirroring
/// `control-plane/agents/core/src/server.rs::CliArgs`'s use of
/// `humantime::Duration` for human-readable interval flags.
#[derive(Debug, StructOpt)]
#[structopt(name = "provisioning-demo")]
pub struct CliArgs {
    /// Device registration id to provision.
    #[structopt(long, short)]
    pub registration_id: String,

    /// Optional custom payload to attach to the registration request, as
    /// a raw JSON string.
    #[structopt(long)]
    pub payload: Option<String>,

    /// Overall per-operation wall-clock budget.
    #[structopt(long, default_value = "30s")]
    pub timeout_interval: humantime::Duration,

    /// Interval between status polls / retries when the server doesn't
    /// specify its own `retry-after`.
    #[structopt(long, default_value = "2s")]
    pub polling_interval: humantime::Duration,
}
