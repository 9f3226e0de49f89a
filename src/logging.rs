//! Logger set-up shared by the binaries.

use env_logger::{Builder, Env};
use log::LevelFilter;

const CRATE_TARGET: &str = "goalfinder";
const DEFAULT_FILTER: &str = "warn";

/// Start `env_logger` from `RUST_LOG` (default `warn`). With `verbose` set,
/// this crate and `bin_target` log at info regardless of `RUST_LOG`.
///
/// Call after the configuration is loaded so `GOALFINDER_VERBOSE` counts.
pub fn init(verbose: bool, bin_target: &str) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    apply_verbose(&mut builder, verbose, bin_target);
    builder.init();
}

pub fn apply_verbose(builder: &mut Builder, verbose: bool, bin_target: &str) {
    if verbose {
        builder.filter_module(CRATE_TARGET, LevelFilter::Info);
        builder.filter_module(bin_target, LevelFilter::Info);
    }
}
