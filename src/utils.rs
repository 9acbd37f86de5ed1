use log;
use stderrlog::{self, ColorChoice, Timestamp};

pub fn init_log(verbose: bool) -> Result<(), String> {
    stderrlog::new()
        .color(ColorChoice::Auto)
        .timestamp(Timestamp::Second)
        .show_module_names(verbose)
        .verbosity(if verbose { log::Level::Debug } else { log::Level::Info })
        .init()
        .map_err(|err| format!("Could not set up logging: {}", err))
}
