pub mod config;
pub mod enedis;
pub mod linky;
pub mod output;
pub mod utils;

use std::io::{self, Write};

use log;

use crate::{
    config::Config,
    linky::{ConsumptionProvider, LinkyError},
};

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Provider(#[from] LinkyError),
    #[error("Could not write the consumption data: {0}")]
    Output(#[from] io::Error),
}

/// Logs in, fetches the requested curve and writes it to `out`.
///
/// Nothing reaches `out` unless both provider calls succeed.
pub fn run<P, W>(cfg: &Config, provider: &P, out: &mut W) -> Result<(), RunError>
where
    P: ConsumptionProvider,
    W: Write,
{
    log::debug!(target: "run", "cfg={:?}", cfg);

    log::debug!(target: "run", "authenticating as {:?}", cfg.username);
    let session = provider.login(&cfg.username, &cfg.password)?;

    log::debug!(
        target: "run",
        "fetching {:?} data from {} to {}",
        cfg.period,
        cfg.start_date,
        cfg.end_date
    );
    let data = provider.fetch(&session, cfg.period, &cfg.start_date, &cfg.end_date)?;

    log::debug!(target: "run", "reporting");
    output::write_json(out, &data)?;
    Ok(())
}
