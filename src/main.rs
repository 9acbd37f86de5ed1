use std::io;
use std::process;

use linky_dump;
use linky_dump::config::Config;
use linky_dump::enedis::EnedisClient;
use linky_dump::utils::init_log;

fn main() {
    let cfg = Config::get();
    if let Err(msg) = init_log(cfg.verbose) {
        eprintln!("[WARNING] {}", msg);
    }

    let client = EnedisClient::default();
    if let Err(err) = linky_dump::run(&cfg, &client, &mut io::stdout().lock()) {
        log::error!("{}", err);
        process::exit(1);
    }
}
