use std::env;

use chrono;
use chrono::{Days, NaiveDate};
use clap::Parser;
use secrecy::Secret;

use crate::linky::Period;

pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Long options that are also accepted with a single leading dash.
const SINGLE_DASH_LONGS: [&str; 4] = ["username", "password", "startDate", "endDate"];

#[derive(Debug)]
pub struct Config {
    pub username: String,
    pub password: Secret<String>,
    pub start_date: String,
    pub end_date: String,
    pub period: Period,
    pub verbose: bool,
}

impl Config {
    pub fn get() -> Config {
        let today = chrono::offset::Local::now().date_naive();
        Cli::parse_from(normalize_args(env::args())).to_config(today)
    }

    pub fn try_from_args<I, T>(args: I, today: NaiveDate) -> Result<Config, String>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Cli::try_parse_from(normalize_args(args))
            .map(|cli| cli.to_config(today))
            .map_err(|err| err.to_string())
    }
}

#[derive(Debug, Parser)]
#[command(name = "linky-dump")]
#[command(version = "0.1.0")]
#[command(about = "Dump Enedis Linky consumption data as JSON", long_about = None)]
struct Cli {
    /// Enedis username
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    username: String,
    /// Enedis password
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    password: String,
    /// Start date (Default: yesterday)
    #[arg(long = "startDate", value_name = "DD/MM/YYYY", allow_hyphen_values = true)]
    start_date: Option<String>,
    /// End date (Default: today)
    #[arg(long = "endDate", value_name = "DD/MM/YYYY", allow_hyphen_values = true)]
    end_date: Option<String>,
    /// Aggregation of the consumption curve
    #[arg(long, value_enum, default_value_t = Period::Hour)]
    period: Period,
    #[arg(short, long)]
    verbose: bool,
}

pub fn default_dates(today: NaiveDate) -> (String, String) {
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    (
        yesterday.format(DATE_FORMAT).to_string(),
        today.format(DATE_FORMAT).to_string(),
    )
}

impl Cli {
    fn to_config(self, today: NaiveDate) -> Config {
        let (yesterday, today) = default_dates(today);
        Config {
            username: self.username,
            password: Secret::new(self.password),
            start_date: self.start_date.unwrap_or(yesterday),
            end_date: self.end_date.unwrap_or(today),
            period: self.period,
            verbose: self.verbose,
        }
    }
}

fn single_dash_long(arg: &str) -> Option<String> {
    let rest = arg.strip_prefix('-')?;
    if rest.starts_with('-') {
        return None;
    }
    let name = rest.split('=').next().unwrap_or(rest);
    if SINGLE_DASH_LONGS.contains(&name) {
        Some(format!("-{}", arg))
    } else {
        None
    }
}

/// Rewrites `-username value` / `-username=value` (and the other three
/// long options) to their double-dash form. Values are never rewritten.
fn normalize_args<I, T>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut out = Vec::new();
    let mut expect_value = false;
    for (i, arg) in args.into_iter().map(Into::into).enumerate() {
        if i == 0 || expect_value {
            expect_value = false;
            out.push(arg);
            continue;
        }
        let arg = single_dash_long(&arg).unwrap_or(arg);
        expect_value = arg
            .strip_prefix("--")
            .map_or(false, |name| SINGLE_DASH_LONGS.contains(&name) || name == "period");
        out.push(arg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use secrecy::ExposeSecret;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(day(2024, 1, 2), "01/01/2024", "02/01/2024")]
    #[case(day(2024, 1, 1), "31/12/2023", "01/01/2024")]
    #[case(day(2024, 3, 1), "29/02/2024", "01/03/2024")]
    #[case(day(2023, 3, 1), "28/02/2023", "01/03/2023")]
    fn cfg_default_dates(#[case] today: NaiveDate, #[case] start: &str, #[case] end: &str) {
        let cfg = Config::try_from_args(["linky-dump"], today).unwrap();
        assert_eq!(cfg.start_date, start);
        assert_eq!(cfg.end_date, end);
        assert_eq!(cfg.username, "");
        assert_eq!(cfg.password.expose_secret(), "");
        assert_eq!(cfg.period, Period::Hour);
        assert!(!cfg.verbose);
    }

    #[test]
    fn cfg_passthrough() {
        let cfg = Config::try_from_args(
            [
                "linky-dump",
                "--username",
                " Alice ",
                "--password",
                "S3cret!",
                "--startDate",
                "not a date",
                "--endDate",
                "",
            ],
            day(2024, 6, 1),
        )
        .unwrap();
        assert_eq!(cfg.username, " Alice ");
        assert_eq!(cfg.password.expose_secret(), "S3cret!");
        assert_eq!(cfg.start_date, "not a date");
        assert_eq!(cfg.end_date, "");
    }

    #[test]
    fn cfg_single_dash() {
        let cfg = Config::try_from_args(
            [
                "linky-dump",
                "-username",
                "alice",
                "-password=secret",
                "-startDate",
                "01/01/2024",
                "-endDate=02/01/2024",
            ],
            day(2024, 6, 1),
        )
        .unwrap();
        assert_eq!(cfg.username, "alice");
        assert_eq!(cfg.password.expose_secret(), "secret");
        assert_eq!(cfg.start_date, "01/01/2024");
        assert_eq!(cfg.end_date, "02/01/2024");
    }

    #[test]
    fn cfg_value_looking_like_flag_is_kept() {
        let cfg = Config::try_from_args(
            ["linky-dump", "--password", "-username", "-username", "bob"],
            day(2024, 6, 1),
        )
        .unwrap();
        assert_eq!(cfg.password.expose_secret(), "-username");
        assert_eq!(cfg.username, "bob");
    }

    #[test]
    fn cfg_period_and_verbose() {
        let args = ["linky-dump", "--period", "day", "-v"];
        let cfg = Config::try_from_args(args, day(2024, 6, 1)).unwrap();
        assert_eq!(cfg.period, Period::Day);
        assert!(cfg.verbose);
    }

    #[test]
    fn cfg_invalid() {
        let today = day(2024, 6, 1);
        assert!(Config::try_from_args(["linky-dump", "--period", "week"], today).is_err());
        assert!(Config::try_from_args(["linky-dump", "--foobar"], today).is_err());
    }

    #[test]
    fn password_is_redacted_in_debug() {
        let cfg = Config::try_from_args(["linky-dump", "--password", "hunter2"], day(2024, 6, 1))
            .unwrap();
        assert!(!format!("{:?}", cfg).contains("hunter2"));
    }
}
