use clap::ValueEnum;
use secrecy::Secret;
use serde_json as json;

#[derive(thiserror::Error, Debug)]
pub enum LinkyError {
    /// Bad credentials, locked account, or the portal refusing the session.
    #[error("{0}")]
    Login(String),
    /// Network trouble or an error reported by the portal while fetching.
    #[error("{0}")]
    Service(String),
}

/// Aggregation level of the consumption curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Period {
    Hour,
    Day,
    Month,
    Year,
}

impl Period {
    pub fn resource_id(self) -> &'static str {
        match self {
            Period::Hour => "urlCdcHeure",
            Period::Day => "urlCdcJour",
            Period::Month => "urlCdcMois",
            Period::Year => "urlCdcAn",
        }
    }
}

/// Anything able to open a session on a provider portal and hand back
/// consumption data for a date range.
///
/// Dates are passed as the caller typed them (`DD/MM/YYYY`); the returned
/// document is whatever the provider produced.
pub trait ConsumptionProvider {
    type Session;

    fn login(&self, username: &str, password: &Secret<String>)
        -> Result<Self::Session, LinkyError>;

    fn fetch(
        &self,
        session: &Self::Session,
        period: Period,
        start_date: &str,
        end_date: &str,
    ) -> Result<json::Value, LinkyError>;

    fn fetch_hourly(
        &self,
        session: &Self::Session,
        start_date: &str,
        end_date: &str,
    ) -> Result<json::Value, LinkyError> {
        self.fetch(session, Period::Hour, start_date, end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Period::Hour, "urlCdcHeure")]
    #[case(Period::Day, "urlCdcJour")]
    #[case(Period::Month, "urlCdcMois")]
    #[case(Period::Year, "urlCdcAn")]
    fn period_resource_ids(#[case] period: Period, #[case] expected: &str) {
        assert_eq!(period.resource_id(), expected);
    }

    #[test]
    fn error_displays_provider_message() {
        let err = LinkyError::Login("bad credentials".to_string());
        assert_eq!(err.to_string(), "bad credentials");
        let err = LinkyError::Service("portal down".to_string());
        assert_eq!(err.to_string(), "portal down");
    }

    struct Recorder;

    impl ConsumptionProvider for Recorder {
        type Session = ();

        fn login(&self, _: &str, _: &Secret<String>) -> Result<(), LinkyError> {
            Ok(())
        }

        fn fetch(
            &self,
            _: &(),
            period: Period,
            start_date: &str,
            end_date: &str,
        ) -> Result<json::Value, LinkyError> {
            Ok(json::json!([period.resource_id(), start_date, end_date]))
        }
    }

    #[test]
    fn fetch_hourly_asks_for_hour_period() {
        let v = Recorder.fetch_hourly(&(), "01/01/2024", "02/01/2024").unwrap();
        assert_eq!(v, json::json!(["urlCdcHeure", "01/01/2024", "02/01/2024"]));
    }
}
