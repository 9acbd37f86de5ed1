use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use html_escape::decode_html_entities;
use log;
use reqwest::blocking::{Client, Response};
use reqwest::redirect::Policy;
use reqwest::Url;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json as json;

use crate::linky::{ConsumptionProvider, LinkyError, Period};

pub const LOGIN_BASE_URL: &str = "https://espace-client-connexion.enedis.fr";
pub const API_BASE_URL: &str =
    "https://espace-client-particuliers.enedis.fr/group/espace-particuliers";

const SESSION_COOKIE: &str = "iPlanetDirectoryPro";
const PORTLET: &str = "lincspartdisplaycdc_WAR_lincspartcdcportlet";
const TERMS_OF_USE_MARKER: &str = "Conditions d'utilisation";

impl From<reqwest::Error> for LinkyError {
    fn from(err: reqwest::Error) -> LinkyError {
        LinkyError::Service(format!("Request to the Enedis portal failed: {}", err))
    }
}

/// One POST against the portal: endpoint, query string and form body.
pub struct PortalApi {
    url: String,
    params: Vec<(&'static str, String)>,
    form: Vec<(String, String)>,
}

impl PortalApi {
    pub fn login(base: &str, username: &str, password: &Secret<String>) -> PortalApi {
        PortalApi {
            url: format!("{base}/auth/UI/Login"),
            params: Vec::new(),
            form: vec![
                ("IDToken1".to_string(), username.to_string()),
                ("IDToken2".to_string(), password.expose_secret().clone()),
                (
                    "SunQueryParamsString".to_string(),
                    STANDARD.encode(b"realm=particuliers"),
                ),
                ("encoded".to_string(), "true".to_string()),
                ("gx_charset".to_string(), "UTF-8".to_string()),
            ],
        }
    }

    pub fn consumption(
        base: &str,
        period: Period,
        start_date: &str,
        end_date: &str,
    ) -> PortalApi {
        PortalApi {
            url: format!("{base}/suivi-de-consommation"),
            params: vec![
                ("p_p_id", PORTLET.to_string()),
                ("p_p_lifecycle", "2".to_string()),
                ("p_p_state", "normal".to_string()),
                ("p_p_mode", "view".to_string()),
                ("p_p_resource_id", period.resource_id().to_string()),
                ("p_p_cacheability", "cacheLevelPage".to_string()),
                ("p_p_col_id", "column-1".to_string()),
                ("p_p_col_pos", "1".to_string()),
                ("p_p_col_count", "3".to_string()),
            ],
            form: vec![
                (format!("_{PORTLET}_dateDebut"), start_date.to_string()),
                (format!("_{PORTLET}_dateFin"), end_date.to_string()),
            ],
        }
    }

    pub fn build_url(&self) -> Result<Url, LinkyError> {
        let params = self.params.iter().map(|(k, v)| (*k, v.as_str()));
        Url::parse_with_params(&self.url, params).map_err(|err| {
            LinkyError::Service(format!("Invalid portal url {:?}: {}", self.url, err))
        })
    }

    pub fn post(&self, http: &Client) -> Result<Response, LinkyError> {
        let url = self.build_url()?;
        log::debug!(target: "PortalApi.post", "url={:?}", url.as_str());
        Ok(http.post(url).form(&self.form).send()?)
    }
}

/// Cookie-carrying HTTP client obtained from a successful login.
pub struct EnedisSession {
    http: Client,
}

pub struct EnedisClient {
    login_base_url: String,
    api_base_url: String,
    timeout: Duration,
}

impl Default for EnedisClient {
    fn default() -> Self {
        EnedisClient::new(LOGIN_BASE_URL.to_string(), API_BASE_URL.to_string())
    }
}

impl EnedisClient {
    pub fn new(login_base_url: String, api_base_url: String) -> EnedisClient {
        EnedisClient {
            login_base_url,
            api_base_url,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn http_client(&self) -> Result<Client, LinkyError> {
        Ok(Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .timeout(self.timeout)
            .build()?)
    }
}

impl ConsumptionProvider for EnedisClient {
    type Session = EnedisSession;

    fn login(
        &self,
        username: &str,
        password: &Secret<String>,
    ) -> Result<EnedisSession, LinkyError> {
        let http = self.http_client()?;
        let resp = PortalApi::login(&self.login_base_url, username, password).post(&http)?;
        log::debug!(target: "EnedisClient.login", "status={}", resp.status());

        if !resp.cookies().any(|c| c.name() == SESSION_COOKIE) {
            return Err(LinkyError::Login(
                "Login unsuccessful. Check your credentials.".to_string(),
            ));
        }
        Ok(EnedisSession { http })
    }

    fn fetch(
        &self,
        session: &EnedisSession,
        period: Period,
        start_date: &str,
        end_date: &str,
    ) -> Result<json::Value, LinkyError> {
        let api = PortalApi::consumption(&self.api_base_url, period, start_date, end_date);
        let mut resp = api.post(&session.http)?;

        // The first hit after login may bounce through a redirect while the
        // portal finishes setting up the session; the second one answers.
        if resp.status().is_redirection() {
            log::debug!(target: "EnedisClient.fetch", "redirected, asking again");
            resp = api.post(&session.http)?;
        }

        let status = resp.status().as_u16();
        let body = resp.text()?;
        decode_consumption(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct Etat {
    valeur: Option<String>,
    #[serde(rename = "erreurText")]
    erreur_text: Option<String>,
}

fn decode_consumption(status: u16, body: &str) -> Result<json::Value, LinkyError> {
    if status == 200 && body.contains(TERMS_OF_USE_MARKER) {
        return Err(LinkyError::Login(
            "You need to accept the latest Terms of Use. \
             Please manually log into the website, then come back."
                .to_string(),
        ));
    }

    let data: json::Value = json::from_str(body).map_err(|err| {
        LinkyError::Service(format!(
            "Unexpected answer from the Enedis portal (HTTP {}): {}",
            status, err
        ))
    })?;

    if let Ok(etat) = json::from_value::<Etat>(data["etat"].clone()) {
        if etat.valeur.as_deref() == Some("erreur") {
            if let Some(text) = etat.erreur_text {
                let msg = if text.is_empty() {
                    "The Enedis portal reported an error without details.".to_string()
                } else {
                    decode_html_entities(&text).into_owned()
                };
                return Err(LinkyError::Service(msg));
            }
        }
    }

    Ok(data)
}
