use log::debug;
use reqwest::Url;
use serde_json::{Map, Value};

use super::validate;
use crate::error::{HarnessError, HarnessResult};

pub type JsonObject = Map<String, Value>;

/// Raw response as seen by the harness
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Request path, kept for error messages
    pub path: String,
    pub status: u16,

    /// Canonical reason phrase for `status`, not the phrase the server sent
    pub reason: String,
    pub body: String,
}

/// One logical browser session against the application.
///
/// Cookies set by a response are sent with every later request, so a login
/// performed through this session stays in effect until logout.
pub struct HttpSession {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpSession {
    pub fn new(base_url: &str) -> HarnessResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| HarnessError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, path: &str) -> HarnessResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| HarnessError::Config(format!("Invalid path '{}': {}", path, e)))
    }

    pub async fn get(&self, path: &str) -> HarnessResult<HttpResponse> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let res = self.client.get(url).send().await?;
        Self::read(path, res).await
    }

    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> HarnessResult<HttpResponse> {
        let url = self.url(path)?;
        debug!(
            "POST {} [{}]",
            url,
            form.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ")
        );
        let res = self.client.post(url).form(form).send().await?;
        Self::read(path, res).await
    }

    async fn read(path: &str, res: reqwest::Response) -> HarnessResult<HttpResponse> {
        let status = res.status();
        let body = res.text().await?;
        debug!("{} -> {} ({} bytes)", path, status, body.len());

        Ok(HttpResponse {
            path: path.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }

    /// GET an HTML page that must be served cleanly
    pub async fn get_page(&self, path: &str) -> HarnessResult<HttpResponse> {
        let res = self.get(path).await?;
        validate::validate_page(&res)?;
        Ok(res)
    }

    /// POST a form to an endpoint that answers with a JSON object
    pub async fn post_json(&self, path: &str, form: &[(&str, &str)]) -> HarnessResult<JsonObject> {
        let res = self.post(path, form).await?;
        validate::validate_json(&res)
    }
}
