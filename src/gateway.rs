use std::future::Future;
use std::time::Duration;

use crate::comic::{Comic, ComicId};
use crate::error::ComicError;

pub const DEFAULT_URL_TEMPLATE: &str = "https://xkcd.now.sh/?comic={comic}";
const USER_AGENT: &str = concat!("rxkcd/", env!("CARGO_PKG_VERSION"));

/// Something that can turn a `ComicId` into a `Comic`.
pub trait ComicGateway: Send + Sync + 'static {
    fn fetch(&self, id: ComicId) -> impl Future<Output = Result<Comic, ComicError>> + Send;
}

/// Fetches comics over HTTP from a templated URL, `{comic}` being replaced by
/// `latest` or the strip number.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    url_template: String,
}

impl HttpGateway {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, url_template: url_template.into() }
    }

    pub fn url_for(&self, id: ComicId) -> String {
        self.url_template.replace("{comic}", &id.to_string())
    }
}

impl ComicGateway for HttpGateway {
    async fn fetch(&self, id: ComicId) -> Result<Comic, ComicError> {
        let url = self.url_for(id);
        tracing::debug!(%id, %url, "fetching comic");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ComicError::Transport(format!("{url} answered with status {status}")));
        }

        let comic: Comic = resp
            .json()
            .await
            .map_err(|e| ComicError::MalformedResponse(e.to_string()))?;

        if let ComicId::Number(n) = id {
            if comic.identifier != n {
                return Err(ComicError::MalformedResponse(format!(
                    "asked for comic {n}, got {}",
                    comic.identifier
                )));
            }
        }

        Ok(comic)
    }
}
