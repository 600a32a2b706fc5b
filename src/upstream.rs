use std::time::Duration;

use async_trait::async_trait;
use hyper::{StatusCode, body::Bytes, header::CONTENT_TYPE};
use reqwest::redirect;
use tracing::{debug, warn};
use url::Url;

use crate::{
    allow_list::AllowList,
    error::{ProxyError, ProxyResult},
    relay::check_target,
};

/// What came back from the upstream server. The body is only read for
/// successful responses.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[async_trait]
pub trait Upstream: Send + Sync + 'static {
    async fn fetch(&self, url: &Url) -> ProxyResult<Fetched>;
}

#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpUpstream {
    pub fn new(
        allow_list: AllowList,
        timeout: Duration,
        max_redirects: usize,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(redirect_policy(allow_list, max_redirects))
            .build()?;

        Ok(Self { client, timeout })
    }

    fn classify(&self, err: reqwest::Error) -> ProxyError {
        if err.is_timeout() {
            ProxyError::Timeout(self.timeout)
        } else {
            ProxyError::Fetch(err)
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, url: &Url) -> ProxyResult<Fetched> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .filter(|val| !val.is_empty())
            .map(str::to_string);

        debug!(%url, status = status.as_u16(), ?content_type, "upstream answered");

        if !status.is_success() {
            return Ok(Fetched {
                status,
                content_type,
                body: Bytes::new(),
            });
        }

        let body = resp.bytes().await.map_err(|e| self.classify(e))?;

        Ok(Fetched {
            status,
            content_type,
            body,
        })
    }
}

/// Follows redirects only while every hop stays inside the allow-list.
/// A hop that leaves it stops the chain and the 3xx itself is returned.
fn redirect_policy(allow_list: AllowList, max_redirects: usize) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            return attempt.error("too many redirects");
        }

        match check_target(attempt.url(), &allow_list) {
            Ok(()) => attempt.follow(),
            Err(err) => {
                warn!(target_url = %attempt.url(), %err, "refusing redirect");
                attempt.stop()
            }
        }
    })
}
