use hyper::body::Bytes;
use tracing::{debug, info};
use url::{Url, form_urlencoded};

use crate::{
    allow_list::AllowList,
    error::{ProxyError, ProxyResult},
    upstream::Upstream,
};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const URL_PARAM: &str = "url";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relayed {
    pub content_type: String,
    pub body: Bytes,
}

/// Fetches a caller-supplied URL on its behalf, provided the target's host
/// is covered by the allow-list.
pub struct ImageRelay<U> {
    allow_list: AllowList,
    upstream: U,
}

impl<U: Upstream> ImageRelay<U> {
    pub fn new(allow_list: AllowList, upstream: U) -> Self {
        Self {
            allow_list,
            upstream,
        }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Runs one relay request given the raw query string of the incoming
    /// request. Each check either passes or ends the request; nothing is
    /// retried.
    pub async fn handle(&self, query: Option<&str>) -> ProxyResult<Relayed> {
        let raw = target_param(query).ok_or(ProxyError::MissingUrl)?;
        let url = Url::parse(&raw).map_err(|e| ProxyError::InvalidUrl(Some(e)))?;

        check_target(&url, &self.allow_list)?;

        info!(%url, "relaying");
        let fetched = self.upstream.fetch(&url).await?;
        if !fetched.status.is_success() {
            return Err(ProxyError::Upstream(fetched.status));
        }

        debug!(%url, bytes = fetched.body.len(), "relayed");
        Ok(Relayed {
            content_type: fetched
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            body: fetched.body,
        })
    }
}

/// Scheme and host checks shared by the initial request and every redirect hop.
pub fn check_target(url: &Url, allow_list: &AllowList) -> ProxyResult<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProxyError::SchemeNotAllowed);
    }

    let host = url.host_str().ok_or(ProxyError::InvalidUrl(None))?;
    if !allow_list.allows(host) {
        return Err(ProxyError::DomainNotAllowed(host.to_string()));
    }

    Ok(())
}

fn target_param(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == URL_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
