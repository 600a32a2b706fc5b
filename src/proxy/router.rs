use std::{pin::Pin, sync::Arc};

use hyper::{
    Method, Request, Response, StatusCode, Uri,
    body::Incoming,
    header::{self, HeaderValue},
    service::Service,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    proxy::{ProxyBody, content_response, create_response, empty},
    relay::ImageRelay,
    upstream::Upstream,
};

pub const IMAGE_PROXY_PATH: &str = "/api/image-proxy";
pub const WHITELIST_PATH: &str = "/api/whitelist";

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Whitelist<'a> {
    allowed_domains: &'a [String],
}

pub struct Router<U> {
    relay: Arc<ImageRelay<U>>,
}

impl<U> Clone for Router<U> {
    fn clone(&self) -> Self {
        Self {
            relay: self.relay.clone(),
        }
    }
}

impl<U: Upstream> Router<U> {
    pub fn new(relay: Arc<ImageRelay<U>>) -> Self {
        Self { relay }
    }

    pub async fn route(&self, method: &Method, uri: &Uri) -> Response<ProxyBody> {
        let resp = match (uri.path(), method) {
            (IMAGE_PROXY_PATH, &Method::GET | &Method::HEAD) => self.image_proxy(uri).await,
            (IMAGE_PROXY_PATH, _) => method_not_allowed("GET, HEAD"),

            (WHITELIST_PATH, &Method::GET | &Method::HEAD) => self.whitelist(),
            (WHITELIST_PATH, _) => method_not_allowed("GET, HEAD"),

            ("/" | "/index.html", &Method::GET | &Method::HEAD) => {
                content_response("text/html; charset=utf-8", INDEX_HTML)
            }
            ("/" | "/index.html", _) => method_not_allowed("GET, HEAD"),

            _ => create_response("Not found", StatusCode::NOT_FOUND),
        };

        if *method == Method::HEAD {
            let (parts, _) = resp.into_parts();
            return Response::from_parts(parts, empty());
        }
        resp
    }

    async fn image_proxy(&self, uri: &Uri) -> Response<ProxyBody> {
        match self.relay.handle(uri.query()).await {
            Ok(relayed) => content_response(&relayed.content_type, relayed.body),
            Err(err) if err.is_internal() => {
                error!(error = ?err, "image relay failed");
                create_response(err.client_message(), err.status())
            }
            Err(err) => {
                warn!(status = err.status().as_u16(), %err, "image relay refused");
                create_response(err.client_message(), err.status())
            }
        }
    }

    fn whitelist(&self) -> Response<ProxyBody> {
        let body = Whitelist {
            allowed_domains: self.relay.allow_list().domains(),
        };

        match serde_json::to_vec(&body) {
            Ok(json) => content_response("application/json", json),
            Err(err) => {
                error!(error = ?err, "failed to encode whitelist");
                create_response(
                    crate::error::INTERNAL_ERROR_MESSAGE,
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
            }
        }
    }
}

fn method_not_allowed(allow: &'static str) -> Response<ProxyBody> {
    let mut resp = create_response("Method not allowed", StatusCode::METHOD_NOT_ALLOWED);
    resp.headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(allow));
    resp
}

impl<U: Upstream> Service<Request<Incoming>> for Router<U> {
    type Response = Response<ProxyBody>;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let this = self.clone();
        Box::pin(async move {
            let resp = this.route(req.method(), req.uri()).await;
            info!(
                method = %req.method(),
                path = req.uri().path(),
                status = resp.status().as_u16(),
                "request"
            );
            Ok::<_, hyper::Error>(resp)
        })
    }
}
