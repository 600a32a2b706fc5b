mod router;

pub use router::Router;

use http_body_util::{BodyExt, Empty, Full, combinators::BoxBody};
use hyper::{
    Response, StatusCode,
    body::Bytes,
    header::{self, HeaderValue},
};
use hyper_util::rt::TokioIo;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{debug, error, info, warn};

use crate::upstream::Upstream;

type ServerBuilder = hyper::server::conn::http1::Builder;

pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

pub async fn start_proxy<U: Upstream>(
    router: Router<U>,
    mut kill_signal: broadcast::Receiver<()>,
    listen_addr: &str,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    info!(addr = %listener.local_addr()?, "image relay listening");

    loop {
        tokio::select! {
            _ = kill_signal.recv() => {
                info!("shutdown requested, closing listener");
                return Ok(());
            }
            res = listener.accept() => {
                match res {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        let io = TokioIo::new(stream);
                        let service = router.clone();

                        tokio::task::spawn(async move {
                            if let Err(err) = ServerBuilder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                warn!(%peer, error = ?err, "failed to serve connection");
                            }
                        });
                    }

                    Err(err) => {
                        error!(error = ?err, "failed to accept connection");
                    }
                }
            }
        }
    }
}

fn create_response(msg: impl Into<String>, status_code: StatusCode) -> Response<ProxyBody> {
    let mut resp = Response::new(full(msg.into()));
    *resp.status_mut() = status_code;
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    resp
}

fn content_response(
    content_type: &str,
    body: impl Into<Bytes>,
) -> Response<ProxyBody> {
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(crate::relay::DEFAULT_CONTENT_TYPE));

    let mut resp = Response::new(full(body));
    resp.headers_mut().insert(header::CONTENT_TYPE, content_type);
    resp
}

fn full<T: Into<Bytes>>(chunk: T) -> ProxyBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn empty() -> ProxyBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}
