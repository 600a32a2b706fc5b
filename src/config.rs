use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use crate::allow_list::{AllowList, DEFAULT_DOMAIN};

#[derive(Debug, Parser)]
#[command(
    name = "image-relay",
    version,
    about = "Allow-listed image proxy with a small preview page"
)]
pub struct Config {
    #[arg(short, long, env = "IMAGE_PROXY_PORT", default_value = "3000")]
    pub port: u16,

    #[arg(short, long, env = "IMAGE_PROXY_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Comma-separated domains images may be fetched from.
    #[arg(short, long, env = "IMAGE_WHITELIST")]
    pub whitelist: Option<String>,

    #[arg(long, env = "IMAGE_PROXY_TIMEOUT_SECS", default_value_t = 10)]
    pub upstream_timeout_secs: u64,

    #[arg(long, env = "IMAGE_PROXY_MAX_REDIRECTS", default_value_t = 10)]
    pub max_redirects: usize,
}

impl Config {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn allow_list(&self) -> AllowList {
        AllowList::parse(self.whitelist.as_deref())
    }
}

pub fn load() -> (Config, AllowList) {
    let config = Config::parse();
    let allow_list = config.allow_list();

    if allow_list.is_default() {
        warn!(
            domain = DEFAULT_DOMAIN,
            "IMAGE_WHITELIST not set, only the default domain is allowed"
        );
    } else if allow_list.domains().is_empty() {
        warn!("IMAGE_WHITELIST has no usable entries, every image request will be refused");
    }
    info!(domains = ?allow_list.domains(), "allow-list resolved");

    (config, allow_list)
}
