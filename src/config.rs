use std::{env, net::{SocketAddr, ToSocketAddrs as _}, time::Duration};

use sea_orm::ConnectOptions;
use tracing::{info, warn};

use crate::consts::DEFAULT_NOTIFY_TIMEOUT_MS;

pub struct Config {
    pub host_address: SocketAddr,

    pub database_opt: ConnectOptions,

    pub jwt_key: String,

    /// Payslip events are only logged when unset
    pub notify_webhook_url: Option<String>,

    pub notify_timeout: Duration,

    pub auto_migrate: bool,
}

pub fn load() -> Config {
    Config {
        host_address: load_host_address(),
        database_opt: load_database_opt(),
        jwt_key: load_jwt_key(),
        notify_webhook_url: load_notify_webhook_url(),
        notify_timeout: load_notify_timeout(),
        auto_migrate: load_auto_migrate(),
    }
}

fn load_host_address() -> SocketAddr {
    info!("Loading environment `HOST_ADDRESS`");

    let var = env::var("HOST_ADDRESS").unwrap_or_else(|_| "127.0.0.1:0".to_string());

    var.to_socket_addrs()
        .expect("`HOST_ADDRESS` is not in a valid format").nth(0)
        .expect("unable to resolve host from `HOST_ADDRESS`")
}

fn load_database_opt() -> ConnectOptions {
    info!("Loading environment `DATABASE_URL`");

    let var = env::var("DATABASE_URL").expect("Environment `DATABASE_URL` is required to be set");

    ConnectOptions::new(var)
}

fn load_jwt_key() -> String {
    info!("Loading environment `JWT_SECRET`");

    env::var("JWT_SECRET").expect("Environment `JWT_SECRET` is required to be set")
}

fn load_notify_webhook_url() -> Option<String> {
    info!("Loading environment `NOTIFY_WEBHOOK_URL`");

    env::var("NOTIFY_WEBHOOK_URL").ok()
        .filter(|url| !url.trim().is_empty())
}

fn load_notify_timeout() -> Duration {
    info!("Loading environment `NOTIFY_TIMEOUT_MS`");

    parse_timeout_ms(env::var("NOTIFY_TIMEOUT_MS").ok().as_deref())
}

fn parse_timeout_ms(var: Option<&str>) -> Duration {
    let millis = match var.map(str::trim).map(str::parse::<u64>) {
        Some(Ok(millis)) if millis > 0 => millis,
        Some(_) => {
            warn!("`NOTIFY_TIMEOUT_MS` is not a positive number, using {DEFAULT_NOTIFY_TIMEOUT_MS}");
            DEFAULT_NOTIFY_TIMEOUT_MS
        },
        None => DEFAULT_NOTIFY_TIMEOUT_MS,
    };

    Duration::from_millis(millis)
}

fn load_auto_migrate() -> bool {
    info!("Loading environment `AUTO_MIGRATE`");

    parse_flag(env::var("AUTO_MIGRATE").ok().as_deref())
}

fn parse_flag(var: Option<&str>) -> bool {
    matches!(var.map(str::trim), Some("1" | "true" | "TRUE" | "yes"))
}
