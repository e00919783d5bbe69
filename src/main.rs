use std::{fs::OpenOptions, sync::Arc};

use actix_web::{web, App, HttpServer};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{filter, fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::{auth::Authority, notify::{LogNotifier, Notifier, WebhookNotifier}};

mod config;
mod consts;
mod utils;
mod period;
mod error;

mod entity;
mod auth;
mod notify;

mod attendance;
mod leave;
mod payroll;
mod summary;

mod pages;

#[actix_web::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open("trace.log")
        .unwrap();

    let subscriber = Registry::default()
        .with(
            fmt::layer()
                .with_ansi(true)
                .with_line_number(true)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(log_file)
                .with_filter(filter::LevelFilter::from_level(Level::TRACE))
        );

    tracing::subscriber::set_global_default(subscriber).unwrap();

    let config::Config {
        host_address,
        database_opt,
        jwt_key,
        notify_webhook_url,
        notify_timeout,
        auto_migrate,
    } = config::load();

    let connection = Database::connect(database_opt).await.expect("Unable to connect to database");

    if auto_migrate {
        info!("Applying pending migrations");
        Migrator::up(&connection, None).await.expect("Unable to apply migrations");
    }

    let notifier: Arc<dyn Notifier> = match notify_webhook_url {
        Some(url) => {
            info!(%url, ?notify_timeout, "Delivering payslip notifications to webhook");
            Arc::new(WebhookNotifier::new(url, notify_timeout).expect("Unable to build webhook client"))
        },
        None => Arc::new(LogNotifier),
    };

    let database = web::Data::new(connection);
    let authority = web::Data::new(Authority::new(jwt_key.as_bytes()));
    let notifier = web::Data::from(notifier);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(database.clone())
            .app_data(authority.clone())
            .app_data(notifier.clone())
            .wrap(TracingLogger::default())
            .configure(pages::config)
    });

    server
        .bind(host_address).unwrap()
        .run().await.unwrap();
}
