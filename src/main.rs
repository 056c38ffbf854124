use std::{sync::Arc, time::Duration};

use crate::{
    access::AccessPolicy,
    booking_service::BookingService,
    clock::SystemClock,
    configuration::Configuration,
    configuration_handler::ConfigurationHandler,
    database_interface::DatabaseInterface,
    http::{create_app, AppState},
    local_bookings::LocalBookings,
};
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod access;
mod availability;
mod backend;
mod booking_service;
mod clock;
mod configuration;
mod configuration_handler;
mod database_interface;
mod error;
mod http;
mod identity;
mod local_bookings;
mod schema;
mod slot_grid;
#[cfg(test)]
mod testutils;
mod types;
mod week;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let configuration = ConfigurationHandler::parse_arguments();

    let grid = match configuration.slot_grid() {
        Ok(grid) => Arc::new(grid),
        Err(err) => {
            error!(%err, "Invalid slot configuration");
            std::process::exit(1);
        }
    };
    let access_policy = AccessPolicy::new(configuration.admin_emails());
    if configuration.admin_emails().is_empty() {
        warn!("No admin emails configured. Bookings can't be removed.");
    }

    let address = format!("0.0.0.0:{}", configuration.port());
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, "Failed to bind {address}");
            std::process::exit(1);
        }
    };
    info!(title = %configuration.website_title(), "Accessible at {address}");

    let app = if let Some(database_url) = configuration.database_url() {
        let backend = loop {
            match DatabaseInterface::new(&database_url, grid.clone()) {
                Ok(backend) => {
                    info!("Successfully connected to database");
                    break backend;
                }
                Err(err) => {
                    error!(?err, "Failed to establish database connection: {database_url}. Retry in 1 sec. You may want to restart it with database disabled (impersistent bookings).");
                    sleep(Duration::from_secs(1)).await;
                }
            }
        };
        create_app(AppState {
            booking_service: BookingService::new(backend, grid, access_policy, Arc::new(SystemClock)),
            website_title: configuration.website_title(),
        })
    } else {
        create_app(AppState {
            booking_service: BookingService::new(
                LocalBookings::default(),
                grid,
                access_policy,
                Arc::new(SystemClock),
            ),
            website_title: configuration.website_title(),
        })
    };

    if let Err(err) = axum::serve(listener, app).await {
        error!(%err, "Server stopped");
    }
}
