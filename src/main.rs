//! # AMS Client
//!
//! Headless driver for the airline client core. It restores the persisted
//! session, logs in when credentials are configured, and optionally runs a
//! flight search, printing toasts as they appear and expire.
//!
//! ## Environment Setup
//! Copy `.env.example` to `.env` and configure:
//! ```bash
//! AMS_API_BASE_URL=http://ams-java.duckdns.org/api/v1
//! AMS_USERNAME=...
//! AMS_PASSWORD=...
//! AMS_ROLE=customer
//! ```
//!
//! ## Running
//! ```bash
//! cargo run -- JFK LAX 2024-05-01
//! ```

use std::collections::HashSet;
use std::time::Duration;

use ams_client::{AmsClient, CONFIG, Role, Toast, ToastId};
use once_cell::sync::Lazy;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false) // Don't show module targets for cleaner output
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting AMS client...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = Lazy::force(&CONFIG);
    tracing::info!("🌐 Backend: {}", config.api_base_url);

    let client = AmsClient::from_config(config);
    let printer = tokio::spawn(print_toasts(client.toasts().subscribe()));

    client.session().initialize();

    if let Some(login) = &config.login {
        match client.session().login(&login.username, &login.password, login.role).await {
            Ok(session) => {
                client.toasts().success(format!("Welcome, {}!", session.display_name()));
            }
            Err(e) => {
                tracing::error!("Login failed: {}", e);
                client.toasts().error("Invalid credentials. Please try again.");
            }
        }
    }

    if let Some(session) = client.session().current() {
        println!("Signed in as {} <{}> ({})", session.display_name(), session.email(), session.role());
        if session.role() == Role::Customer {
            let (profile, trips) = futures::join!(client.api().customer_profile(), client.api().customer_trips());
            match profile {
                Ok(customer) => println!("Profile: {} {} {}", customer.first_name, customer.last_name, customer.phone),
                Err(e) => tracing::warn!("Could not load profile: {}", e),
            }
            match trips {
                Ok(trips) => println!("{} trip(s) booked", trips.len()),
                Err(_) => {
                    client.toasts().error("Failed to load trips");
                }
            }
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [from, to, date] = args.as_slice() {
        search_flights(&client, from, to, date).await;
    } else if !args.is_empty() {
        client.toasts().warning("Please fill in all required fields");
    }

    // Let every toast run its course before exiting.
    let deadline = tokio::time::Instant::now() + client.toasts().default_ttl() + Duration::from_secs(1);
    while !client.toasts().is_empty() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    printer.abort();

    Ok(())
}

async fn search_flights(client: &AmsClient, from: &str, to: &str, date: &str) {
    match client.api().search_flights(from, to, date).await {
        Ok(flights) if flights.is_empty() => {
            client.toasts().info("No flights found for your search criteria");
        }
        Ok(flights) => {
            for flight in &flights {
                println!(
                    "{:<8} {} → {}  {} - {}  {} seats  {}",
                    flight.flight_number,
                    flight.departure,
                    flight.arrival,
                    flight.departure_time,
                    flight.arrival_time,
                    flight.available_seats,
                    flight.status
                );
            }
            client.toasts().success(format!("Found {} flight(s)", flights.len()));
        }
        Err(e) => {
            tracing::error!("Flight search failed: {}", e);
            client.toasts().error("Failed to search flights");
        }
    }
}

/// Print toasts as they enter and leave the queue
async fn print_toasts(mut updates: tokio::sync::watch::Receiver<Vec<Toast>>) {
    let mut shown: HashSet<ToastId> = HashSet::new();
    while updates.changed().await.is_ok() {
        let toasts = updates.borrow_and_update().clone();
        let live: HashSet<ToastId> = toasts.iter().map(Toast::id).collect();
        for toast in toasts.iter().filter(|t| !shown.contains(&t.id())) {
            println!("[{}] {}", toast.severity(), toast.message());
        }
        shown = live;
    }
}
