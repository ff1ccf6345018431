//! FreshBasket CLI - operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Preview the WhatsApp order message for a cart file
//! fb-cli order preview --cart cart.yaml --customer "Asha" --contact "+919800000000"
//!
//! # Reverse geocode a map position
//! fb-cli geocode --lat 12.9716 --lng 77.5946
//!
//! # Validate the storefront environment
//! fb-cli config check
//! ```
//!
//! # Commands
//!
//! - `order preview` - Render the order hand-off for a YAML cart
//! - `geocode` - Run one reverse geocode lookup
//! - `config check` - Load and validate storefront configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fb-cli")]
#[command(author, version, about = "FreshBasket CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Order hand-off tools
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Reverse geocode a map position
    Geocode {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Geocoder base URL (defaults to the public Nominatim service)
        #[arg(long)]
        base_url: Option<String>,

        /// User agent sent to the geocoder
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Configuration tools
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Render the order message and deep link for a cart file
    Preview {
        /// YAML file with a list of products and quantities
        #[arg(short, long)]
        cart: String,

        /// Customer name shown in the message
        #[arg(long)]
        customer: Option<String>,

        /// Customer phone or email shown in the message
        #[arg(long)]
        contact: Option<String>,

        /// Merchant WhatsApp number (defaults to `MERCHANT_WHATSAPP_NUMBER`)
        #[arg(short, long)]
        merchant: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load the storefront configuration and report problems
    Check,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Order { action } => match action {
            OrderAction::Preview {
                cart,
                customer,
                contact,
                merchant,
            } => {
                commands::order::preview(
                    &cart,
                    customer.as_deref(),
                    contact.as_deref(),
                    merchant.as_deref(),
                )
                .await?;
            }
        },
        Commands::Geocode {
            lat,
            lng,
            base_url,
            user_agent,
        } => {
            commands::geocode::lookup(lat, lng, base_url.as_deref(), user_agent.as_deref())
                .await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Check => commands::config::check()?,
        },
    }
    Ok(())
}
