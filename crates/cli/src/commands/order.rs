//! Preview the WhatsApp order hand-off for a cart file.
//!
//! The cart file is a YAML list of catalog records with a quantity:
//!
//! ```yaml
//! - id: "1"
//!   name: Ginger
//!   price: 25
//!   quantity: 2
//! - id: "2"
//!   name: Basmati Rice 5kg
//!   price: "1200"
//! ```

use std::path::Path;

use freshbasket_core::{CartCandidate, CartLineItem, CartStore, ProductRecord, format_rupees};
use freshbasket_storefront::services::checkout::{order_message, whatsapp_link};
use serde::Deserialize;
use tracing::{info, warn};

/// One line of a cart file.
#[derive(Debug, Deserialize)]
struct CartFileLine {
    #[serde(flatten)]
    product: ProductRecord,
    #[serde(default = "one")]
    quantity: u32,
}

const fn one() -> u32 {
    1
}

/// Build a cart from YAML cart-file contents.
fn parse_cart(content: &str) -> Result<CartStore, serde_yaml::Error> {
    let lines: Vec<CartFileLine> = serde_yaml::from_str(content)?;

    let mut cart = CartStore::new();
    cart.replace_all(lines.into_iter().filter_map(|line| {
        if line.quantity == 0 {
            warn!(product_id = %line.product.id, "Skipping line with zero quantity");
        }
        CartLineItem::new(CartCandidate::from(line.product), line.quantity)
    }));
    Ok(cart)
}

/// Render the order message and deep link for a cart file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, no merchant number
/// is available, or the cart total is zero.
pub async fn preview(
    file_path: &str,
    customer: Option<&str>,
    contact: Option<&str>,
    merchant: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let merchant = match merchant {
        Some(number) => number.to_string(),
        None => std::env::var("MERCHANT_WHATSAPP_NUMBER")
            .map_err(|_| "MERCHANT_WHATSAPP_NUMBER not set and --merchant not given")?,
    };

    // Verify file exists
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading cart from file");
    let content = tokio::fs::read_to_string(path).await?;
    let cart = parse_cart(&content)?;

    let total = cart.total_cost();
    if total.is_zero() {
        return Err("Cart total is zero, nothing to order".into());
    }
    info!(
        lines = cart.len(),
        items = cart.total_item_count(),
        total = %format_rupees(total),
        "Parsed cart"
    );

    let message = order_message(customer, contact, cart.items(), total);
    let link = whatsapp_link(merchant.trim_start_matches('+'), &message)?;

    info!("Order message:\n{message}");
    info!(link = %link, "Deep link");
    Ok(())
}
