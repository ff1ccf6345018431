//! Order hand-off to the merchant over WhatsApp.
//!
//! Checkout does not take payment. It formats the cart as a plain-text order
//! request and builds a `whatsapp://` deep link the device hands to the OS.
//! The cart is emptied only once the hand-off has been acknowledged
//! ([`complete`]).

use freshbasket_core::{CartLineItem, CartStore, Identity, format_rupees};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Name shown when the signed-in identity has no display name.
const GUEST_NAME: &str = "Guest";

/// Contact shown when the identity has neither phone nor email.
const NO_CONTACT: &str = "N/A";

/// Reasons an order cannot be handed off.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Please login to place an order")]
    LoginRequired,
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("invalid deep link: {0}")]
    InvalidLink(#[from] url::ParseError),
}

/// A prepared order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderHandoff {
    /// Message text as sent to the merchant.
    pub message: String,
    /// Deep link that opens WhatsApp with the message filled in.
    pub link: Url,
    /// Cart total at preparation time.
    pub total: Decimal,
    /// Number of units in the cart.
    pub item_count: u64,
}

/// Format the order request message.
///
/// Item lines show the plain line total (`₹1200`); only the grand total is
/// grouped in thousands (`₹1,250`).
///
/// ```
/// use freshbasket_core::{CartCandidate, CartLineItem, Price};
/// use freshbasket_storefront::services::checkout::order_message;
///
/// let line = CartLineItem::new(CartCandidate::new("1", "Ginger", Price::from_rupees(25)), 2)
///     .unwrap();
/// let message = order_message(Some("Asha"), None, &[line], 50.into());
/// assert!(message.contains("1. Ginger x 2 - ₹50"));
/// assert!(message.contains("*Contact:* N/A"));
/// ```
#[must_use]
pub fn order_message(
    customer: Option<&str>,
    contact: Option<&str>,
    items: &[CartLineItem],
    total: Decimal,
) -> String {
    let customer = customer.filter(|c| !c.is_empty()).unwrap_or(GUEST_NAME);
    let contact = contact.filter(|c| !c.is_empty()).unwrap_or(NO_CONTACT);

    let lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "{}. {} x {} - ₹{}",
                i + 1,
                item.name,
                item.quantity(),
                item.line_total().normalize()
            )
        })
        .collect();

    format!(
        "*New Order Request* 🛒\n\n\
         *Customer:* {customer}\n\
         *Contact:* {contact}\n\n\
         *Items:*\n{}\n\n\
         *Total Amount: {}*\n\n\
         Please confirm this order and share payment details.",
        lines.join("\n"),
        format_rupees(total)
    )
}

/// Build the `whatsapp://send` deep link for `message`.
///
/// # Errors
///
/// Returns `CheckoutError::InvalidLink` if the result does not parse as a URL.
pub fn whatsapp_link(merchant: &str, message: &str) -> Result<Url, CheckoutError> {
    let raw = format!(
        "whatsapp://send?phone={}&text={}",
        urlencoding::encode(merchant),
        urlencoding::encode(message)
    );
    Ok(Url::parse(&raw)?)
}

/// Prepare the hand-off for the current cart.
///
/// # Errors
///
/// Returns `CheckoutError::LoginRequired` without an identity and
/// `CheckoutError::EmptyCart` when the cart total is zero.
pub fn prepare(
    identity: Option<&Identity>,
    cart: &CartStore,
    merchant: &str,
) -> Result<OrderHandoff, CheckoutError> {
    let identity = identity.ok_or(CheckoutError::LoginRequired)?;
    let total = cart.total_cost();
    if total.is_zero() {
        return Err(CheckoutError::EmptyCart);
    }

    let message = order_message(
        identity.display_name.as_deref(),
        identity.contact(),
        cart.items(),
        total,
    );
    let link = whatsapp_link(merchant, &message)?;

    Ok(OrderHandoff {
        message,
        link,
        total,
        item_count: cart.total_item_count(),
    })
}

/// Empty the cart after the OS acknowledged the hand-off.
pub fn complete(cart: &mut CartStore) {
    cart.replace_all(Vec::new());
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use freshbasket_core::{CartCandidate, Email, Price};

    use super::*;

    const MERCHANT: &str = "919876543210";

    fn cart() -> CartStore {
        let mut cart = CartStore::new();
        cart.add_item(CartCandidate::new("1", "Ginger", Price::from_rupees(25)));
        cart.add_item(CartCandidate::new("1", "Ginger", Price::from_rupees(25)));
        cart.add_item(CartCandidate::new("2", "Basmati Rice 5kg", Price::from_rupees(1200)));
        cart
    }

    fn ravi() -> Identity {
        Identity {
            display_name: Some("Ravi".into()),
            phone: Some("+919800000000".into()),
            ..Identity::new("u-ravi")
        }
    }

    #[test]
    fn test_message_format() {
        let handoff = prepare(Some(&ravi()), &cart(), MERCHANT).unwrap();

        let expected = "*New Order Request* 🛒\n\n\
                        *Customer:* Ravi\n\
                        *Contact:* +919800000000\n\n\
                        *Items:*\n\
                        1. Ginger x 2 - ₹50\n\
                        2. Basmati Rice 5kg x 1 - ₹1200\n\n\
                        *Total Amount: ₹1,250*\n\n\
                        Please confirm this order and share payment details.";
        assert_eq!(handoff.message, expected);
        assert_eq!(handoff.total, Decimal::from(1250));
        assert_eq!(handoff.item_count, 3);
    }

    #[test]
    fn test_fractional_line_totals_print_plainly() {
        let mut cart = CartStore::new();
        cart.add_item(CartCandidate::new(
            "3",
            "Coriander",
            Price::new(Decimal::new(1250, 2)).unwrap(),
        ));
        let handoff = prepare(Some(&ravi()), &cart, MERCHANT).unwrap();
        assert!(handoff.message.contains("1. Coriander x 1 - ₹12.5\n"));
        assert!(handoff.message.contains("*Total Amount: ₹12.50*"));
    }

    #[test]
    fn test_guest_and_email_fallbacks() {
        let identity = Identity {
            email: Email::parse_optional("meena@example.in"),
            ..Identity::new("u-meena")
        };
        let handoff = prepare(Some(&identity), &cart(), MERCHANT).unwrap();
        assert!(handoff.message.contains("*Customer:* Guest\n"));
        assert!(handoff.message.contains("*Contact:* meena@example.in\n"));
    }

    #[test]
    fn test_link_round_trips_message() {
        let handoff = prepare(Some(&ravi()), &cart(), MERCHANT).unwrap();
        assert_eq!(handoff.link.scheme(), "whatsapp");

        let pairs: Vec<(String, String)> = handoff
            .link
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0], ("phone".to_string(), MERCHANT.to_string()));
        assert_eq!(pairs[1].1, handoff.message);
    }

    #[test]
    fn test_requires_login() {
        assert!(matches!(
            prepare(None, &cart(), MERCHANT),
            Err(CheckoutError::LoginRequired)
        ));
    }

    #[test]
    fn test_rejects_empty_and_zero_total_carts() {
        assert!(matches!(
            prepare(Some(&ravi()), &CartStore::new(), MERCHANT),
            Err(CheckoutError::EmptyCart)
        ));

        let mut free = CartStore::new();
        free.add_item(CartCandidate::new("9", "Sample", Price::ZERO));
        assert!(matches!(
            prepare(Some(&ravi()), &free, MERCHANT),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_complete_empties_cart() {
        let mut cart = cart();
        complete(&mut cart);
        assert!(cart.is_empty());
        assert_eq!(cart.total_cost(), Decimal::ZERO);
    }
}
