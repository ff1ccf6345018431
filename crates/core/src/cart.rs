//! The in-memory shopping cart.
//!
//! The cart lives for one app session and is never persisted. It holds at
//! most one [`CartLineItem`] per [`ProductId`], keeps insertion order for
//! display, and never exposes a line with a quantity below one.
//!
//! All operations are total: commands on unknown ids are silent no-ops and
//! nothing here returns an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Opaque reference to a product image (remote URI or bundled asset handle).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap an image reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The raw reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A product as it arrives from the catalog, before validation.
///
/// Catalog records are loosely typed: names and prices may be missing and
/// prices may arrive as numbers or strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Amount(Decimal),
    Unusable(serde::de::IgnoredAny),
}

/// Accept a number, a numeric string, `null`, or garbage (mapped to `None`).
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<RawAmount>::deserialize(deserializer)? {
        Some(RawAmount::Amount(amount)) => Some(amount),
        Some(RawAmount::Unusable(_)) | None => None,
    })
}

/// A validated product ready to be put in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCandidate {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image: Option<ImageRef>,
}

impl CartCandidate {
    /// Create a candidate from already-validated parts.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, unit_price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            image: None,
        }
    }

    /// Attach an image reference.
    #[must_use]
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }
}

impl From<ProductRecord> for CartCandidate {
    /// Validate a raw catalog record once, at the boundary.
    ///
    /// Missing or negative prices become zero and a missing name becomes an
    /// empty label, so aggregation never sees an undefined amount.
    fn from(record: ProductRecord) -> Self {
        Self {
            id: ProductId::from(record.id),
            name: record.name.unwrap_or_default(),
            unit_price: Price::lenient(record.price),
            image: record.image.filter(|i| !i.is_empty()).map(ImageRef),
        }
    }
}

/// One product entry in the cart with its chosen quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image: Option<ImageRef>,
    quantity: u32,
}

impl CartLineItem {
    /// Create a line item.
    ///
    /// Returns `None` for a zero quantity; such lines never exist.
    #[must_use]
    pub fn new(candidate: CartCandidate, quantity: u32) -> Option<Self> {
        (quantity > 0).then(|| Self {
            id: candidate.id,
            name: candidate.name,
            unit_price: candidate.unit_price,
            image: candidate.image,
            quantity,
        })
    }

    /// Number of units, always at least one.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.line_total(self.quantity)
    }
}

/// The authoritative shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartStore {
    items: Vec<CartLineItem>,
    revision: u64,
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a product.
    ///
    /// Increments the existing line for `candidate.id`, or appends a new line
    /// with quantity one.
    pub fn add_item(&mut self, candidate: CartCandidate) {
        if let Some(line) = self.items.iter_mut().find(|l| l.id == candidate.id) {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            self.items.push(CartLineItem {
                id: candidate.id,
                name: candidate.name,
                unit_price: candidate.unit_price,
                image: candidate.image,
                quantity: 1,
            });
        }
        self.bump();
    }

    /// Change a line's quantity by `delta`.
    ///
    /// A resulting quantity of zero or less removes the line. Unknown ids are
    /// ignored.
    pub fn update_quantity(&mut self, id: &ProductId, delta: i64) {
        let Some(pos) = self.position(id) else {
            return;
        };
        let Some(line) = self.items.get_mut(pos) else {
            return;
        };

        let next = i64::from(line.quantity).saturating_add(delta);
        if next <= 0 {
            self.items.remove(pos);
        } else {
            line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        }
        self.bump();
    }

    /// Remove a line entirely. Unknown ids are ignored.
    pub fn remove_item(&mut self, id: &ProductId) {
        if let Some(pos) = self.position(id) {
            self.items.remove(pos);
            self.bump();
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.bump();
        }
    }

    /// Replace the whole cart.
    ///
    /// Lines sharing an id are merged into the first occurrence with their
    /// quantities summed, so the one-line-per-id rule survives bulk input.
    pub fn replace_all(&mut self, items: impl IntoIterator<Item = CartLineItem>) {
        let mut merged: Vec<CartLineItem> = Vec::new();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            if let Some(existing) = merged.iter_mut().find(|l| l.id == item.id) {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            } else {
                merged.push(item);
            }
        }
        self.items = merged;
        self.bump();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|l| &l.id == id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of `unit_price * quantity` over all lines; zero when empty.
    ///
    /// Saturates at [`Decimal::MAX`] instead of overflowing.
    #[must_use]
    pub fn total_cost(&self) -> Decimal {
        self.items
            .iter()
            .map(CartLineItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_item_count(&self) -> u64 {
        self.items.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Counter bumped by every mutation that changed the cart.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|l| &l.id == id)
    }

    const fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ginger() -> CartCandidate {
        CartCandidate::new("1", "Ginger", Price::from_rupees(25))
    }

    fn tomato() -> CartCandidate {
        CartCandidate::new("2", "Tomato", Price::from_rupees(40))
    }

    #[test]
    fn test_add_same_item_twice_merges() {
        let mut cart = CartStore::new();
        cart.add_item(ginger());
        cart.add_item(ginger());

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity(), 2);
        assert_eq!(cart.total_cost(), Decimal::from(50));
        assert_eq!(cart.total_item_count(), 2);
    }

    #[test]
    fn test_decrement_to_zero_removes() {
        let mut cart = CartStore::new();
        cart.add_item(ginger());
        cart.update_quantity(&ProductId::from("1"), -1);

        assert!(cart.is_empty());
        assert_eq!(cart.total_cost(), Decimal::ZERO);
    }

    #[test]
    fn test_large_negative_delta_removes() {
        let mut cart = CartStore::new();
        cart.add_item(ginger());
        cart.add_item(ginger());
        cart.update_quantity(&ProductId::from("1"), -10);
        assert!(cart.get(&ProductId::from("1")).is_none());
    }

    #[test]
    fn test_increment_keeps_order() {
        let mut cart = CartStore::new();
        cart.add_item(ginger());
        cart.add_item(tomato());
        cart.update_quantity(&ProductId::from("1"), 3);

        let ids: Vec<&str> = cart.items().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(cart.get(&ProductId::from("1")).unwrap().quantity(), 4);
        assert_eq!(cart.total_cost(), Decimal::from(4 * 25 + 40));
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut cart = CartStore::new();
        cart.add_item(ginger());
        let before = cart.clone();

        cart.update_quantity(&ProductId::from("missing"), 1);
        cart.remove_item(&ProductId::from("missing"));

        assert_eq!(cart, before);
        assert_eq!(cart.revision(), before.revision());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = CartStore::new();
        cart.add_item(ginger());
        cart.add_item(tomato());

        cart.remove_item(&ProductId::from("1"));
        assert_eq!(cart.len(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_item_count(), 0);
        assert_eq!(cart.total_cost(), Decimal::ZERO);
    }

    #[test]
    fn test_replace_all_merges_duplicates_and_drops_zero() {
        let mut cart = CartStore::new();
        cart.add_item(tomato());

        let a = CartLineItem::new(ginger(), 2).unwrap();
        let b = CartLineItem::new(ginger(), 3).unwrap();
        let c = CartLineItem::new(tomato(), 1).unwrap();
        cart.replace_all(vec![a, c, b]);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].id.as_str(), "1");
        assert_eq!(cart.items()[0].quantity(), 5);
        assert_eq!(cart.total_cost(), Decimal::from(5 * 25 + 40));

        cart.replace_all(Vec::new());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_zero_quantity_line_cannot_be_built() {
        assert!(CartLineItem::new(ginger(), 0).is_none());
    }

    #[test]
    fn test_record_with_missing_price_counts_as_zero() {
        let record: ProductRecord =
            serde_json::from_str(r#"{"id":"9","name":"Mystery"}"#).unwrap();
        let mut cart = CartStore::new();
        cart.add_item(record.into());
        cart.add_item(ginger());

        assert_eq!(cart.total_cost(), Decimal::from(25));
        assert_eq!(cart.total_item_count(), 2);
    }

    #[test]
    fn test_record_price_forms() {
        let parse = |json: &str| {
            CartCandidate::from(serde_json::from_str::<ProductRecord>(json).unwrap())
        };

        assert_eq!(
            parse(r#"{"id":"a","price":25}"#).unit_price,
            Price::from_rupees(25)
        );
        assert_eq!(
            parse(r#"{"id":"a","price":"12.5"}"#).unit_price.amount(),
            Decimal::new(125, 1)
        );
        assert_eq!(parse(r#"{"id":"a","price":null}"#).unit_price, Price::ZERO);
        assert_eq!(parse(r#"{"id":"a","price":"n/a"}"#).unit_price, Price::ZERO);
        assert_eq!(parse(r#"{"id":"a","price":-4}"#).unit_price, Price::ZERO);
    }

    #[test]
    fn test_huge_prices_saturate_instead_of_overflowing() {
        let record: ProductRecord =
            serde_json::from_str(r#"{"id":"x","name":"Gold","price":"79228162514264337593543950335"}"#)
                .unwrap();
        let mut cart = CartStore::new();
        cart.add_item(record.clone().into());
        cart.add_item(record.into());
        cart.add_item(ginger());

        assert_eq!(cart.total_cost(), Decimal::MAX);
        assert_eq!(cart.items()[0].line_total(), Decimal::MAX);
        assert_eq!(cart.total_item_count(), 3);

        cart.update_quantity(&ProductId::from("x"), -2);
        assert_eq!(cart.total_cost(), Decimal::from(25));
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let mut cart = CartStore::new();
        assert_eq!(cart.revision(), 0);
        cart.add_item(ginger());
        cart.clear();
        cart.clear();
        assert_eq!(cart.revision(), 2);
    }
}
