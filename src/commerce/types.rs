//! Commerce domain types and the Elastic Path wire format

use serde::Deserialize;

// ============================================================================
// Domain Types
// ============================================================================

/// A catalog product as the bot shows it
///
/// Prices are display strings formatted by the backend; they are never parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub display_price: String,
    pub weight_kg: f64,
    pub stock_level: u32,
    pub main_image_id: Option<String>,
}

/// One line of a cart, priced by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total: String,
}

impl Cart {
    /// The cart line holding the given product, if any
    pub fn line_for(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// How the backend answered a customer submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerOutcome {
    Created(Customer),
    /// 409: a customer with this email already exists
    Duplicate,
    /// 422: the backend rejected the name or email
    Invalid,
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    /// Unix timestamp (seconds) after which the token is rejected
    pub expires: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct FormattedAmount {
    pub formatted: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct WithTax {
    pub with_tax: FormattedAmount,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductRecord {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    weight: Option<Weight>,
    meta: ProductMeta,
    #[serde(default)]
    relationships: Option<ProductRelationships>,
}

#[derive(Debug, Deserialize)]
struct Weight {
    #[serde(default)]
    kg: f64,
}

#[derive(Debug, Deserialize)]
struct ProductMeta {
    display_price: WithTax,
    #[serde(default)]
    stock: Option<Stock>,
}

#[derive(Debug, Deserialize)]
struct Stock {
    #[serde(default)]
    level: u32,
}

#[derive(Debug, Deserialize)]
struct ProductRelationships {
    #[serde(default)]
    main_image: Option<Relationship>,
}

#[derive(Debug, Deserialize)]
struct Relationship {
    #[serde(default)]
    data: Option<RelationshipData>,
}

#[derive(Debug, Deserialize)]
struct RelationshipData {
    id: String,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Product {
            id: record.id,
            name: record.name,
            description: record.description,
            display_price: record.meta.display_price.with_tax.formatted,
            weight_kg: record.weight.map_or(0.0, |w| w.kg),
            stock_level: record.meta.stock.map_or(0, |s| s.level),
            main_image_id: record
                .relationships
                .and_then(|r| r.main_image)
                .and_then(|r| r.data)
                .map(|d| d.id),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CartItemsResponse {
    data: Vec<CartItemRecord>,
    meta: CartMeta,
}

#[derive(Debug, Deserialize)]
struct CartMeta {
    display_price: WithTax,
}

#[derive(Debug, Deserialize)]
struct CartItemRecord {
    id: String,
    #[serde(default)]
    product_id: String,
    name: String,
    #[serde(default)]
    description: String,
    quantity: u32,
    meta: CartItemMeta,
}

#[derive(Debug, Deserialize)]
struct CartItemMeta {
    display_price: CartItemDisplayPrice,
}

#[derive(Debug, Deserialize)]
struct CartItemDisplayPrice {
    with_tax: CartItemPrices,
}

#[derive(Debug, Deserialize)]
struct CartItemPrices {
    unit: FormattedAmount,
    value: FormattedAmount,
}

impl From<CartItemsResponse> for Cart {
    fn from(response: CartItemsResponse) -> Self {
        let items = response
            .data
            .into_iter()
            .map(|item| CartItem {
                id: item.id,
                product_id: item.product_id,
                name: item.name,
                description: item.description,
                quantity: item.quantity,
                unit_price: item.meta.display_price.with_tax.unit.formatted,
                line_total: item.meta.display_price.with_tax.value.formatted,
            })
            .collect();
        Cart {
            items,
            total: response.meta.display_price.with_tax.formatted,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct FileRecord {
    pub link: FileLink,
}

#[derive(Debug, Deserialize)]
pub(super) struct FileLink {
    pub href: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct CustomerRecord {
    id: String,
    #[serde(default)]
    name: String,
    email: String,
}

impl From<CustomerRecord> for Customer {
    fn from(record: CustomerRecord) -> Self {
        Customer {
            id: record.id,
            name: record.name,
            email: record.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_record_maps_nested_fields() {
        let record: ProductRecord = serde_json::from_value(json!({
            "id": "p-1",
            "type": "product",
            "name": "Atlantic salmon",
            "description": "Fresh",
            "weight": {"g": 500, "kg": 0.5, "lb": 1.1},
            "meta": {
                "display_price": {"with_tax": {"amount": 1000, "currency": "USD", "formatted": "$10.00"}},
                "stock": {"level": 7, "availability": "in-stock"}
            },
            "relationships": {"main_image": {"data": {"type": "main_image", "id": "file-9"}}}
        }))
        .unwrap();

        let product = Product::from(record);
        assert_eq!(product.display_price, "$10.00");
        assert_eq!(product.stock_level, 7);
        assert_eq!(product.main_image_id.as_deref(), Some("file-9"));
        assert!((product.weight_kg - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn product_without_image_or_stock_still_maps() {
        let record: ProductRecord = serde_json::from_value(json!({
            "id": "p-2",
            "name": "Gift card",
            "meta": {"display_price": {"with_tax": {"formatted": "$5.00"}}}
        }))
        .unwrap();

        let product = Product::from(record);
        assert_eq!(product.stock_level, 0);
        assert_eq!(product.main_image_id, None);
        assert_eq!(product.description, "");
    }

    #[test]
    fn empty_cart_keeps_backend_total() {
        let response: CartItemsResponse = serde_json::from_value(json!({
            "data": [],
            "meta": {"display_price": {"with_tax": {"amount": 0, "formatted": "$0.00"}}}
        }))
        .unwrap();

        let cart = Cart::from(response);
        assert!(cart.items.is_empty());
        assert_eq!(cart.total, "$0.00");
    }
}
