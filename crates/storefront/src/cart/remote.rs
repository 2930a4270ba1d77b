//! Cart kept as `cart_item` records in the record API.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use shopflow_core::{CartCandidate, CartLineItem, LineItemId, Price, ProductId, VariantSelection};
use tracing::instrument;

use super::{CartBackend, CartError};
use crate::records::{QueryParams, Record, RecordApi, RecordApiError, RecordId};

const CART_TABLE: &str = "cart_item";
const CART_FIELDS: &[&str] = &["Name", "quantity", "price", "image", "product_id", "size", "color"];

/// Cart backend over the record API. Line IDs are record IDs.
#[derive(Clone)]
pub struct RemoteCart {
    records: Arc<dyn RecordApi>,
}

impl RemoteCart {
    /// Create a backend over a record API.
    #[must_use]
    pub fn new(records: Arc<dyn RecordApi>) -> Self {
        Self { records }
    }
}

fn candidate_fields(candidate: &CartCandidate) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("Name".to_owned(), json!(candidate.name));
    fields.insert("quantity".to_owned(), json!(candidate.quantity));
    fields.insert("price".to_owned(), json!(candidate.price.amount()));
    fields.insert("image".to_owned(), json!(candidate.image));
    fields.insert("product_id".to_owned(), json!(candidate.product_id));
    fields.insert("size".to_owned(), json!(candidate.variant.size));
    fields.insert("color".to_owned(), json!(candidate.variant.color));
    fields
}

fn line_from_record(record: &Record) -> Result<CartLineItem, RecordApiError> {
    let invalid = |what: &str| RecordApiError::invalid(CART_TABLE, format!("record {}: {what}", record.id));

    let product_id = record
        .integer("product_id")
        .and_then(|id| i32::try_from(id).ok())
        .ok_or_else(|| invalid("missing product_id"))?;
    let quantity = record
        .integer("quantity")
        .and_then(|q| u32::try_from(q).ok())
        .filter(|q| *q > 0)
        .ok_or_else(|| invalid("quantity must be a positive integer"))?;
    let price = record
        .decimal("price")
        .and_then(|p| Price::try_new(p).ok())
        .ok_or_else(|| invalid("missing or negative price"))?;
    let non_blank = |name: &str| record.string(name).filter(|s| !s.trim().is_empty());

    Ok(CartLineItem {
        id: LineItemId::new(record.id.get()),
        product_id: ProductId::new(product_id),
        variant: VariantSelection {
            size: non_blank("size"),
            color: non_blank("color"),
        },
        price,
        name: record.string("Name").unwrap_or_default(),
        image: record.string("image").unwrap_or_default(),
        quantity,
    })
}

#[async_trait]
impl CartBackend for RemoteCart {
    #[instrument(skip(self))]
    async fn load(&self) -> Result<Vec<CartLineItem>, CartError> {
        let mut records = self
            .records
            .query(CART_TABLE, &QueryParams::select(CART_FIELDS))
            .await?;
        records.sort_by_key(|r| r.id);

        Ok(records
            .iter()
            .map(line_from_record)
            .collect::<Result<_, _>>()?)
    }

    #[instrument(skip_all, fields(product_id = %candidate.product_id))]
    async fn insert(
        &self,
        mut cart: Vec<CartLineItem>,
        candidate: CartCandidate,
    ) -> Result<Vec<CartLineItem>, CartError> {
        let record = self
            .records
            .create(CART_TABLE, candidate_fields(&candidate))
            .await?;
        cart.push(CartLineItem::from_candidate(
            LineItemId::new(record.id.get()),
            candidate,
        ));
        Ok(cart)
    }

    #[instrument(skip(self, cart))]
    async fn set_quantity(
        &self,
        mut cart: Vec<CartLineItem>,
        id: LineItemId,
        quantity: u32,
    ) -> Result<Vec<CartLineItem>, CartError> {
        let mut fields = Map::new();
        fields.insert("quantity".to_owned(), json!(quantity));
        self.records
            .update(CART_TABLE, RecordId::new(id.get()), fields)
            .await?;

        if let Some(item) = cart.iter_mut().find(|item| item.id == id) {
            item.quantity = quantity;
        }
        Ok(cart)
    }

    #[instrument(skip(self, cart))]
    async fn remove(
        &self,
        mut cart: Vec<CartLineItem>,
        id: LineItemId,
    ) -> Result<Vec<CartLineItem>, CartError> {
        self.records
            .delete(CART_TABLE, RecordId::new(id.get()))
            .await?;
        cart.retain(|item| item.id != id);
        Ok(cart)
    }

    /// Deletes the line records one at a time. A failed delete stops the
    /// loop and returns the error, but lines deleted before it stay deleted;
    /// reload the cart after an error instead of assuming it is unchanged.
    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), CartError> {
        let records = self
            .records
            .query(CART_TABLE, &QueryParams::select(&[]))
            .await?;
        for record in records {
            self.records.delete(CART_TABLE, record.id).await?;
        }
        Ok(())
    }
}
