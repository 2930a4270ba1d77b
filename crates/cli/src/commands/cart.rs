//! Cart commands.
//!
//! Quantity changes go through [`OptimisticCart`], so a failed write reports
//! the cart as it was before the change.

use std::sync::Arc;

use shopflow_core::{
    CartCandidate, CartLineItem, LineItemId, ProductId, VariantSelection, cart_item_count,
    cart_total, format_money,
};
use shopflow_storefront::cart::OptimisticCart;
use shopflow_storefront::state::AppState;
use tracing::{info, warn};

fn describe(item: &CartLineItem) -> String {
    let variant: Vec<&str> = [item.variant.size.as_deref(), item.variant.color.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    let variant = if variant.is_empty() {
        String::new()
    } else {
        format!(" ({})", variant.join(" / "))
    };
    format!(
        "{}  {} x {}{variant}  {}",
        item.id,
        item.quantity,
        item.name,
        format_money(item.line_total()),
    )
}

fn report(items: &[CartLineItem]) {
    if items.is_empty() {
        info!("Cart is empty");
        return;
    }
    for item in items {
        info!("{}", describe(item));
    }
    info!(
        "{} item(s), total {}",
        cart_item_count(items),
        format_money(cart_total(items))
    );
}

/// Show the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be read.
pub async fn show(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    report(&state.cart().get_cart().await?);
    Ok(())
}

/// Add a catalog product to the cart.
///
/// # Errors
///
/// Returns an error if the product does not exist or the cart cannot be written.
pub async fn add(
    state: &AppState,
    product_id: i32,
    quantity: u32,
    size: Option<&str>,
    color: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let product = state.catalog().get_by_id(ProductId::new(product_id)).await?;
    let variant = if size.is_none() && color.is_none() {
        product.default_selection()
    } else {
        VariantSelection::new(size, color)
    };
    if product.variant_stock(&variant) == 0 {
        warn!(product = %product.name, "Selected variant is out of stock");
    }

    let candidate = CartCandidate::from_product(&product, variant, quantity);
    report(&state.cart().add_to_cart(candidate).await?);
    Ok(())
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the cart cannot be read or written.
pub async fn update(
    state: &AppState,
    line_id: i64,
    quantity: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cart = OptimisticCart::load(Arc::clone(state.cart())).await?;
    let outcome = cart
        .set_quantity(LineItemId::new(line_id), quantity)
        .await
        .map(<[CartLineItem]>::to_vec);
    match outcome {
        Ok(items) => {
            report(&items);
            Ok(())
        }
        Err(e) => {
            warn!("Update failed, cart unchanged");
            report(cart.items());
            Err(e.into())
        }
    }
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the cart cannot be read or written.
pub async fn remove(state: &AppState, line_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    report(&state.cart().remove_from_cart(LineItemId::new(line_id)).await?);
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be cleared.
pub async fn clear(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    state.cart().clear_cart().await?;
    info!("Cart cleared");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopflow_core::Price;

    use super::*;

    #[test]
    fn test_describe_line() {
        let item = CartLineItem {
            id: LineItemId::new(1_700_000_000_000),
            product_id: ProductId::new(4),
            variant: VariantSelection::new(Some("M"), Some("White")),
            price: Price::from_cents(1_000),
            name: "Classic Cotton Shirt".to_string(),
            image: String::new(),
            quantity: 3,
        };
        assert_eq!(
            describe(&item),
            "1700000000000  3 x Classic Cotton Shirt (M / White)  $30.00"
        );
    }
}
