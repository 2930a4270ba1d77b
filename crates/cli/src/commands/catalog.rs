//! Catalog browsing commands.

use shopflow_core::{Product, ProductFilters, ProductId, SortOrder, format_money};
use shopflow_storefront::state::AppState;
use tracing::info;

use crate::ListArgs;

fn summary_line(product: &Product) -> String {
    let mut flags = Vec::new();
    if product.featured {
        flags.push("featured");
    }
    if !product.in_stock {
        flags.push("out of stock");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    format!(
        "{:>4}  {:<28} {:>10}  {}{flags}",
        product.id.get(),
        product.name,
        format_money(product.price.amount()),
        product.category,
    )
}

/// List products matching the filters.
///
/// # Errors
///
/// Returns an error if the sort order is unknown or the catalog fails.
pub async fn list(state: &AppState, args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let sort: SortOrder = args.sort.parse()?;
    let filters = ProductFilters {
        search: args.search,
        category: args.category,
        min_price: args.min_price,
        max_price: args.max_price,
        in_stock: args.in_stock,
        featured: args.featured,
    };

    let mut products = state.catalog().get_all(&filters).await?;
    sort.apply(&mut products);

    for product in &products {
        info!("{}", summary_line(product));
    }
    info!("{} product(s)", products.len());
    Ok(())
}

/// Show one product and its variants.
///
/// # Errors
///
/// Returns an error if the product does not exist or the catalog fails.
pub async fn show(state: &AppState, id: i32) -> Result<(), Box<dyn std::error::Error>> {
    let product = state.catalog().get_by_id(ProductId::new(id)).await?;

    info!("{}", summary_line(&product));
    info!("  {}", product.description);
    if !product.tags.is_empty() {
        info!("  tags: {}", product.tags.join(", "));
    }
    for variant in product.effective_variants() {
        info!(
            "  size {:<6} color {:<10} stock {}",
            variant.size.as_deref().unwrap_or("-"),
            variant.color.as_deref().unwrap_or("-"),
            variant.stock
        );
    }
    Ok(())
}

/// List categories with their product counts.
///
/// # Errors
///
/// Returns an error if the catalog fails.
pub async fn categories(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    for category in state.catalog().get_categories().await? {
        info!("{:<20} {:<20} {}", category.name, category.slug, category.count);
    }
    Ok(())
}
