//! Catalog seed file commands.

use std::path::Path;

use shopflow_core::Category;
use shopflow_storefront::catalog::SeedCatalog;
use tracing::info;

/// Validate a seed file: every product well-formed, IDs unique.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation.
pub async fn check(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    info!(path = %path.display(), "Checking catalog seed");
    let catalog = SeedCatalog::load(path).await?;

    info!("{} product(s)", catalog.len());
    for category in Category::tally(catalog.products()) {
        info!("  {}: {}", category.name, category.count);
    }
    info!("Seed file is valid");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check(&dir.path().join("missing.json")).await.is_err());
    }

    #[tokio::test]
    async fn test_check_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        let product = r#"{"id":1,"name":"Mug","price":"14.00","images":[],"category":"Home","description":"","inStock":true,"featured":false}"#;
        tokio::fs::write(&path, format!("[{product},{product}]"))
            .await
            .unwrap();
        assert!(check(&path).await.is_err());
    }
}
