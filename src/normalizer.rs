use crate::model::Catalog;
use crate::utils::capitalize;
use std::collections::HashMap;

pub const DEFAULT_BRAND: &str = "otros";

/// Assigns `marca` to every row of the table, whatever its `categoria`.
pub fn classify_all(mut catalog: Catalog, keywords: &[String]) -> Catalog {
    for product in catalog.products.iter_mut() {
        product.marca = classify(&product.producto, keywords);
    }
    catalog
}

/// Brand for a product name: the last keyword in list order found in the
/// lower-cased name, capitalized, or `otros` if none matches.
pub fn classify(producto: &str, keywords: &[String]) -> String {
    let name = producto.to_lowercase();

    keywords
        .iter()
        .rev()
        .find(|keyword| name.contains(keyword.as_str()))
        .map(|keyword| capitalize(keyword))
        .unwrap_or_else(|| DEFAULT_BRAND.to_string())
}

/// Rows per brand, most frequent first.
pub fn brand_distribution(catalog: &Catalog) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for product in &catalog.products {
        *counts.entry(product.marca.as_str()).or_default() += 1;
    }

    let mut distribution: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(marca, count)| (marca.to_string(), count))
        .collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    distribution
}
