//! Catalog pagination

use crate::commerce::Product;
use std::num::NonZeroUsize;

/// One page of the catalog, sorted by name then id
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    products: Vec<Product>,
    index: usize,
    page_count: usize,
}

impl CatalogPage {
    /// Slice `products` into the requested page
    ///
    /// The index is clamped to the last page, so a non-empty catalog never
    /// renders an empty page. An empty catalog has a single empty page.
    pub fn new(mut products: Vec<Product>, page_size: NonZeroUsize, requested: usize) -> Self {
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let size = page_size.get();
        let page_count = products.len().div_ceil(size).max(1);
        let index = requested.min(page_count - 1);
        let products = products
            .into_iter()
            .skip(index * size)
            .take(size)
            .collect();

        Self {
            products,
            index,
            page_count,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Zero-based index after clamping
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.page_count
    }
}
