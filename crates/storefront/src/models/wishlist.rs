//! Session-held wishlist.

use fernleaf_core::ProductId;
use serde::{Deserialize, Serialize};

/// Product ids in the order they were added, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    ids: Vec<ProductId>,
}

impl Wishlist {
    /// Add the product if absent, remove it if present.
    ///
    /// Returns `true` if the product is now on the wishlist.
    pub fn toggle(&mut self, id: ProductId) -> bool {
        if self.remove(id) {
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    /// Remove a product. Returns whether it was present.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|i| *i != id);
        self.ids.len() != before
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut list = Wishlist::default();
        assert!(list.toggle(ProductId::new(3)));
        assert!(list.toggle(ProductId::new(1)));
        assert!(list.contains(ProductId::new(3)));
        assert_eq!(list.len(), 2);

        assert!(!list.toggle(ProductId::new(3)));
        assert!(!list.contains(ProductId::new(3)));
        assert_eq!(list.ids(), &[ProductId::new(1)]);
    }

    #[test]
    fn test_keeps_insertion_order() {
        let mut list = Wishlist::default();
        for id in [5, 2, 9] {
            list.toggle(ProductId::new(id));
        }
        assert_eq!(
            list.ids(),
            &[ProductId::new(5), ProductId::new(2), ProductId::new(9)]
        );
        assert!(!list.remove(ProductId::new(4)));
        assert!(list.remove(ProductId::new(2)));
        assert_eq!(list.len(), 2);
    }
}
