//! Session-related types.
//!
//! The cart, wishlist, and last placed order live in the server-side session
//! under the keys below. Missing or undecodable values read as empty.

use fernleaf_core::{CurrencyCode, OrderId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::{Cart, Wishlist};

/// The order placed in this session, used to authorize the confirmation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOrder {
    pub id: OrderId,
    pub key: String,
}

/// Session keys for storefront data.
pub mod keys {
    /// Key for the cart and its applied coupons.
    pub const CART: &str = "cart";

    /// Key for the wishlist.
    pub const WISHLIST: &str = "wishlist";

    /// Key for the most recently placed order.
    pub const LAST_ORDER: &str = "last_order";
}

/// Load the cart, or an empty one in the store currency.
pub async fn load_cart(session: &Session, currency: CurrencyCode) -> Cart {
    match session.get::<Cart>(keys::CART).await {
        Ok(Some(cart)) => cart,
        Ok(None) => Cart::new(currency),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable cart");
            Cart::new(currency)
        }
    }
}

/// Store the cart.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}

/// Load the wishlist, or an empty one.
pub async fn load_wishlist(session: &Session) -> Wishlist {
    session
        .get::<Wishlist>(keys::WISHLIST)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the wishlist.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn save_wishlist(
    session: &Session,
    wishlist: &Wishlist,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::WISHLIST, wishlist).await
}

/// The order placed in this session, if any.
pub async fn last_order(session: &Session) -> Option<LastOrder> {
    session.get::<LastOrder>(keys::LAST_ORDER).await.ok().flatten()
}

/// Remember a placed order.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn set_last_order(
    session: &Session,
    order: &LastOrder,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::LAST_ORDER, order).await
}
