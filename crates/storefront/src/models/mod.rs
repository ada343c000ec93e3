//! Session-held storefront state.

pub mod cart;
pub mod session;
pub mod wishlist;

pub use cart::{Cart, CartError, CartLine, CouponError};
pub use session::LastOrder;
pub use wishlist::Wishlist;
