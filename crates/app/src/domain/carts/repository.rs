//! Carts Repositories

use async_trait::async_trait;
use mockall::automock;
use rebate::{
    content::{CartLineUuid, CartStatus, CartUuid, SessionUuid, UserUuid},
    merge::{CartLine, MergedLine},
    offers::OfferUuid,
};

use crate::{
    domain::carts::models::{Cart, NewCart},
    store::StoreError,
};

/// Cart and cart line storage.
#[automock]
#[async_trait]
pub trait CartsRepository: Send + Sync {
    /// Fetch one cart.
    async fn get_cart(&self, cart: CartUuid) -> Result<Cart, StoreError>;

    /// The most recently updated open cart for a session.
    async fn get_cart_by_session(&self, session: SessionUuid) -> Result<Option<Cart>, StoreError>;

    /// The most recently updated open cart owned by a user.
    async fn get_open_cart_for_user(&self, user: UserUuid) -> Result<Option<Cart>, StoreError>;

    /// Create an open, empty cart.
    async fn create_cart(&self, cart: NewCart) -> Result<Cart, StoreError>;

    /// Lines of a cart, in insertion order.
    async fn get_lines(&self, cart: CartUuid) -> Result<Vec<CartLine>, StoreError>;

    /// Append a line.
    async fn insert_line(&self, cart: CartUuid, line: CartLine) -> Result<(), StoreError>;

    /// Change a line's quantity.
    async fn update_line_quantity(
        &self,
        cart: CartUuid,
        line: CartLineUuid,
        quantity: u32,
    ) -> Result<CartLine, StoreError>;

    /// Remove a line.
    async fn delete_line(&self, cart: CartUuid, line: CartLineUuid) -> Result<(), StoreError>;

    /// Remove every line.
    async fn clear_lines(&self, cart: CartUuid) -> Result<(), StoreError>;

    /// Write merged lines: lines with an id update that line's quantity, lines without one
    /// are inserted with a fresh id.
    async fn upsert_lines(&self, cart: CartUuid, lines: Vec<MergedLine>) -> Result<(), StoreError>;

    /// Move a cart to another status.
    async fn set_status(&self, cart: CartUuid, status: CartStatus) -> Result<(), StoreError>;

    /// Make `user` the owner of a cart.
    async fn assign_user(&self, cart: CartUuid, user: UserUuid) -> Result<(), StoreError>;
}

/// Which vouchers are attached to which carts.
#[automock]
#[async_trait]
pub trait AppliedVouchersRepository: Send + Sync {
    /// Vouchers attached to a cart, in the order they were attached.
    async fn list_applied(&self, cart: CartUuid) -> Result<Vec<OfferUuid>, StoreError>;

    /// Whether a voucher is attached to a cart.
    async fn is_applied(&self, cart: CartUuid, offer: OfferUuid) -> Result<bool, StoreError>;

    /// Attach a voucher. Fails with [`StoreError::AlreadyExists`] if it already is.
    async fn insert_applied(&self, cart: CartUuid, offer: OfferUuid) -> Result<(), StoreError>;

    /// Detach a voucher. Detaching one that is not attached does nothing.
    async fn delete_applied(&self, cart: CartUuid, offer: OfferUuid) -> Result<(), StoreError>;

    /// Detach every voucher from a cart.
    async fn reset_applied(&self, cart: CartUuid) -> Result<(), StoreError>;

    /// Swap a cart's attachments for `offers`, keeping their order.
    async fn replace_applied(&self, cart: CartUuid, offers: Vec<OfferUuid>)
    -> Result<(), StoreError>;
}
