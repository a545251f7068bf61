//! Carts, lines and voucher attachments

use async_trait::async_trait;
use jiff::Timestamp;
use rebate::{
    content::{CartLineUuid, CartStatus, CartUuid, SessionUuid, UserUuid},
    merge::{CartLine, MergedLine},
    offers::OfferUuid,
};

use crate::{
    domain::carts::{
        models::{Cart, NewCart},
        repository::{AppliedVouchersRepository, CartsRepository},
    },
    store::StoreError,
};

use super::{MemoryStore, Tables, touch};

impl Tables {
    fn latest_open_cart(&self, predicate: impl Fn(&Cart) -> bool) -> Option<Cart> {
        self.carts
            .values()
            .filter(|cart| cart.status == CartStatus::Open && predicate(cart))
            .max_by_key(|cart| (cart.updated_at, cart.uuid))
            .cloned()
    }

    fn cart_mut(&mut self, cart: CartUuid) -> Result<&mut Cart, StoreError> {
        self.carts.get_mut(&cart).ok_or(StoreError::NotFound)
    }

    fn lines_mut(&mut self, cart: CartUuid) -> Result<&mut Vec<CartLine>, StoreError> {
        touch(self.cart_mut(cart)?);

        Ok(self.lines.entry(cart).or_default())
    }
}

#[async_trait]
impl CartsRepository for MemoryStore {
    async fn get_cart(&self, cart: CartUuid) -> Result<Cart, StoreError> {
        self.tables
            .read()
            .await
            .carts
            .get(&cart)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_cart_by_session(&self, session: SessionUuid) -> Result<Option<Cart>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .latest_open_cart(|cart| cart.session == session))
    }

    async fn get_open_cart_for_user(&self, user: UserUuid) -> Result<Option<Cart>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .latest_open_cart(|cart| cart.user == Some(user)))
    }

    async fn create_cart(&self, cart: NewCart) -> Result<Cart, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.carts.contains_key(&cart.uuid) {
            return Err(StoreError::AlreadyExists);
        }

        let now = Timestamp::now();

        let created = Cart {
            uuid: cart.uuid,
            session: cart.session,
            user: cart.user,
            status: CartStatus::Open,
            created_at: now,
            updated_at: now,
        };

        tables.carts.insert(created.uuid, created.clone());

        Ok(created)
    }

    async fn get_lines(&self, cart: CartUuid) -> Result<Vec<CartLine>, StoreError> {
        let tables = self.tables.read().await;

        if !tables.carts.contains_key(&cart) {
            return Err(StoreError::NotFound);
        }

        Ok(tables.lines.get(&cart).cloned().unwrap_or_default())
    }

    async fn insert_line(&self, cart: CartUuid, line: CartLine) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let lines = tables.lines_mut(cart)?;

        if lines.iter().any(|existing| existing.uuid == line.uuid) {
            return Err(StoreError::AlreadyExists);
        }

        lines.push(line);

        Ok(())
    }

    async fn update_line_quantity(
        &self,
        cart: CartUuid,
        line: CartLineUuid,
        quantity: u32,
    ) -> Result<CartLine, StoreError> {
        let mut tables = self.tables.write().await;

        let existing = tables
            .lines_mut(cart)?
            .iter_mut()
            .find(|existing| existing.uuid == line)
            .ok_or(StoreError::NotFound)?;

        existing.quantity = quantity;

        Ok(*existing)
    }

    async fn delete_line(&self, cart: CartUuid, line: CartLineUuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let lines = tables.lines_mut(cart)?;
        let before = lines.len();

        lines.retain(|existing| existing.uuid != line);

        if lines.len() == before {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn clear_lines(&self, cart: CartUuid) -> Result<(), StoreError> {
        self.tables.write().await.lines_mut(cart)?.clear();

        Ok(())
    }

    async fn upsert_lines(&self, cart: CartUuid, merged: Vec<MergedLine>) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let lines = tables.lines_mut(cart)?;

        for line in merged {
            if let Some(existing) = line
                .uuid
                .and_then(|uuid| lines.iter_mut().find(|existing| existing.uuid == uuid))
            {
                existing.quantity = line.quantity;
                continue;
            }

            lines.push(CartLine {
                uuid: line.uuid.unwrap_or_default(),
                product: line.product,
                quantity: line.quantity,
            });
        }

        Ok(())
    }

    async fn set_status(&self, cart: CartUuid, status: CartStatus) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let cart = tables.cart_mut(cart)?;

        cart.status = status;
        touch(cart);

        Ok(())
    }

    async fn assign_user(&self, cart: CartUuid, user: UserUuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let cart = tables.cart_mut(cart)?;

        cart.user = Some(user);
        touch(cart);

        Ok(())
    }
}

#[async_trait]
impl AppliedVouchersRepository for MemoryStore {
    async fn list_applied(&self, cart: CartUuid) -> Result<Vec<OfferUuid>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .applied_vouchers
            .get(&cart)
            .cloned()
            .unwrap_or_default())
    }

    async fn is_applied(&self, cart: CartUuid, offer: OfferUuid) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .applied_vouchers
            .get(&cart)
            .is_some_and(|offers| offers.contains(&offer)))
    }

    async fn insert_applied(&self, cart: CartUuid, offer: OfferUuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.carts.contains_key(&cart) {
            return Err(StoreError::NotFound);
        }

        let applied = tables.applied_vouchers.entry(cart).or_default();

        if applied.contains(&offer) {
            return Err(StoreError::AlreadyExists);
        }

        applied.push(offer);

        Ok(())
    }

    async fn delete_applied(&self, cart: CartUuid, offer: OfferUuid) -> Result<(), StoreError> {
        if let Some(applied) = self.tables.write().await.applied_vouchers.get_mut(&cart) {
            applied.retain(|existing| *existing != offer);
        }

        Ok(())
    }

    async fn reset_applied(&self, cart: CartUuid) -> Result<(), StoreError> {
        self.tables.write().await.applied_vouchers.remove(&cart);

        Ok(())
    }

    async fn replace_applied(
        &self,
        cart: CartUuid,
        offers: Vec<OfferUuid>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.carts.contains_key(&cart) {
            return Err(StoreError::NotFound);
        }

        if offers.is_empty() {
            tables.applied_vouchers.remove(&cart);
        } else {
            tables.applied_vouchers.insert(cart, offers);
        }

        Ok(())
    }
}
