use nursery_common::Rupees;
use nursery_order_engine::db_types::OrderItem;

/// The storefront never sells more than ten of one plant per order.
pub const MAX_QUANTITY_PER_ITEM: u32 = 10;

/// The customer's cart. Checkout reads the lines and the subtotal, and clears the cart only
/// after the order write has succeeded; a failed or cancelled checkout leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<OrderItem>,
}

impl Cart {
    /// Adds one unit of a product, merging with an existing line and capping the quantity.
    pub fn add(&mut self, product_id: &str, name: &str, unit_price: Rupees) {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(line) => line.quantity = (line.quantity + 1).min(MAX_QUANTITY_PER_ITEM),
            None => self.items.push(OrderItem::new(product_id, name, unit_price, 1)),
        }
    }

    /// Removes one unit; the line disappears when it hits zero.
    pub fn decrement(&mut self, product_id: &str) {
        if let Some(line) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            line.quantity -= 1;
        }
        self.items.retain(|i| i.quantity > 0);
    }

    pub fn remove(&mut self, product_id: &str) {
        self.items.retain(|i| i.product_id != product_id);
    }

    pub fn subtotal(&self) -> Rupees {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replaces the cart contents with a past order's items ("Order Again").
    pub fn replace(&mut self, items: Vec<OrderItem>) {
        self.items = items;
    }
}
