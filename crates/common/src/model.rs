//! Document shapes persisted in the Users and Products collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AddressId, Money, OrderId, ProductId, UserId};

/// Profile fields supplied at signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// A user document.
///
/// The cart, address book and order history are embedded and mutated
/// independently by their engines. The store keys documents by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Live cart; ordered, duplicates allowed.
    #[serde(rename = "usercart", default)]
    pub cart: Vec<CartItem>,

    #[serde(rename = "address", default)]
    pub addresses: AddressBook,

    /// Append-only order history.
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl User {
    /// Creates a user with an empty cart, no addresses and no orders.
    pub fn new(profile: UserProfile, now: DateTime<Utc>) -> Self {
        Self {
            user_id: UserId::new(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            phone: profile.phone,
            created_at: now,
            updated_at: now,
            cart: Vec::new(),
            addresses: AddressBook::default(),
            orders: Vec::new(),
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub image: String,
}

/// Fields for a catalog entry that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub product_name: String,
    pub price: Money,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub image: String,
}

impl NewProduct {
    pub fn into_product(self, product_id: ProductId) -> Product {
        Product {
            product_id,
            product_name: self.product_name,
            price: self.price,
            rating: self.rating,
            image: self.image,
        }
    }
}

/// Snapshot of a product taken when it was put in a cart or an order.
///
/// Never updated after it is embedded; later catalog price changes do not
/// reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    #[serde(default)]
    pub image: String,
}

impl From<&Product> for CartItem {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.product_id,
            product_name: product.product_name.clone(),
            price: product.price,
            image: product.image.clone(),
        }
    }
}

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Digital,
    #[default]
    CashOnDelivery,
}

/// A placed order. Immutable once appended to a user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub ordered_at: DateTime<Utc>,
    pub order_list: Vec<CartItem>,
    pub payment_method: PaymentMethod,
    pub total_price: Money,
}

impl Order {
    /// Builds a new order with a fresh id.
    pub fn place(
        order_list: Vec<CartItem>,
        total_price: Money,
        payment_method: PaymentMethod,
        ordered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            ordered_at,
            order_list,
            payment_method,
            total_price,
        }
    }
}

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub address_id: AddressId,
    pub house_name: String,
    pub street_name: String,
    pub city_name: String,
    pub pin_code: String,
}

/// Named address slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressSlot {
    Home,
    Work,
}

impl AddressSlot {
    /// Slots in the order they are filled by `AddressBook::first_free_slot`.
    pub const ALL: [AddressSlot; 2] = [AddressSlot::Home, AddressSlot::Work];
}

impl std::fmt::Display for AddressSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressSlot::Home => write!(f, "home"),
            AddressSlot::Work => write!(f, "work"),
        }
    }
}

/// A user's addresses: at most one home and one work address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    #[serde(default)]
    pub home: Option<Address>,
    #[serde(default)]
    pub work: Option<Address>,
}

impl AddressBook {
    /// Maximum number of addresses a user may store.
    pub const CAPACITY: usize = 2;

    pub fn get(&self, slot: AddressSlot) -> Option<&Address> {
        match slot {
            AddressSlot::Home => self.home.as_ref(),
            AddressSlot::Work => self.work.as_ref(),
        }
    }

    pub fn set(&mut self, slot: AddressSlot, address: Address) {
        match slot {
            AddressSlot::Home => self.home = Some(address),
            AddressSlot::Work => self.work = Some(address),
        }
    }

    pub fn clear(&mut self) {
        self.home = None;
        self.work = None;
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        AddressSlot::ALL
            .iter()
            .filter(|slot| self.get(**slot).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= Self::CAPACITY
    }

    /// The slot the next added address goes into, home first.
    pub fn first_free_slot(&self) -> Option<AddressSlot> {
        AddressSlot::ALL
            .into_iter()
            .find(|slot| self.get(*slot).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(city: &str) -> Address {
        Address {
            address_id: AddressId::new(),
            house_name: "12".to_string(),
            street_name: "Main".to_string(),
            city_name: city.to_string(),
            pin_code: "560001".to_string(),
        }
    }

    #[test]
    fn address_book_fills_home_then_work() {
        let mut book = AddressBook::default();
        assert_eq!(book.first_free_slot(), Some(AddressSlot::Home));

        book.set(AddressSlot::Home, address("Pune"));
        assert_eq!(book.first_free_slot(), Some(AddressSlot::Work));
        assert_eq!(book.len(), 1);

        book.set(AddressSlot::Work, address("Mumbai"));
        assert!(book.is_full());
        assert_eq!(book.first_free_slot(), None);

        book.clear();
        assert!(book.is_empty());
    }

    #[test]
    fn cart_item_snapshots_product() {
        let product = Product {
            product_id: ProductId::new(),
            product_name: "Kettle".to_string(),
            price: Money::from_cents(2599),
            rating: Some(4),
            image: "kettle.png".to_string(),
        };
        let item = CartItem::from(&product);
        assert_eq!(item.product_id, product.product_id);
        assert_eq!(item.price, product.price);
        assert_eq!(item.image, "kettle.png");
    }

    #[test]
    fn user_document_uses_persisted_field_names() {
        let user = User::new(
            UserProfile {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: "555-0100".to_string(),
            },
            Utc::now(),
        );
        let json = serde_json::to_value(&user).unwrap();
        assert!(json["usercart"].as_array().unwrap().is_empty());
        assert!(json["address"]["home"].is_null());
        assert!(json["orders"].as_array().unwrap().is_empty());
    }

    #[test]
    fn address_without_id_gets_one_on_deserialize() {
        let json = r#"{"house_name":"1","street_name":"A","city_name":"B","pin_code":"2"}"#;
        let a: Address = serde_json::from_str(json).unwrap();
        let b: Address = serde_json::from_str(json).unwrap();
        assert_ne!(a.address_id, b.address_id);
    }

    #[test]
    fn payment_method_defaults_to_cash_on_delivery() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::CashOnDelivery);
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"cash_on_delivery\""
        );
    }
}
