//! Match / unwind / group pipelines over a user's embedded arrays.
//!
//! A pipeline selects one user document, unwinds one of its array fields
//! into one row per element, and groups the rows back by user id with a
//! single accumulator. As with any unwind, an empty array produces no rows
//! at all rather than a row with a zero value.

use common::{Money, User, UserId};

use crate::error::{Result, StoreError};

/// Array field of a user document that a pipeline unwinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayField {
    /// `usercart`
    Cart,
    /// `orders`
    Orders,
}

impl ArrayField {
    /// Key of the array inside the persisted document.
    pub fn document_key(&self) -> &'static str {
        match self {
            ArrayField::Cart => "usercart",
            ArrayField::Orders => "orders",
        }
    }

    /// Key of the price field inside one element of the array.
    pub fn price_key(&self) -> &'static str {
        match self {
            ArrayField::Cart => "price",
            ArrayField::Orders => "total_price",
        }
    }

    fn prices(&self, user: &User) -> Vec<Money> {
        match self {
            ArrayField::Cart => user.cart.iter().map(|item| item.price).collect(),
            ArrayField::Orders => user.orders.iter().map(|order| order.total_price).collect(),
        }
    }
}

/// Group-stage accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
    /// `$sum` of the element price, in cents.
    SumPrice,
    /// `$sum: 1`
    Count,
}

/// A single-user aggregation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    /// `$match` on the user id.
    pub match_user: UserId,

    /// `$unwind` path.
    pub unwind: ArrayField,

    /// `$group` accumulator, grouped by user id.
    pub group: Accumulator,
}

impl Pipeline {
    pub fn new(match_user: UserId, unwind: ArrayField, group: Accumulator) -> Self {
        Self {
            match_user,
            unwind,
            group,
        }
    }

    /// Sum of cart item prices for one user.
    pub fn cart_total(user_id: UserId) -> Self {
        Self::new(user_id, ArrayField::Cart, Accumulator::SumPrice)
    }

    /// Number of orders placed by one user.
    pub fn order_count(user_id: UserId) -> Self {
        Self::new(user_id, ArrayField::Orders, Accumulator::Count)
    }

    /// Evaluates the pipeline over documents held in memory.
    ///
    /// A price sum that does not fit in an `i64` fails with
    /// [`StoreError::Overflow`] instead of wrapping.
    pub fn evaluate<'a>(
        &self,
        users: impl IntoIterator<Item = &'a User>,
    ) -> Result<Vec<AggregateRow>> {
        let mut rows = Vec::new();
        for user in users {
            if user.user_id != self.match_user {
                continue;
            }
            let unwound = self.unwind.prices(user);
            if unwound.is_empty() {
                continue;
            }
            let value = match self.group {
                Accumulator::SumPrice => Money::checked_sum(unwound)
                    .map(|total| total.cents())
                    .ok_or_else(|| {
                        StoreError::Overflow(format!(
                            "{} total for user {}",
                            self.unwind.document_key(),
                            user.user_id
                        ))
                    })?,
                Accumulator::Count => unwound.len() as i64,
            };
            rows.push(AggregateRow {
                user_id: user.user_id,
                value,
            });
        }
        Ok(rows)
    }
}

/// One output row of the group stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateRow {
    /// The group key.
    pub user_id: UserId,

    /// Accumulated value: cents for `SumPrice`, a count for `Count`.
    pub value: i64,
}

impl AggregateRow {
    pub fn as_money(&self) -> Money {
        Money::from_cents(self.value)
    }
}
