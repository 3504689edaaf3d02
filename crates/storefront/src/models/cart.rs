//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use bookstore_core::{BookId, CartItemId, Price, UserId};

/// A stored cart row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub quantity: u32,
    pub date_added: DateTime<Utc>,
}

/// A cart row joined with the book it references, priced at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: CartItemId,
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub image_url: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub date_added: DateTime<Utc>,
}

impl CartLine {
    /// URL for the cover image as used in an `<img src>`.
    #[must_use]
    pub fn image_src(&self) -> String {
        super::book::image_src(&self.image_url)
    }

    /// Unit price times quantity, `None` on overflow.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.unit_price.amount().checked_mul(Decimal::from(self.quantity))
    }

    /// Unit price times quantity, saturating at `Decimal::MAX`.
    ///
    /// Only for display; totals go through [`cart_total`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.checked_line_total().unwrap_or(Decimal::MAX)
    }
}

/// Sum of all line totals, `None` if it does not fit in a `Decimal`.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Option<Decimal> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        total.checked_add(line.checked_line_total()?)
    })
}
