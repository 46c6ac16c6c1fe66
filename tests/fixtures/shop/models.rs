//! Catalog models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use validator::Validate;

/// An item of the catalog.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique item id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Money,
    /// Item category.
    pub category: Category,
    /// Free-form labels.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Customer reviews.
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub revision: u32,
}

impl Item {
    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Payload for creating an item.
#[derive(Debug, Deserialize, Validate)]
pub struct NewItem {
    /// Display name.
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    /// Unit price in cents.
    #[validate(range(min = 1))]
    pub price_cents: Option<u64>,
    /// Maximum number of units per order.
    /// @default 10
    pub max_units: Option<u32>,
    /// Stock keeping unit.
    #[validate(required(group = "Create"))]
    pub sku: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Book,
    Music,
    HomeOffice,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Review {
    /// Rating from 1 to 5.
    pub rating: u8,
    /// Review text.
    pub text: Option<String>,
    /// Replies to this review.
    pub replies: Vec<Review>,
}

/// An amount with currency, written as `"12.50 EUR"`.
#[derive(Debug)]
pub struct Money {
    cents: i64,
    currency: String,
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{}.{:02} {}", self.cents / 100, self.cents % 100, self.currency))
    }
}

/// One page of results.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Total number of items.
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FirstLevel {
    /// Second level.
    pub second: Option<SecondLevel>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SecondLevel {
    /// Third level entries.
    #[validate(length(min = 1))]
    pub third: Vec<ThirdLevel>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThirdLevel {
    /// Fourth level.
    pub fourth: Option<FourthLevel>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FourthLevel {
    /// Fifth level entries.
    pub fifth: Option<Vec<FifthLevel>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FifthLevel {
    /// The last value.
    pub last: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Scalars {
    /// A text.
    #[validate(custom(function = "not_blank"))]
    pub string_field: Option<String>,
    /// A flag.
    pub boolean_field: Option<bool>,
    /// A whole number.
    #[validate(required)]
    pub number_field1: Option<i32>,
    /// A fraction.
    pub number_field2: Option<f64>,
}

/// A payment method.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payment {
    CreditCard {
        /// Card holder name.
        holder: String,
        /// Last four digits.
        last_digits: String,
    },
    BankTransfer {
        /// Account holder name.
        holder: String,
        /// International bank account number.
        iban: String,
    },
}
