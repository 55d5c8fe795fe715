//! Types that represent the core data model, such as `TransactionRecord` and `User`.
mod amount;
mod category;
mod transaction;
mod user;

pub use amount::{Amount, AmountError};
pub use category::{find_category, CategoryDefinition, CATEGORIES};
pub use transaction::{NewTransaction, TransactionRecord, TransactionType};
pub use user::User;
