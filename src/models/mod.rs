mod budget;
mod category;
mod period;
mod transaction;

pub use budget::{Budget, BudgetPatch};
pub use category::Category;
pub use period::Period;
pub use transaction::{Transaction, TransactionPatch, TransactionType};
