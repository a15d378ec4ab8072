pub mod intmax;
pub mod names;
pub mod reconciliation;
pub mod registration;
pub mod tee;
pub mod transactions;
pub mod users;
