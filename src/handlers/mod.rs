pub mod accounts;
pub mod auctions;
pub mod chits;
pub mod health;
pub mod members;
pub mod reports;
