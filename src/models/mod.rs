pub mod account;
pub mod auction;
pub mod chit;
pub mod member;
pub mod report;
