pub use super::auctions::Entity as Auctions;
pub use super::bids::Entity as Bids;
pub use super::chit_memberships::Entity as ChitMemberships;
pub use super::chit_months::Entity as ChitMonths;
pub use super::chits::Entity as Chits;
pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::members::Entity as Members;
pub use super::payments::Entity as Payments;
