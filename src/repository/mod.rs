pub mod addresses;
pub mod audit_logs;
pub mod banners;
pub mod orders;
pub mod plans;
pub mod products;
pub mod reviews;
pub mod stores;
pub mod subscriptions;
pub mod users;
pub mod wishlist;
