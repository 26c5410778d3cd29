pub mod audit;
pub mod auth;
pub mod banners;
pub mod orders;
pub mod plans;
pub mod products;
pub mod stores;
pub mod subscriptions;
pub mod users;
