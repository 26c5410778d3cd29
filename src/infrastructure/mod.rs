pub mod asaas;
pub mod csrf_store;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit_store;
pub mod validation;
