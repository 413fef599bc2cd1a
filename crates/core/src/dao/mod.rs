//! Persistence capability (DAO) contract.
//!
//! The engine depends only on the `DbDao` trait; concrete backends live in
//! storage crates.

mod dao_model;
mod dao_traits;

pub use dao_model::*;
pub use dao_traits::DbDao;
