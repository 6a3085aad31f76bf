mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod memory;
    pub mod schema;
    pub mod store;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod catalog {
    pub mod filter;
    pub mod sampling;
}
mod services {
    pub mod auth;
    pub mod recipes;
}
mod storage {
    pub mod images;
}
mod config;
mod constants;

pub use authentication::*;
pub use catalog::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use services::*;
pub use storage::*;
