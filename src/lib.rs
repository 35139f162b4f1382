//! tradepost: a session-authenticated product listing API.
//!
//! This library exposes the server modules so integration tests can assemble
//! the real router over substitute stores.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

pub mod models {
    pub mod product;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod product;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod products;
    pub mod tokens;
}

pub mod handlers {
    pub mod products;
    pub mod sessions;
    pub mod users;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod validation {
    pub mod products;
    pub mod users;
}
