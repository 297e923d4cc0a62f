mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod schema;
}
mod authentication {
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod api {
    pub mod filters;
    pub mod handlers;
    pub mod routes;
    pub mod serializers;
    pub mod shopping_list;
    pub mod validation;
}
mod config;
mod constants;
mod server;

pub use api::*;
pub use authentication::*;
pub use config::Config;
pub use constants::*;
pub use database::*;
pub use server::serve;
