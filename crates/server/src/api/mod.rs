mod admin;
mod middleware;
mod routes;
mod search;
mod system;

pub use routes::create_router;
