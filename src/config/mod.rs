pub mod server;

pub use server::{DatabasePools, Server};
