pub mod echo;
pub mod health;

#[cfg(test)]
mod tests;

pub use echo::{echo_handler, echo_params_handler};
pub use health::health_handler;
