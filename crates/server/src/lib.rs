pub mod errors;
pub mod middleware;
pub mod routes;
pub mod startup;

pub use startup::run;
