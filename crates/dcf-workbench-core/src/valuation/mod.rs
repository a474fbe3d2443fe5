pub mod engine;
pub mod multiples;
pub mod sensitivity;
