// Business domains
pub mod drives;
