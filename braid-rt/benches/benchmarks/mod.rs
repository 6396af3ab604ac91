pub mod collections;
pub mod reference;
