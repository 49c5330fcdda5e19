pub mod initial;
pub mod physical;
pub mod sampling;
