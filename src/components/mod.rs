//! Small circuits assembled from the model's gates.

pub mod adder;
pub mod mux;
pub mod word;
