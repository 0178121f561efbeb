pub mod common_io; // gz-aware buffered readers, writers and token streams
pub mod ndarray_util; // trait implementations for `ndarray::Array2`
pub mod traits; // sampling and projection traits for matrices
