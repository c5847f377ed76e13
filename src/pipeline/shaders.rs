pub mod fixed_function;
