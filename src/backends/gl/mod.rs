pub mod device;
mod types;
