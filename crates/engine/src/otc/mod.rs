pub mod rest;

pub use rest::OtcClient;
