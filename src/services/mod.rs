pub mod analysis;
pub mod currency;
pub mod dashboard;
pub mod month;
pub mod settings;
pub mod source;
