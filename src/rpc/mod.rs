pub mod record;
pub mod views;
