pub mod collision;
pub mod gameplay;
pub mod stepper;
