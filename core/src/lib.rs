pub mod allergen_subsystem;
pub mod clock;
pub mod command;
pub mod complaint_subsystem;
pub mod config;
pub mod customer_subsystem;
pub mod engine;
pub mod error;
pub mod event;
pub mod follow_up_subsystem;
pub mod preference_subsystem;
pub mod store;
pub mod subsystem;
pub mod survey_subsystem;
pub mod types;
