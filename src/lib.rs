pub mod communication;
pub mod config;
pub mod control_system;
pub mod entities;
pub mod global_variables;
pub mod identification;
pub mod intersection_model;
pub mod monitoring;
pub mod pipeline;
pub mod shared_data;
