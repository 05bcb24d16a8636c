pub mod admin_controller;
pub mod health_controller;
pub mod media_controller;
