pub mod forms;
pub mod models;
pub mod session;
