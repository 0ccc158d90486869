pub mod customers;
pub mod dashboard;
pub mod documents;
pub mod health;
pub mod jobs;
pub mod settings;
pub mod topsheets;
