pub mod dashboard;
pub mod detail;
pub mod markets;
pub mod portfolio;
pub mod ui;
