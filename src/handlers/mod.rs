pub mod purchase;
pub mod expense;
pub mod report;
