pub mod customer;
pub mod expense;
pub mod job;
pub mod line_item;
pub mod measurement;
pub mod setting;
pub mod topsheet;

pub use customer::{CreateCustomer, Customer, UpdateCustomer};
pub use expense::{CreateExpense, Expense, ExpenseCategory, UpdateExpense};
pub use job::{ItemWithMeasurements, Job, JobSnapshot, JobStatus, ListJobsFilter};
pub use line_item::LineItem;
pub use measurement::Measurement;
pub use setting::Setting;
pub use topsheet::{Topsheet, TopsheetStatus};
