//! Route modules for the invoice API.

pub mod health;
pub mod invoices;
pub mod process;
pub mod validate;
