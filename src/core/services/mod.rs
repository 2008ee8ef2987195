pub mod audit_reader;
pub mod audit_writer;
pub mod change_diff;
pub mod export_service;
