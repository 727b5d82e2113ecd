pub mod agent;
pub mod pdf_fields;
pub mod status;
