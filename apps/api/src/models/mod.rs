pub mod resume;
pub mod sections;
