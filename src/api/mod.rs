pub mod leave;
pub mod profile;
pub mod records;
pub mod requests;
pub mod system;
pub mod training;
