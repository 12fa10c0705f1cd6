pub mod capability;
pub mod entities;
pub mod errors;
pub mod value_objects;
