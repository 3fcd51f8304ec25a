pub mod clock;
pub mod conn;
pub mod hash;
pub mod payload;
