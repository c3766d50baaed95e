pub mod killmail;

pub use killmail::*;
