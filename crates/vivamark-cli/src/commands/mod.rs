pub mod exam;
pub mod init;
pub mod mark;
pub mod validate;
