pub mod check;
pub mod info;
pub mod init;
pub mod run;
pub mod simulate;
