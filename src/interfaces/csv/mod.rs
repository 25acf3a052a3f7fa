//! CSV batch transport: commands in, finance requests out.

pub mod command_reader;
pub mod request_writer;
