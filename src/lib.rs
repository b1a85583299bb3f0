pub mod record;
pub mod sink;
pub mod layer;

pub mod env;
pub mod hook;
pub mod init;
pub mod memory_sink;
pub mod noop_sink;
pub mod options;
pub mod path;
pub mod root_logger;
pub mod stack;
