mod release;

pub use release::cmd_release;
