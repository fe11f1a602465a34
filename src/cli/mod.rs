pub mod commands;
pub mod util;

pub use util::{load_config, load_dispatcher, print_json};
