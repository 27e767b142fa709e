pub mod files;

pub use files::{
    atomic_write, config_file, get_tend_dir, init_local_tend, log_file,
    read_optional, remove_if_exists, session_file, tasks_file,
};
