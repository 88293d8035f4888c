use crate::InvalConfig;
use crate::Oid;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Default config connected to `database_id`
pub fn test_config(database_id: Oid) -> InvalConfig {
    let mut config = InvalConfig::default();
    config.session.database_id = database_id;
    config
}
