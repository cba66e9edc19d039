use std::fs;

use log::LevelFilter;
use log4rs::{
    append::{console::ConsoleAppender, file::FileAppender},
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "logs/nearbite.log";
const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} | {({l}):5.5} | {f}:{L} - {m}{n}";

/// Log to stdout and to `logs/nearbite.log` at `level`.
pub fn setup_logging(level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(LOG_DIR)?;

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(LOG_FILE)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .appender(Appender::builder().build("file", Box::new(file)))
        // reqwest/hyper connection chatter drowns the search logs at debug
        .logger(Logger::builder().build("hyper", LevelFilter::Info))
        .logger(Logger::builder().build("rustls", LevelFilter::Warn))
        .build(Root::builder().appender("stdout").appender("file").build(level))?;

    log4rs::init_config(config)?;

    Ok(())
}
