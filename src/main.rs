use std::sync::Arc;

use log::{error, info};
use log4rs::{
    append::rolling_file::{
        policy::compound::{
            roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy,
        },
        RollingFileAppender,
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};
use tokio::{
    io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::Mutex,
};

mod commands;
mod config;
mod database;
mod endpoints;
mod error;
mod formatter;
mod ledger;
mod parser;
mod summary;
mod types;
mod validator;

use crate::commands::{Reply, Session};
use crate::config::Config;
use crate::database::sqlite::SqliteDatabase;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_log(&config)?;

    info!("Initializing database at {}...", config.database_path.display());
    let database = SqliteDatabase::new(&config.database_path).map_err(|e| {
        error!("Cannot initialize database: {}", e);
        e
    })?;
    let database = Arc::new(Mutex::new(database));

    info!("Starting console...");
    let mut session = Session::new(database, config);
    let mut stdout = io::stdout();
    let mut lines = BufReader::new(io::stdin()).lines();

    stdout
        .write_all(b"Type /help for the list of commands.\n")
        .await?;
    while let Some(line) = lines.next_line().await? {
        let today = chrono::Local::now().date_naive();
        match session.execute(&line, today).await {
            Some(Reply::Text(text)) => {
                stdout.write_all(text.as_bytes()).await?;
                if !text.ends_with('\n') {
                    stdout.write_all(b"\n").await?;
                }
                stdout.flush().await?;
            }
            Some(Reply::Quit) => break,
            None => {}
        }
    }

    info!("Bye");
    Ok(())
}

fn init_log(config: &Config) -> anyhow::Result<()> {
    let log_dir = match &config.log_dir {
        Some(log_dir) => log_dir,
        None => {
            pretty_env_logger::formatted_builder()
                .filter_level(config.log_level)
                .init();
            return Ok(());
        }
    };

    // Create a trigger that rolls the log file when it exceeds 10 MB.
    let size_trigger = SizeTrigger::new(10 * 1024 * 1024);

    // Create a roller that keeps up to 2 backup log files with a pattern.
    let pattern = log_dir.join("mess_ledger.{}.log");
    let fixed_window_roller = FixedWindowRoller::builder()
        .build(&pattern.to_string_lossy(), 2)
        .map_err(|e| anyhow::anyhow!("[init log] Cannot create fixed window roller: {e}"))?;

    let compound_policy =
        CompoundPolicy::new(Box::new(size_trigger), Box::new(fixed_window_roller));

    let rolling_file_appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d} - {l} - {m}{n}")))
        .build(log_dir.join("mess_ledger.log"), Box::new(compound_policy))?;

    let log_config = log4rs::config::Config::builder()
        .appender(Appender::builder().build("rolling_file", Box::new(rolling_file_appender)))
        .build(
            Root::builder()
                .appender("rolling_file")
                .build(config.log_level),
        )?;

    log4rs::init_config(log_config)?;
    Ok(())
}
