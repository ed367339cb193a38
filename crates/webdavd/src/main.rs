//! `webdavd` binary entry point.

use std::process::ExitCode;

use clap::Parser;
use webdavd_config::DaemonArgs;

fn main() -> ExitCode {
    let args = DaemonArgs::parse();
    match webdavd::run_daemon(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("webdavd: {error}");
            ExitCode::FAILURE
        }
    }
}
