//! gitpipe binary entry point.

use std::process::ExitCode;

use gitpipe::ui::output;

fn main() -> ExitCode {
    match gitpipe::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
