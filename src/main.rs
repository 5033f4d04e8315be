use std::process::ExitCode;

use jarvis::ui::output;

fn main() -> ExitCode {
    match jarvis::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
