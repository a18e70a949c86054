use std::process::ExitCode;

fn main() -> ExitCode {
    shoply_cli::run()
}
