use std::process::ExitCode;

fn main() -> ExitCode {
    markdown_convert_cli::run()
}
