use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = std::io::stdout().lock();
    let code = catalink_cli::main_with_args(std::env::args_os(), &mut stdout);
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
