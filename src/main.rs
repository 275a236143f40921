use std::process::ExitCode;

fn main() -> ExitCode {
    match valetudo_render::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
