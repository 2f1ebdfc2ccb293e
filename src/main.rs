use std::process::ExitCode;

fn main() -> ExitCode {
    match hls::driver::run_hls() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
