use std::{env, fs, process::ExitCode};

use wisp::{Runner, StdPrint};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        // No script given: nothing to do.
        return ExitCode::SUCCESS;
    };

    let code = match read_file(file_path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let mut runner = match Runner::new(&code, file_path) {
        Ok(runner) => runner,
        Err(err) => return report(file_path, &err),
    };
    match runner.run(&mut StdPrint) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(file_path, &err),
    }
}

fn report(file_path: &str, err: &wisp::Exception) -> ExitCode {
    eprintln!("{file_path}: {err}");
    ExitCode::FAILURE
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("error: {file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("error reading {file_path}: {err}"));
        }
    }
    fs::read_to_string(file_path).map_err(|err| format!("error reading {file_path}: {err}"))
}
