use std::process::ExitCode;

use eventdesk::config::check_env;

fn main() -> ExitCode {
    let report = check_env(|name| std::env::var(name).ok());
    let mut missing = 0;
    for status in &report {
        match &status.preview {
            Some(preview) => println!("  ok       {:<22} {}", status.name, preview),
            None => {
                missing += 1;
                println!("  MISSING  {}", status.name);
            }
        }
    }

    if missing > 0 {
        eprintln!("{missing} of {} variables missing", report.len());
        return ExitCode::FAILURE;
    }
    println!("All {} variables set", report.len());
    ExitCode::SUCCESS
}
