use pipedash::cli::run;
use pipedash::error::ReportError;

fn main() {
    env_logger::init();

    #[cfg(windows)]
    let _ = enable_ansi_support::enable_ansi_support();

    if let Err(e) = run() {
        // Database failures exit 2 with the same wording the dashboard uses
        let is_internal = e
            .chain()
            .filter_map(|cause| cause.downcast_ref::<ReportError>())
            .any(ReportError::is_database);
        if is_internal {
            eprintln!("Error fetching records: {}", e);
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut indent = 1;
                while let Some(err) = source {
                    eprintln!("{:indent$}  {}", "", err);
                    source = err.source();
                    indent += 1;
                }
            }
            std::process::exit(2);
        } else {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
