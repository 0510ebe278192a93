use RustedContours::Utils::logger::init_logger;
use RustedContours::Utils::plots::DefaultRenderer;
use RustedContours::errors::SessionError;
use RustedContours::session::{PlotConfig, Session};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// usage: rusted_contours [settings-file]
fn main() -> ExitCode {
    let settings_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match PlotConfig::load(settings_path.as_deref()).map_err(SessionError::from) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logger(config.loglevel, config.log_file);

    let mut session = Session::new(config);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    match session.run(&mut input, &mut out, &mut DefaultRenderer::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
