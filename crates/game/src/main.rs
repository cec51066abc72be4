mod app;

use tracing::{error, info};

fn main() {
    app::init_tracing();
    info!("=== Vantage Startup ===");

    let wiring = match app::build_app() {
        Ok(wiring) => wiring,
        Err(err) => {
            error!(error = %err, "startup_failed");
            std::process::exit(1);
        }
    };

    if let Err(err) = app::run(wiring) {
        error!(error = %err, "terminal_io_failed");
        std::process::exit(1);
    }
}
