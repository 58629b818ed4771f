//! Host-side helper: `cargo run` builds the WASM bundle into `static/pkg` and
//! serves `static/` locally so the page can be checked in a browser.

use std::io;
use std::process::{Command, ExitCode, Stdio};

use tracing::{error, info, warn};

const PORT: &str = "8000";

fn build_bundle() -> io::Result<bool> {
    info!("building wasm bundle");
    match Command::new("wasm-pack")
        .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
        .status()
    {
        Ok(status) => Ok(status.success()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("wasm-pack not found in PATH, serving whatever is already in static/pkg");
            Ok(true)
        }
        Err(err) => Err(err),
    }
}

fn serve() -> io::Result<()> {
    info!(url = %format!("http://127.0.0.1:{PORT}"), "serving static/");
    let status = Command::new("python3")
        .args(["-m", "http.server", PORT, "--directory", "static"])
        .stdout(Stdio::null())
        .status()?;
    if !status.success() {
        warn!(%status, "http server exited");
    }
    Ok(())
}

fn main() -> ExitCode {
    let level = std::env::var("FOLIO_LOG").unwrap_or_else(|_| "info".into());
    if let Err(err) = folio_motion::logging::init(&level) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match build_bundle() {
        Ok(true) => {}
        Ok(false) => {
            error!("wasm-pack finished with errors");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            error!(%err, "could not run wasm-pack");
            return ExitCode::FAILURE;
        }
    }

    match serve() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "could not start http server");
            ExitCode::FAILURE
        }
    }
}
