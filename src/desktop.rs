//! Desktop integration through external commands.
//!
//! Both operations shell out to configurable argv templates rather than
//! talking to a display server directly:
//!
//! | Operation | Default command | Contract |
//! |---|---|---|
//! | [`detect_resolution`] | `xdpyinfo` | stdout contains `dimensions: WxH pixels` |
//! | [`set_background`] | `feh --bg-max {path}` | exit status 0 |

use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

/// Placeholder replaced by the wallpaper path in the setter template.
pub const PATH_PLACEHOLDER: &str = "{path}";

#[derive(Error, Debug)]
pub enum DesktopError {
    #[error("empty command")]
    EmptyCommand,
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("no 'dimensions: WxH pixels' line in output of '{0}'")]
    NoResolution(String),
}

/// Find the first `dimensions: WxH pixels` line and return `(W, H)`.
pub fn parse_xdpyinfo(output: &str) -> Option<(u32, u32)> {
    output.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("dimensions:")?;
        let size = rest.split_whitespace().next()?;
        let (w, h) = size.split_once('x')?;
        let (w, h) = (w.parse().ok()?, h.parse().ok()?);
        (w > 0 && h > 0).then_some((w, h))
    })
}

/// Replace every `{path}` in `template` with `path`.
pub fn substitute_path(template: &[String], path: &Path) -> Vec<String> {
    let path = path.to_string_lossy();
    template
        .iter()
        .map(|arg| arg.replace(PATH_PLACEHOLDER, &path))
        .collect()
}

/// Run `argv` to completion and return its stdout.
fn run(argv: &[String]) -> Result<String, DesktopError> {
    let (program, args) = argv.split_first().ok_or(DesktopError::EmptyCommand)?;
    debug!(command = %argv.join(" "), "Running");
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| DesktopError::Spawn {
            program: program.clone(),
            source,
        })?;
    if !output.status.success() {
        return Err(DesktopError::Failed {
            command: argv.join(" "),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Ask the display for its size using `command`.
pub fn detect_resolution(command: &[String]) -> Result<(u32, u32), DesktopError> {
    let stdout = run(command)?;
    let (width, height) =
        parse_xdpyinfo(&stdout).ok_or_else(|| DesktopError::NoResolution(command.join(" ")))?;
    info!(width, height, "Detected screen resolution");
    Ok((width, height))
}

/// Apply `path` as the desktop background using the `template` argv.
///
/// Relative paths are made absolute first, since the setter may run with a
/// different working directory or remember the path for later sessions.
pub fn set_background(template: &[String], path: &Path) -> Result<(), DesktopError> {
    let absolute = std::path::absolute(path).map_err(|source| DesktopError::Spawn {
        program: template.first().cloned().unwrap_or_default(),
        source,
    })?;
    let argv = substitute_path(template, &absolute);
    run(&argv)?;
    info!(path = %absolute.display(), "Desktop background set");
    Ok(())
}
