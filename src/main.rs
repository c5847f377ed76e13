use clap::{Parser, Subcommand};
use log::error;
use native_dialog::{DialogBuilder, MessageLevel};
use pmesh_viewer::app::{run_dump, run_render, run_viewer};
use pmesh_viewer::error::ViewerError;
use pmesh_viewer::io::config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

/// Progressive mesh viewer
#[derive(Parser, Debug)]
#[command(name = "pmesh-viewer", version)]
#[command(about = "Progressive mesh viewer on a software fixed-function pipeline")]
struct Cli {
    /// Config file (TOML). Defaults to viewer.toml when present
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Mesh asset (OBJ), overrides the config
    #[arg(long, value_name = "FILE", global = true)]
    asset: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive viewer (default)
    View,
    /// Render one frame to an image file
    Render {
        #[arg(short, long, default_value = "render.png")]
        output: PathBuf,
        /// Rotation about Y in degrees
        #[arg(long, default_value_t = 0.0)]
        angle: f32,
        /// Face count to request before rendering
        #[arg(long)]
        faces: Option<u32>,
    },
    /// Write the mesh inspector report
    Dump {
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Face count to request before dumping
        #[arg(long, conflicts_with = "source")]
        faces: Option<u32>,
        /// Dump the full-detail mesh as loaded, not the progressive mesh
        #[arg(long)]
        source: bool,
    },
}

fn show_error_dialog(err: &ViewerError) {
    let shown = DialogBuilder::message()
        .set_level(MessageLevel::Error)
        .set_title("Progressive Mesh")
        .set_text(err.to_string())
        .alert()
        .show();
    if let Err(e) = shown {
        error!("Could not show error dialog: {e}");
    }
}

fn run(cli: Cli) -> Result<(), ViewerError> {
    let config = Config::load_or_default(cli.config.as_deref())?;
    let asset = cli
        .asset
        .unwrap_or_else(|| PathBuf::from(&config.scene.asset));

    match cli.command.unwrap_or(Command::View) {
        Command::View => run_viewer(&config, &asset),
        Command::Render {
            output,
            angle,
            faces,
        } => run_render(&config, &asset, &output, angle, faces),
        Command::Dump {
            output,
            faces,
            source,
        } => run_dump(&config, &asset, output, faces, source).map(|_| ()),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Command::View));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            if interactive {
                show_error_dialog(&e);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_faces_conflicts_with_source() {
        let err = Cli::try_parse_from(["pmesh-viewer", "dump", "--source", "--faces", "10"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        let cli = Cli::try_parse_from(["pmesh-viewer", "dump", "--faces", "10"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Dump { faces: Some(10), source: false, .. })
        ));
    }
}
