use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "quadro-desk", version, about = "Evaluation board workspace on disk")]
pub struct Cli {
    /// Config file. Defaults to the platform config dir.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the workspace files.
    #[arg(long, global = true, value_name = "DIR")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List projects (* marks the active one).
    List,
    /// List built-in templates.
    Templates,
    /// Create a project and make it active.
    New {
        #[arg(value_name = "NAME", num_args = 0..)]
        name: Vec<String>,
        /// Built-in template id.
        #[arg(long, short = 't')]
        template: Option<String>,
    },
    /// Switch the active project.
    Select {
        #[arg(value_name = "PROJECT_ID")]
        id: String,
    },
    /// Duplicate the active project as its next version.
    Version,
    /// Delete the active project.
    Delete,
    /// Write the active project as JSON (stdout when no file is given).
    Export {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Import an exported project or a bare row list.
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Replace the active project's content instead of adding a project.
        #[arg(long)]
        overwrite: bool,
    },
}
