use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "odia-annotator")]
#[command(about = "Odia OCR ground-truth annotation tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Annotation backend address (overrides the config file)
    #[arg(long, global = true)]
    pub backend_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the images and annotations known to the backend
    List,

    /// Upload image files or folders
    Upload {
        /// Image files and/or folders
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Scan subfolders too
        #[arg(short = 'r', long)]
        recursive: bool,

        /// Downscale images whose longer side exceeds this many pixels
        #[arg(long)]
        max_size: Option<u32>,
    },

    /// Run OCR on loaded images
    Ocr {
        /// Images to process (default: every loaded image)
        images: Vec<String>,

        /// Gemini API key (default: GEMINI_API_KEY or the config file)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Save the validated text of one image
    Save {
        /// Image filename
        #[arg(required = true)]
        image: String,

        /// Validated text
        #[arg(short, long, conflicts_with = "text_file", required_unless_present = "text_file")]
        text: Option<String>,

        /// Read the validated text from a file
        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Treat the text as Latin keys typed on the Odia keyboard
        #[arg(long)]
        latin: bool,
    },

    /// Load a dataset CSV (image_filename, extracted_text, validated_text)
    ImportCsv {
        /// CSV file
        #[arg(required = true)]
        file: PathBuf,

        /// Backend folder the CSV's image names refer to
        #[arg(long)]
        image_folder: Option<String>,
    },

    /// Export the annotations as a dataset file
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output file or directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Let the backend build the CSV
        #[arg(long)]
        remote: bool,
    },

    /// Print the Odia virtual keyboard
    Keyboard,

    /// Review and correct images interactively
    Annotate {
        /// Gemini API key for OCR runs
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Show or edit settings
    Config {
        /// Store the Gemini API key
        #[arg(long)]
        set_api_key: Option<String>,

        /// Store the backend address
        #[arg(long)]
        set_backend_url: Option<String>,

        /// Print the settings
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}
