use crate::config::load_config;
use crate::ir::Dataset;
use crate::layout::compute_layout;
use crate::layout_dump::{write_layout_dump, LayoutDump};
use crate::theme::Theme;
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "psankey", version, about = "Path Sankey layout engine")]
pub struct Args {
    /// Input dataset (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output layout JSON. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (sizing, spacing, alignment)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width override
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height override
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Fixed pixels-per-unit scale instead of fit-to-height
    #[arg(long = "scale")]
    pub scale: Option<f32>,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(scale) = args.scale {
        config.manual_scale = Some(scale);
    }

    let input = read_input(args.input.as_deref())?;
    let dataset: Dataset = json5::from_str(&input)
        .map_err(|err| anyhow::anyhow!("Failed to parse dataset: {err}"))?;

    let theme = Theme::default();
    let layout = compute_layout(&dataset, &theme, &config)?;
    for warning in &layout.warnings {
        eprintln!("warning: {warning}");
    }

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &layout)?,
        None => {
            let dump = LayoutDump::from_layout(&layout);
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &dump)?;
            handle.write_all(b"\n")?;
        }
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
