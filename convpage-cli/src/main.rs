use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use convpage_core::{
    Config, EmojiPreset, MarkupRenderer, archive_to_raw_json, linearize_archive,
    load_archive_value, parse_archive, render_archive_html, render_first_ids,
    split_archive_by_date,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "convpage",
    version,
    about = "Render exported ChatGPT conversation archives as HTML"
)]
struct Cli {
    /// Path to the exported conversations JSON array
    archive: PathBuf,

    /// Output the linearized conversations as JSON instead of HTML
    #[arg(long)]
    raw: bool,

    /// Emit only the conversation markup without the surrounding page
    #[arg(long)]
    fragment: bool,

    /// JSON object mapping asset pointers and attachment ids to file names
    #[arg(long, value_name = "PATH")]
    assets: Option<PathBuf>,

    /// Prefix joined in front of every mapped asset file name
    #[arg(long, value_name = "URL")]
    asset_base: Option<String>,

    /// Directory holding uploaded attachments, used when the map has no entry
    #[arg(long, value_name = "DIR")]
    uploads: Option<String>,

    /// Decorative emoji to strip: standard, extended or keep
    #[arg(long, value_name = "PRESET")]
    emoji: Option<EmojiPreset>,

    /// Write messages_<date>.json files grouped by UTC date into DIR
    #[arg(long, value_name = "DIR")]
    split_by_date: Option<PathBuf>,

    /// Print the earliest message id for every date
    #[arg(long)]
    first_ids: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> convpage_core::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(assets) = cli.assets {
        config.asset_map = Some(assets);
    }
    if let Some(base) = cli.asset_base {
        config.asset_base = Some(base);
    }
    if let Some(uploads) = cli.uploads {
        config.uploads_dir = Some(uploads);
    }
    if let Some(emoji) = cli.emoji {
        config.emoji = emoji;
    }

    let value = load_archive_value(&cli.archive)?;

    if let Some(dir) = &cli.split_by_date {
        let written = split_archive_by_date(&value, dir)?;
        for path in written {
            println!("{}", path.display());
        }
        return Ok(());
    }

    if cli.first_ids {
        print!("{}", render_first_ids(&value));
        return Ok(());
    }

    let archive = parse_archive(&cli.archive, value)?;

    if cli.raw {
        let views = linearize_archive(&archive)?;
        let raw_json = archive_to_raw_json(&views)?;
        println!("{raw_json}");
        return Ok(());
    }

    let resolver = config.asset_resolver()?;
    let markup = MarkupRenderer::new(config.markup_options());
    let html = render_archive_html(&archive, markup, &resolver, cli.fragment)?;
    print!("{html}");

    Ok(())
}
