//! Marten CLI
//!
//! Renders an HTML file to a PNG screenshot, or prints the document tree,
//! the layout tree or the display list for debugging.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use owo_colors::OwoColorize;

use marten_browser::{Page, PageConfig, save_png};
use marten_common::warning::warn_once;
use marten_css::BoxId;
use marten_html::{HTMLParser, print_tree};

/// Marten: a small HTML/CSS renderer
#[derive(Parser, Debug)]
#[command(name = "marten")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the DOM tree
    marten page.html

    # Take a screenshot
    marten page.html --output page.png

    # Extra style sheets and a narrow viewport
    marten page.html --css base.css --css theme.css --width 480 -o out.png

    # Layout tree as JSON
    marten page.html --dump layout --json
"#)]
struct Cli {
    /// Path to the HTML file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Extra style sheet, applied after the document's own (repeatable)
    #[arg(long, value_name = "FILE")]
    css: Vec<PathBuf>,

    /// Viewport width
    #[arg(long, default_value = "1000")]
    width: u32,

    /// Viewport height
    #[arg(long, default_value = "800")]
    height: u32,

    /// Pixels added to every font size
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    zoom: f32,

    /// Save a screenshot of the first screen (PNG format)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print one of the pipeline's intermediate trees
    #[arg(long, value_enum)]
    dump: Option<Dump>,

    /// Print the layout dump as JSON
    #[arg(long)]
    json: bool,

    /// Print average render and composite times
    #[arg(long)]
    timing: bool,
}

/// Which tree `--dump` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Dump {
    /// The parsed document, with parse issues
    Dom,
    /// The box tree with geometry
    Layout,
    /// The paint commands
    Display,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let html = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read '{}'", cli.file.display()))?;

    let config = PageConfig {
        viewport_width: cli.width as f32,
        viewport_height: cli.height as f32,
        font_size_delta: cli.zoom,
        ..PageConfig::default()
    };
    let mut page = Page::new(&html, config);

    let base = cli.file.parent().unwrap_or_else(|| Path::new("."));
    for href in page.linked_stylesheet_hrefs() {
        match fs::read_to_string(base.join(&href)) {
            Ok(css) => page.add_stylesheet(&css),
            Err(e) => warn_once("CLI", &format!("skipping style sheet '{href}': {e}")),
        }
    }
    for path in &cli.css {
        let css = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        page.add_stylesheet(&css);
    }

    page.render().context("render failed")?;

    match cli.dump {
        Some(Dump::Dom) => print_document(&html),
        Some(Dump::Layout) if cli.json => {
            let dump = page.layout().dump(BoxId::ROOT);
            println!("{}", serde_json::to_string_pretty(&dump)?);
        }
        Some(Dump::Layout) => {
            println!("{}", "=== Layout Tree ===".bold());
            print!("{}", page.layout());
        }
        Some(Dump::Display) => {
            println!("{}", "=== Display List ===".bold());
            print!("{}", page.display_list());
        }
        None if cli.output.is_none() => print_document(&html),
        None => {}
    }

    if let Some(ref output_path) = cli.output {
        let pixmap = page.raster_viewport(0.0).context("raster failed")?;
        save_png(&pixmap, output_path)?;
        println!(
            "{} {}",
            "Screenshot saved to:".green(),
            output_path.display()
        );
    }

    if cli.timing {
        for line in page.timing_report() {
            println!("{}", line.dimmed());
        }
    }

    Ok(())
}

/// Print the DOM tree and any parse issues.
fn print_document(html: &str) {
    let (tree, issues) = HTMLParser::new(html).run_with_issues();
    println!("{}", "=== DOM Tree ===".bold());
    print_tree(&tree, tree.root(), 0);

    if !issues.is_empty() {
        println!("\n{}", "=== Parse Issues ===".bold());
        for issue in &issues {
            println!("  - {} (at {})", issue.message.yellow(), issue.offset);
        }
    }
}
