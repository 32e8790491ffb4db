//! doclayout CLI - layout reconstruction from text fragment dumps

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use doclayout::layout::HeaderFooterDetector;
use doclayout::render::{self, JsonFormat, RenderOptions};
use doclayout::{load_pages, AnalysisResult, Analyzer, AnalyzerConfig, ElementType, Page};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "doclayout")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Reconstruct document layout from positioned text fragments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the layout as Markdown
    #[command(alias = "md")]
    Markdown {
        /// Input fragment dump (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Maximum heading level (1-6)
        #[arg(long, default_value = "6")]
        max_heading: u8,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Extract plain text in reading order
    Text {
        /// Input fragment dump (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Dump the full analysis as JSON
    Json {
        /// Input fragment dump (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Show layout statistics
    Info {
        /// Input fragment dump (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Show version information
    Version,
}

/// Options shared by every analysis command.
#[derive(Args)]
struct AnalysisArgs {
    /// Analyze a single page (1-indexed)
    #[arg(long, value_name = "N")]
    page: Option<usize>,

    /// Skip heading detection
    #[arg(long)]
    no_headings: bool,

    /// Skip list detection
    #[arg(long)]
    no_lists: bool,

    /// Build paragraphs from raw lines instead of reading order sections
    #[arg(long)]
    no_reading_order: bool,

    /// Only detect columns, reading order and paragraphs
    #[arg(long)]
    quick: bool,

    /// Remove running headers and footers before analysis
    #[arg(long)]
    filter_headers: bool,

    /// Analyzer configuration file (JSON); flags override it
    #[arg(long, value_name = "FILE", env = "DOCLAYOUT_CONFIG")]
    config: Option<PathBuf>,
}

impl AnalysisArgs {
    fn config(&self) -> CliResult<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_str::<AnalyzerConfig>(&fs::read_to_string(path)?)?,
            None => AnalyzerConfig::new(),
        };
        if self.no_headings {
            config = config.with_headings(false);
        }
        if self.no_lists {
            config = config.with_lists(false);
        }
        if self.no_reading_order {
            config = config.with_reading_order(false);
        }
        Ok(config)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Markdown {
            input,
            output,
            max_heading,
            analysis,
        } => cmd_markdown(&input, output.as_deref(), max_heading, &analysis),
        Commands::Text {
            input,
            output,
            analysis,
        } => cmd_text(&input, output.as_deref(), &analysis),
        Commands::Json {
            input,
            output,
            compact,
            analysis,
        } => cmd_json(&input, output.as_deref(), compact, &analysis),
        Commands::Info { input, analysis } => cmd_info(&input, &analysis),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Load the dump and analyze the selected pages.
fn analyze(input: &Path, args: &AnalysisArgs) -> CliResult<Vec<AnalysisResult>> {
    let mut pages = load_pages(input)?;
    let config = args.config()?;

    if args.filter_headers {
        let regions = HeaderFooterDetector::with_config(config.header_footer.clone()).detect(&pages);
        log::info!(
            "{} header/footer regions across {} pages",
            regions.region_count(),
            pages.len()
        );
        pages = regions.filter_pages(&pages);
    }

    let selected: Vec<&Page> = match args.page {
        Some(n) => {
            let page = n
                .checked_sub(1)
                .and_then(|i| pages.get(i))
                .ok_or(doclayout::Error::PageOutOfRange(n, pages.len()))?;
            vec![page]
        }
        None => pages.iter().collect(),
    };

    let analyzer = Analyzer::with_config(config);
    let pb = progress_bar(selected.len());
    let results = selected
        .into_iter()
        .map(|page| {
            pb.set_message(format!("Page {}", page.number));
            let result = if args.quick {
                let mut result = analyzer.quick_analyze(&page.fragments, page.width, page.height);
                result.page_number = page.number;
                result
            } else {
                analyzer.analyze_page(page)
            };
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_and_clear();

    Ok(results)
}

fn progress_bar(len: usize) -> ProgressBar {
    if len < 2 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn write_output(output: Option<&Path>, content: &str) -> CliResult<()> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_markdown(input: &Path, output: Option<&Path>, max_heading: u8, args: &AnalysisArgs) -> CliResult<()> {
    let results = analyze(input, args)?;
    let options = RenderOptions::new().with_max_heading(max_heading);
    write_output(output, &render::to_markdown_pages(&results, &options))
}

fn cmd_text(input: &Path, output: Option<&Path>, args: &AnalysisArgs) -> CliResult<()> {
    let results = analyze(input, args)?;
    write_output(output, &render::to_text_pages(&results))
}

fn cmd_json(input: &Path, output: Option<&Path>, compact: bool, args: &AnalysisArgs) -> CliResult<()> {
    let results = analyze(input, args)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = match results.as_slice() {
        [single] if args.page.is_some() => render::to_json(single, format)?,
        all => render::to_json(all, format)?,
    };
    write_output(output, &json)
}

fn cmd_info(input: &Path, args: &AnalysisArgs) -> CliResult<()> {
    let results = analyze(input, args)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), results.len());

    let sum = |f: fn(&AnalysisResult) -> usize| results.iter().map(f).sum::<usize>();
    let multi_column = results.iter().filter(|r| r.is_multi_column()).count();

    println!();
    println!("{}", "Layout Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Fragments".bold(), sum(|r| r.stats.fragment_count));
    println!("{}: {}", "Multi-column pages".bold(), multi_column);
    println!("{}: {}", "Lines".bold(), sum(|r| r.stats.line_count));
    println!("{}: {}", "Blocks".bold(), sum(|r| r.stats.block_count));
    println!("{}: {}", "Paragraphs".bold(), sum(|r| r.stats.paragraph_count));
    println!("{}: {}", "Headings".bold(), sum(|r| r.stats.heading_count));
    println!(
        "{}: {} ({} items)",
        "Lists".bold(),
        sum(|r| r.stats.list_count),
        sum(|r| r.stats.list_item_count)
    );
    println!("{}: {}", "Elements".bold(), sum(|r| r.stats.element_count));

    let headings: Vec<_> = results
        .iter()
        .flat_map(|r| r.elements_of_type(ElementType::Heading))
        .filter_map(|e| e.as_heading())
        .collect();
    if !headings.is_empty() {
        println!();
        println!("{}", "Outline".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for heading in headings {
            let indent = "  ".repeat(heading.level.as_number() as usize - 1);
            println!("{}{} {}", indent, heading.level.to_string().dimmed(), heading.text());
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "doclayout".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document layout reconstruction tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/doclayout".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(config: Option<PathBuf>) -> AnalysisArgs {
        AnalysisArgs {
            page: None,
            no_headings: false,
            no_lists: true,
            no_reading_order: false,
            quick: false,
            filter_headers: false,
            config,
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"detect_headings": false, "detect_lists": true}"#)
            .unwrap();

        let config = args(Some(file.path().to_path_buf())).config().unwrap();
        assert!(!config.detect_headings);
        assert!(!config.detect_lists);
        assert!(config.use_reading_order);
    }

    #[test]
    fn test_page_out_of_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"width": 612, "height": 792, "fragments": []}]"#)
            .unwrap();

        let mut selection = args(None);
        selection.page = Some(2);
        let err = analyze(file.path(), &selection).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "doclayout",
            "markdown",
            "in.json",
            "--page",
            "2",
            "--no-lists",
            "--max-heading",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Markdown {
                max_heading,
                analysis,
                ..
            } => {
                assert_eq!(max_heading, 3);
                assert_eq!(analysis.page, Some(2));
                assert!(analysis.no_lists);
            }
            _ => panic!("expected markdown command"),
        }
    }
}
