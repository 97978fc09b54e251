use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const HELP: &str = "VibeCheck - sentiment analysis for social posts from the terminal.

  --version, -V          Show version and exit
  --help,    -h          Show this help message
  --reset                Clear saved session state and exit
  --analyze <link>       Analyze a Twitter/X, Reddit or YouTube link and print a summary";

fn main() {
    if handle_cli_flags() {
        return;
    }

    if let Err(err) = vibecheck::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("VibeCheck {}", vibecheck::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!("{HELP}");
                saw_flag = true;
            }
            "--reset" => {
                saw_flag = true;
                if let Err(err) = vibecheck::app::reset() {
                    eprintln!("Reset failed: {err:?}");
                    std::process::exit(1);
                }
                println!("Saved session state cleared.");
            }
            "--analyze" => {
                saw_flag = true;
                let Some(link) = args.next() else {
                    eprintln!("--analyze needs a link\n\n{HELP}");
                    std::process::exit(2);
                };
                if let Err(err) = analyze_once(&link) {
                    eprintln!("Analysis failed: {err}");
                    std::process::exit(1);
                }
            }
            _ => {}
        }
    }
    saw_flag
}

fn analyze_once(link: &str) -> anyhow::Result<()> {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Analyzing {link}…"));
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = vibecheck::app::analyze(link);
    pb.finish_and_clear();

    let (stored, _log_guard) = result?;
    print!("{}", vibecheck::app::summary(&stored));
    Ok(())
}
