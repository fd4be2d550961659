//! Run header and footer printed to stdout

use bitbackup_core::domain::job::RunSummary;
use colored::*;

use crate::config::Config;

const DIVIDER_WIDTH: usize = 109;

fn divider() {
    println!("{}", "=".repeat(DIVIDER_WIDTH).magenta().bold());
}

fn framed(body: impl FnOnce()) {
    println!();
    divider();
    divider();
    println!();
    body();
    println!();
    divider();
    divider();
    println!();
}

pub fn print_header(config: &Config) {
    framed(|| {
        println!("{}", "  Starting Bitbackup!".green().bold());
        println!();
        println!("{}{}", "    User/Team:   ".bold(), config.bitbucket_username);
        println!("{}{}", "    Destination: ".bold(), config.destination());
        println!("{}{}", "    Workers:     ".bold(), config.worker_count);
    });
}

pub fn print_footer(summary: &RunSummary) {
    framed(|| {
        if summary.cancelled {
            println!("{}", "  Bitbackup interrupted!".yellow().bold());
        } else {
            println!("{}", "  Bitbackup finished!".green().bold());
        }
        println!();
        println!("{}{}", "    Repositories: ".bold(), summary.listed);
        println!(
            "{}{}",
            "    Backed up:    ".bold(),
            summary.succeeded.to_string().green()
        );

        let failed = summary.failed.to_string();
        let failed = if summary.failed > 0 {
            failed.red()
        } else {
            failed.normal()
        };
        println!("{}{}", "    Failed:       ".bold(), failed);

        if summary.skipped() > 0 {
            println!(
                "{}{}",
                "    Skipped:      ".bold(),
                summary.skipped().to_string().yellow()
            );
        }
        println!(
            "{}{}s",
            "    Elapsed:      ".bold(),
            summary.elapsed().num_seconds()
        );
    });
}
