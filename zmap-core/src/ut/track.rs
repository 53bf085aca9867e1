// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use colored::*;
use kdam::{Bar, tqdm};

const TAG: &str = "zmap";

/// Local date and time as `YYYY-MM-DD | HH:MM:SS`
fn clock() -> String {
    chrono::Local::now().format("%Y-%m-%d | %H:%M:%S").to_string()
}

/// Prefix `desc` with a bracketed clock and the crate tag
pub fn progress_timestamp(desc: &str) -> String {
    let open = "[".bold();
    let close = "]".bold();
    let tag = TAG.truecolor(69, 143, 194).bold();

    format!("{open} {} {} {tag} {close} {desc}", clock(), "|".bold())
}

/// Progress bar over `n` items counted in `unit`, silent unless `verbose`
pub fn progress_bar(n: usize, desc: &str, unit: &str, verbose: bool) -> Bar {
    if !verbose {
        return tqdm!(disable = true);
    }

    tqdm!(
        total = n,
        unit = unit.to_string(),
        force_refresh = false,
        desc = progress_timestamp(desc),
        bar_format = "{desc suffix=' '}{count}/{total} [{percentage:.0}%] ({rate:.1} {unit}/s, eta: {remaining human=true})"
    )
}

/// Print a timestamped statement when `verbose`
pub fn progress_log(desc: &str, verbose: bool) {
    if verbose {
        println!("{}", progress_timestamp(desc));
    }
}

/// Close a progress bar line and report how many items were processed
pub fn progress_done(count: usize, unit: &str, verbose: bool) {
    if verbose {
        println!();
        progress_log(&format!("Processed {} {}.", thousands_format(count), unit), true);
    }
}

/// Format numbers to readable thousands format
///
/// # Examples
///
/// ```
/// use zmap_core::ut::track::thousands_format;
///
/// assert_eq!(thousands_format(1024), "1,024");
/// assert_eq!(thousands_format(999), "999");
/// ```
pub fn thousands_format<T>(number: T) -> String
where
    T: std::fmt::Display,
{
    let number = number.to_string();
    if number.len() > 3 && number.bytes().all(|b| b.is_ascii_digit()) {
        let digits = number.as_bytes();
        let head = digits.len() % 3;

        let mut groups: Vec<&str> = Vec::with_capacity(digits.len() / 3 + 1);
        if head > 0 {
            groups.push(&number[..head]);
        }
        for start in (head..digits.len()).step_by(3) {
            groups.push(&number[start..start + 3]);
        }

        groups.join(",")
    } else {
        number
    }
}
