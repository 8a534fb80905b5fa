use std::io::Write;

use bibsalvage_core::{BibEntry, FieldChange};
use bibsalvage_ingest::Candidate;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the header line after extraction.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    file_name: &str,
    candidates: &[Candidate],
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!("Found {} entries in {}", candidates.len(), file_name);
    if color.enabled() {
        writeln!(w, "{}", line.bold())?;
    } else {
        writeln!(w, "{}", line)?;
    }
    if candidates.is_empty() {
        writeln!(w, "No BibTeX text or embedded bibliography found.")?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print every candidate as BibTeX, each followed by the changes cleanup made.
pub fn print_candidates(
    w: &mut dyn Write,
    candidates: &[Candidate],
    color: ColorMode,
) -> std::io::Result<()> {
    for candidate in candidates {
        let origin = format!("% from {}", candidate.origin);
        if color.enabled() {
            writeln!(w, "{}", origin.dimmed())?;
        } else {
            writeln!(w, "{}", origin)?;
        }
        write!(w, "{}", format_bibtex(&candidate.entry))?;
        for change in &candidate.changes {
            print_change(w, change, color)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Print the change log of a cleanup run, grouped by entry.
pub fn print_change_report(
    w: &mut dyn Write,
    candidates: &[Candidate],
    color: ColorMode,
) -> std::io::Result<()> {
    let mut changed = 0;
    let mut total = 0;

    for candidate in candidates.iter().filter(|c| !c.changes.is_empty()) {
        changed += 1;
        total += candidate.changes.len();
        let key = candidate.entry.citation_key().unwrap_or("<no key>");
        if color.enabled() {
            writeln!(w, "{}", key.bold())?;
        } else {
            writeln!(w, "{}", key)?;
        }
        for change in &candidate.changes {
            print_change(w, change, color)?;
        }
    }

    if changed > 0 {
        writeln!(w)?;
    }
    let summary = format!(
        "{} of {} entries changed ({} field changes)",
        changed,
        candidates.len(),
        total
    );
    if color.enabled() {
        writeln!(w, "{}", summary.dimmed())?;
    } else {
        writeln!(w, "{}", summary)?;
    }
    Ok(())
}

fn print_change(w: &mut dyn Write, change: &FieldChange, color: ColorMode) -> std::io::Result<()> {
    let field = change.field();
    match (change.old_value(), change.new_value()) {
        (old, Some(new)) => {
            let old = old.unwrap_or("<none>");
            if color.enabled() {
                writeln!(w, "  {} {}: {} -> {}", "~".yellow(), field, old.dimmed(), new.green())
            } else {
                writeln!(w, "  ~ {}: {} -> {}", field, old, new)
            }
        }
        (Some(old), None) => {
            if color.enabled() {
                writeln!(w, "  {} {}: {}", "-".red(), field, old.dimmed())
            } else {
                writeln!(w, "  - {}: {}", field, old)
            }
        }
        (None, None) => Ok(()),
    }
}

/// Print candidates as a JSON array.
pub fn print_json(w: &mut dyn Write, candidates: &[Candidate]) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, candidates)?;
    writeln!(w)
}

/// Render an entry as BibTeX.
pub fn format_bibtex(entry: &BibEntry) -> String {
    let mut out = format!(
        "@{}{{{},\n",
        entry.entry_type(),
        entry.citation_key().unwrap_or("")
    );
    for (field, value) in entry.fields() {
        out.push_str(&format!("  {} = {{{}}},\n", field, value));
    }
    for (name, value) in entry.unknown_fields() {
        out.push_str(&format!("  {} = {{{}}},\n", name, value));
    }
    out.push_str("}\n");
    out
}
