use std::io::{self, IsTerminal};

use crate::app::{ContactView, InterestView, LoadReport, PropertyView};
use crate::history::HistoryEntry;
use crate::reconcile::{InvalidRecordReport, Status};
use crate::record::FieldViolation;
use crate::repair::RepairOutcome;

pub fn print_load_report(report: &LoadReport) {
    let palette = Palette::auto();
    println!(
        "{} {}",
        palette.heading("Loaded"),
        palette.dim(&report.path.display().to_string())
    );
    for summary in &report.summary {
        let mut line = format!(
            "  {:<11} {} valid",
            summary.kind.section(),
            palette.ok(&summary.valid.to_string())
        );
        if summary.invalid > 0 {
            line.push_str(&format!(", {} invalid", palette.error(&summary.invalid.to_string())));
        }
        println!("{line}");
    }

    if !report.invalid.is_empty() {
        println!();
        println!("{}", palette.heading("Invalid records"));
        for record in &report.invalid {
            for line in format_invalid_record(record, &palette) {
                println!("{line}");
            }
        }
        println!(
            "{}",
            palette.dim("fix with `propbook repair <kind> <position> --set field=value`")
        );
    }

    if !report.duplicates.is_empty() {
        println!();
        println!("{}", palette.heading("Duplicates"));
        for group in &report.duplicates {
            let positions = group
                .positions
                .iter()
                .map(|position| (position + 1).to_string())
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  {} '{}' at positions {}",
                palette.warn(group.kind.as_str()),
                group.key,
                positions
            );
        }
    }
}

fn format_invalid_record(record: &InvalidRecordReport, palette: &Palette) -> Vec<String> {
    let mut lines = vec![format!(
        "  {} #{} {}",
        palette.error(record.kind.as_str()),
        record.position + 1,
        palette.dim(&record.rendered)
    )];
    lines.extend(
        record
            .violations
            .iter()
            .map(|violation| format!("    - {}", format_violation(violation))),
    );
    lines
}

fn format_violation(violation: &FieldViolation) -> String {
    format!("{}: {}", violation.field, violation.message)
}

pub fn print_contacts(contacts: &[ContactView]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Contacts"));
    if contacts.is_empty() {
        println!("{}", palette.dim("no contacts"));
        return;
    }
    for contact in contacts {
        println!("{}", format_contact_row(contact, &palette));
    }
    println!("{}", palette.dim(&format!("{} contact(s)", contacts.len())));
}

fn format_contact_row(contact: &ContactView, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} {} {} {}",
        palette.id(&format!("{}.", contact.index)),
        contact.name,
        contact.phone,
        contact.email,
        palette.dim(&contact.address)
    );
    if let Some(listing) = contact.listing.as_deref() {
        line.push(' ');
        line.push_str(&palette.label(&format!("({listing})")));
    }
    if !contact.tags.is_empty() {
        line.push(' ');
        line.push_str(&palette.tags(&format!("#{}", contact.tags.join(" #"))));
    }
    if !contact.interested_in.is_empty() {
        line.push_str(&format!(" -> {}", contact.interested_in.join(", ")));
    }
    line
}

pub fn print_properties(properties: &[PropertyView]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Properties"));
    if properties.is_empty() {
        println!("{}", palette.dim("no properties"));
        return;
    }
    for property in properties {
        println!("{}", format_property_row(property, &palette));
    }
    println!(
        "{}",
        palette.dim(&format!("{} propert(ies)", properties.len()))
    );
}

fn format_property_row(property: &PropertyView, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} ${} {}",
        palette.id(&format!("{}.", property.index)),
        property.property_name,
        group_thousands(property.price),
        palette.dim(&property.address)
    );
    if !property.interested_contacts.is_empty() {
        line.push_str(&format!(" <- {}", property.interested_contacts.join(", ")));
    }
    line
}

pub fn print_interests(interests: &[InterestView]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Interests"));
    if interests.is_empty() {
        println!("{}", palette.dim("no interests"));
        return;
    }
    for interest in interests {
        println!(
            "{} {} -> {}",
            palette.id(&format!("{}.", interest.index)),
            interest.contact,
            interest.property
        );
    }
}

pub fn print_repair_outcome(outcome: &RepairOutcome, dry_run: bool) {
    let palette = Palette::auto();
    let verb = if dry_run { "would repair" } else { "repaired" };
    println!(
        "{} {} #{}: {} -> {}",
        verb,
        outcome.kind,
        outcome.position + 1,
        palette.status(outcome.before),
        palette.status(outcome.after)
    );
    println!("  {}", palette.dim(&outcome.rendered));
    for violation in &outcome.violations {
        println!("    - {}", format_violation(violation));
    }
    if outcome.reresolved_edges > 0 {
        println!(
            "{}",
            palette.dim(&format!(
                "{} interest edge(s) re-checked",
                outcome.reresolved_edges
            ))
        );
    }
}

pub fn print_history(entries: &[HistoryEntry]) {
    let palette = Palette::auto();
    if entries.is_empty() {
        println!("{}", palette.dim("no history"));
        return;
    }
    for (index, entry) in entries.iter().enumerate() {
        println!(
            "{} {} {}",
            palette.id(&format!("{:>3}", index + 1)),
            palette.dim(&entry.recorded_at),
            entry.command
        );
    }
}

fn group_thousands(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (offset, ch) in digits.chars().enumerate() {
        if offset > 0 && (digits.len() - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    pub fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    pub fn ok(&self, text: &str) -> String {
        self.paint("32", text)
    }

    pub fn warn(&self, text: &str) -> String {
        self.paint("33", text)
    }

    pub fn error(&self, text: &str) -> String {
        self.paint("31", text)
    }

    fn label(&self, text: &str) -> String {
        self.paint("35", text)
    }

    fn tags(&self, text: &str) -> String {
        self.paint("90", text)
    }

    fn status(&self, status: Status) -> String {
        let upper = status.as_str().to_ascii_uppercase();
        match status {
            Status::Valid => self.ok(&format!("[{upper}]")),
            Status::Invalid => self.error(&format!("[{upper}]")),
        }
    }
}

#[cfg(test)]
#[path = "ui_tests_ext.rs"]
mod tests_ext;
