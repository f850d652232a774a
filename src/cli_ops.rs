use clap::{Args, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Args)]
#[command(
    about = "Interest commands.",
    long_about = "Link a contact to a property they are interested in, or remove the link."
)]
pub struct InterestArgs {
    #[command(subcommand)]
    pub command: InterestSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum InterestSubcommands {
    #[command(about = "Mark the contact as interested in the property.")]
    Add(InterestLinkArgs),
    #[command(about = "Remove the contact's interest in the property.")]
    Rm(InterestLinkArgs),
}

#[derive(Debug, Args)]
pub struct InterestLinkArgs {
    #[arg(help = "Contact display index from `propbook ls contacts`.")]
    pub contact: usize,

    #[arg(help = "Property name (case-insensitive).")]
    pub property: String,
}

#[derive(Debug, Args)]
#[command(
    about = "Repair one stored record.",
    long_about = "Merge field=value corrections over one stored record and re-validate it. \
Values that parse as JSON (numbers, null, lists) are used as JSON; null clears a field."
)]
pub struct RepairArgs {
    #[arg(help = "Record kind: contact, property or interest.")]
    pub kind: String,

    #[arg(help = "Position in the stored list, as shown by `propbook load`.")]
    pub position: usize,

    #[arg(
        short = 's',
        long = "set",
        value_name = "FIELD=VALUE",
        help = "Correction (repeatable)."
    )]
    pub set: Vec<String>,

    #[arg(long, help = "Count positions from 0 instead of 1.")]
    pub zero_based: bool,

    #[arg(long, help = "Show the outcome without saving.")]
    pub dry_run: bool,

    #[arg(long, help = "Print the outcome as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DiscardArgs {
    #[arg(help = "Record kind: contact, property or interest.")]
    pub kind: String,

    #[arg(help = "Position in the stored list, as shown by `propbook load`.")]
    pub position: usize,

    #[arg(long, help = "Count positions from 0 instead of 1.")]
    pub zero_based: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(help = "File name without extension (defaults to a timestamped name).")]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[arg(short = 'n', long, help = "Show only the newest N commands.")]
    pub limit: Option<usize>,

    #[arg(long, help = "Print JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
#[command(about = "Generate or install shell completions.")]
pub struct CompletionsArgs {
    #[arg(value_enum, help = "Shell to generate for; detected from $SHELL if omitted.")]
    pub shell: Option<Shell>,

    #[arg(
        short = 'i',
        long = "install",
        help = "Write completions to the canonical path for the shell."
    )]
    pub install: bool,
}
