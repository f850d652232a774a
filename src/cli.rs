use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand};

pub use crate::cli_ops::*;

pub const BIN_NAME: &str = "propbook";

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "propbook")]
#[command(bin_name = "propbook")]
#[command(version)]
#[command(about = "A contact and property book that survives partially-corrupt data")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'C',
        long = "root",
        env = "PROPBOOK_ROOT",
        default_value = ".",
        global = true,
        help = "Directory that relative paths resolve against."
    )]
    pub root: PathBuf,

    #[arg(
        long,
        env = "PROPBOOK_CONFIG",
        global = true,
        help = "Config file (defaults to <root>/propbook.toml)."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'd',
        long = "data",
        env = "PROPBOOK_DATA",
        global = true,
        help = "Data file, overriding data_file from the config."
    )]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Write an empty or sample store.")]
    Init(InitArgs),
    #[command(about = "Reconcile the store and report invalid or duplicate records.")]
    Load(LoadArgs),
    #[command(about = "List valid records with their display indexes.")]
    Ls(ListArgs),
    #[command(about = "Add a contact.")]
    AddContact(AddContactArgs),
    #[command(about = "Add a property.")]
    AddProperty(AddPropertyArgs),
    #[command(about = "Edit the contact at a display index.")]
    EditContact(EditContactArgs),
    #[command(about = "Edit the property at a display index.")]
    EditProperty(EditPropertyArgs),
    #[command(about = "Delete the contact at a display index.")]
    DeleteContact(DeleteArgs),
    #[command(about = "Delete the property at a display index.")]
    DeleteProperty(DeleteArgs),
    #[command(about = "Link or unlink a contact's interest in a property.")]
    Interest(InterestArgs),
    #[command(about = "Correct fields of one stored record by document position.")]
    Repair(RepairArgs),
    #[command(about = "Drop one stored record by document position.")]
    Discard(DiscardArgs),
    #[command(about = "Export valid contacts and properties to CSV.")]
    Export(ExportArgs),
    #[command(about = "Show recorded command lines.")]
    History(HistoryArgs),
    #[command(about = "Generate or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(short = 's', long, help = "Seed the store with sample records.")]
    pub sample: bool,

    #[arg(short = 'f', long, help = "Overwrite an existing store.")]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    #[arg(long, help = "Print the report as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(
        default_value = "contacts",
        help = "What to list: contacts, properties or interests."
    )]
    pub kind: String,

    #[arg(
        short = 'n',
        long = "name",
        num_args = 1..,
        value_name = "KEYWORD",
        conflicts_with = "tag",
        help = "Only contacts with a name word equal to any keyword (case-insensitive)."
    )]
    pub name: Vec<String>,

    #[arg(short = 't', long, help = "Only contacts carrying this tag (case-insensitive).")]
    pub tag: Option<String>,

    #[arg(long, help = "Print JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AddContactArgs {
    #[arg(short = 'n', long, help = "Contact name.")]
    pub name: String,

    #[arg(short = 'p', long, help = "Phone number (digits only).")]
    pub phone: String,

    #[arg(short = 'e', long, help = "Email address.")]
    pub email: String,

    #[arg(short = 'a', long, help = "Postal address.")]
    pub address: String,

    #[arg(short = 'l', long, help = "Listing type, for example Condo or HDB.")]
    pub listing: Option<String>,

    #[arg(short = 't', long = "tag", help = "Tag (repeatable).")]
    pub tags: Vec<String>,

    #[arg(long, help = "Print the saved contact as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct EditContactArgs {
    #[arg(help = "Display index from `propbook ls contacts`.")]
    pub index: usize,

    #[arg(short = 'n', long, help = "New name; interest links follow the rename.")]
    pub name: Option<String>,

    #[arg(short = 'p', long, help = "New phone number.")]
    pub phone: Option<String>,

    #[arg(short = 'e', long, help = "New email address.")]
    pub email: Option<String>,

    #[arg(short = 'a', long, help = "New postal address.")]
    pub address: Option<String>,

    #[arg(
        short = 'l',
        long,
        conflicts_with = "clear_listing",
        help = "New listing type."
    )]
    pub listing: Option<String>,

    #[arg(long, help = "Remove the listing type.")]
    pub clear_listing: bool,

    #[arg(
        short = 't',
        long = "tag",
        help = "Replace all tags (repeatable); see --clear-tags."
    )]
    pub tags: Vec<String>,

    #[arg(long, conflicts_with = "tags", help = "Remove all tags.")]
    pub clear_tags: bool,

    #[arg(long, help = "Print the saved contact as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AddPropertyArgs {
    #[arg(short = 'n', long, help = "Property name.")]
    pub name: String,

    #[arg(short = 'a', long, help = "Property address.")]
    pub address: String,

    #[arg(short = 'p', long, help = "Asking price, a positive whole number.")]
    pub price: String,

    #[arg(long, help = "Print the saved property as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct EditPropertyArgs {
    #[arg(help = "Display index from `propbook ls properties`.")]
    pub index: usize,

    #[arg(short = 'n', long, help = "New name; interest links follow the rename.")]
    pub name: Option<String>,

    #[arg(short = 'a', long, help = "New address.")]
    pub address: Option<String>,

    #[arg(short = 'p', long, help = "New price.")]
    pub price: Option<String>,

    #[arg(long, help = "Print the saved property as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(help = "Display index from `propbook ls`.")]
    pub index: usize,
}
