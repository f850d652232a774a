mod app;
mod cli;
mod cli_ops;
mod completions;
mod config;
mod document;
mod domain;
mod export;
mod history;
mod reconcile;
mod record;
mod repair;
mod sample;
mod store;
mod ui;

fn main() {
    init_logging();
    if let Err(err) = run() {
        tracing::debug!(code = err.code(), "command failed");
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env("PROPBOOK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn print_json(value: &impl serde::Serialize) -> Result<(), app::AppError> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{text}");
    Ok(())
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell, args.install);
    }

    let config = config::Config::load(&cli.root, cli.config.as_deref())?
        .with_data_file(&cli.root, cli.data.as_deref());
    tracing::debug!(data_file = %config.data_file.display(), "resolved config");

    let records_history = records_history(&cli.command);
    dispatch(cli.command, &config)?;
    if records_history {
        record_history(&config, &command_line(std::env::args().skip(1)));
    }
    Ok(())
}

fn dispatch(command: cli::Commands, config: &config::Config) -> Result<(), app::AppError> {
    use cli::{Commands, InterestSubcommands};

    match &command {
        Commands::Init(args) => {
            let path = app::init_store(config, args.sample, args.force)?;
            let contents = if args.sample { "sample" } else { "empty" };
            println!("wrote {contents} store to {}", path.display());
            return Ok(());
        }
        Commands::History(args) => {
            let entries = app::recent_history(config, args.limit)?;
            if args.json {
                print_json(&entries)?;
            } else {
                ui::print_history(&entries);
            }
            return Ok(());
        }
        Commands::Completions(_) => return Ok(()),
        _ => {}
    }

    let mut app = app::App::open(config.clone())?;
    match command {
        Commands::Load(args) => {
            let report = app.load_report();
            if args.json {
                print_json(&report)?;
            } else {
                ui::print_load_report(&report);
            }
        }
        Commands::Ls(args) => list(&app, &args)?,
        Commands::AddContact(args) => {
            let contact = app.add_contact(app::ContactInput {
                name: args.name,
                phone: args.phone,
                email: args.email,
                address: args.address,
                listing: args.listing,
                tags: args.tags,
            })?;
            if args.json {
                print_json(&contact)?;
            } else {
                println!("added contact {}. {}", contact.index, contact.name);
            }
        }
        Commands::EditContact(args) => {
            let tags = if args.clear_tags {
                Some(Vec::new())
            } else if args.tags.is_empty() {
                None
            } else {
                Some(args.tags)
            };
            let contact = app.edit_contact(
                args.index,
                app::ContactPatch {
                    name: args.name,
                    phone: args.phone,
                    email: args.email,
                    address: args.address,
                    listing: args.listing,
                    clear_listing: args.clear_listing,
                    tags,
                },
            )?;
            if args.json {
                print_json(&contact)?;
            } else {
                println!("edited contact {}. {}", contact.index, contact.name);
            }
        }
        Commands::DeleteContact(args) => {
            let contact = app.delete_contact(args.index)?;
            println!("deleted contact {}", contact.name);
        }
        Commands::AddProperty(args) => {
            let change = app.add_property(app::PropertyInput {
                property_name: args.name,
                address: args.address,
                price: args.price,
            })?;
            report_property_change("added", &change, args.json)?;
        }
        Commands::EditProperty(args) => {
            let change = app.edit_property(
                args.index,
                app::PropertyPatch {
                    property_name: args.name,
                    address: args.address,
                    price: args.price,
                },
            )?;
            report_property_change("edited", &change, args.json)?;
        }
        Commands::DeleteProperty(args) => {
            let property = app.delete_property(args.index)?;
            println!("deleted property {}", property.property_name);
        }
        Commands::Interest(args) => match args.command {
            InterestSubcommands::Add(link) => {
                let interest = app.link_interest(link.contact, &link.property)?;
                println!("linked {} -> {}", interest.contact, interest.property);
            }
            InterestSubcommands::Rm(link) => {
                let removed = app.unlink_interest(link.contact, &link.property)?;
                println!("removed {removed} interest link(s)");
            }
        },
        Commands::Repair(args) => {
            let kind = args.kind.parse::<record::RecordKind>()?;
            let position = repair::RecordPosition::from_user(args.position, args.zero_based)?;
            let corrections = repair::Corrections::from_assignments(&args.set)?;
            let outcome = app.repair(kind, position, &corrections, args.dry_run)?;
            if args.json {
                print_json(&outcome)?;
            } else {
                ui::print_repair_outcome(&outcome, args.dry_run);
            }
        }
        Commands::Discard(args) => {
            let kind = args.kind.parse::<record::RecordKind>()?;
            let position = repair::RecordPosition::from_user(args.position, args.zero_based)?;
            let outcome = app.discard(kind, position)?;
            println!(
                "discarded {} #{} {}",
                outcome.kind,
                position.display(),
                outcome.rendered
            );
            if outcome.removed_edges > 0 {
                println!("removed {} orphaned interest link(s)", outcome.removed_edges);
            }
        }
        Commands::Export(args) => {
            let summary = app.export(args.name.as_deref())?;
            println!(
                "exported {} contact(s) and {} propert(ies) to {}",
                summary.contacts,
                summary.properties,
                summary.path.display()
            );
        }
        Commands::Init(_) | Commands::History(_) | Commands::Completions(_) => {}
    }
    tracing::debug!(path = %app.data_path().display(), "command finished");
    Ok(())
}

fn list(app: &app::App, args: &cli::ListArgs) -> Result<(), app::AppError> {
    let json = args.json;
    let filter = app::ContactFilter::from_flags(&args.name, args.tag.as_deref())?;
    let kind = args.kind.parse::<record::RecordKind>()?;
    if kind != record::RecordKind::Contact && filter != app::ContactFilter::All {
        return Err(app::AppError::InvalidArgument(
            "--name and --tag only filter contacts".to_string(),
        ));
    }
    match kind {
        record::RecordKind::Contact => {
            let contacts = app.find_contacts(&filter);
            if json {
                print_json(&contacts)?;
            } else {
                ui::print_contacts(&contacts);
            }
        }
        record::RecordKind::Property => {
            let properties = app.list_properties();
            if json {
                print_json(&properties)?;
            } else {
                ui::print_properties(&properties);
            }
        }
        record::RecordKind::Interest => {
            let interests = app.list_interests();
            if json {
                print_json(&interests)?;
            } else {
                ui::print_interests(&interests);
            }
        }
    }
    Ok(())
}

fn report_property_change(
    verb: &str,
    change: &app::PropertyChange,
    json: bool,
) -> Result<(), app::AppError> {
    if json {
        return print_json(change);
    }
    println!(
        "{verb} property {}. {}",
        change.property.index, change.property.property_name
    );
    if let Some(warning) = change.warning.as_deref() {
        let palette = ui::Palette::auto();
        eprintln!("{}", palette.warn(warning));
    }
    Ok(())
}

/// `history` and `completions` invocations are not worth remembering.
fn records_history(command: &cli::Commands) -> bool {
    !matches!(
        command,
        cli::Commands::History(_) | cli::Commands::Completions(_)
    )
}

fn command_line(args: impl IntoIterator<Item = String>) -> String {
    args.into_iter()
        .map(|arg| {
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                format!("\"{}\"", arg.replace('"', "\\\""))
            } else {
                arg
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn record_history(config: &config::Config, command: &str) {
    if let Err(err) = app::history_log(config).record(command) {
        tracing::warn!(error = %err, "could not record command history");
    }
}
