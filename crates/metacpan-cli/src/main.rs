use std::path::Path;

use clap::Parser;
use cli::{Args, Commands};
use logging::setup_logging;
use metacpan_client::{config::Config, search_body, Client, MetaCpanError, Result};
use metacpan_query::compile;
use output::{print_entity, to_json};
use search::{search, SearchArgs};
use serde_json::Value;
use tracing::{debug, info};
use utils::disable_color;

mod cli;
mod logging;
mod output;
mod search;
mod utils;

fn build_client(args: &Args) -> Result<Client> {
    let mut config = match args.config.as_deref() {
        Some(path) => Config::load(Path::new(path))?,
        None => Config::new()?,
    };

    if let Some(domain) = &args.domain {
        config.domain = domain.clone();
        config.base_url = None;
    }
    if let Some(user_agent) = &args.user_agent {
        config.user_agent = Some(user_agent.clone());
    }

    let client = Client::from_config(config)?;
    debug!("using {}", client.base_url());
    Ok(client)
}

fn compile_query(query: &str, body: bool, json: bool) -> Result<()> {
    let node: Value = serde_json::from_str(query)
        .map_err(|err| MetaCpanError::InvalidArgument(format!("query is not valid JSON: {err}")))?;

    let document = if body {
        search_body(&node)?
    } else {
        compile(&node)?
    };

    if json {
        println!("{}", to_json(&document, false)?);
    } else {
        info!("{}", to_json(&document, true)?);
    }
    Ok(())
}

fn handle_cli() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        disable_color();
    }

    let json = args.json;
    let client = || build_client(&args);

    match &args.command {
        Commands::Author { pauseid } => print_entity(&client()?.author(pauseid)?, json)?,
        Commands::Release { name } => print_entity(&client()?.release(name)?, json)?,
        Commands::Module { name } => print_entity(&client()?.module(name)?, json)?,
        Commands::Distribution { name } => print_entity(&client()?.distribution(name)?, json)?,
        Commands::DownloadUrl { module } => {
            print_entity(&client()?.download_url(module)?, json)?
        }
        Commands::Search {
            doc_type,
            terms,
            either,
            limit,
            page_size,
        } => search(
            &client()?,
            SearchArgs {
                doc_type: doc_type.clone(),
                terms: terms.clone(),
                either: *either,
                limit: *limit,
                page_size: *page_size,
            },
            json,
        )?,
        Commands::Compile { query, body } => compile_query(query, *body, json)?,
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
