use metacpan_client::{Client, Query, Result, ScrollOptions};
use nu_ansi_term::Color::Yellow;
use tracing::{debug, info};

use crate::{
    output::{hit_line, to_json},
    utils::Colored,
};

/// Builds the query for a list of `FIELD=VALUE` terms. A single term is
/// searched as is; several are combined with `all`, or `either` when asked.
pub fn build_query(terms: Vec<(String, String)>, either: bool) -> Result<Query> {
    let mut leaves = terms
        .into_iter()
        .map(|(field, value)| Query::field(field, value))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if leaves.len() == 1 {
        if let Some(leaf) = leaves.pop() {
            return Ok(leaf);
        }
    }

    Ok(if either {
        Query::either(leaves)
    } else {
        Query::all(leaves)
    })
}

pub struct SearchArgs {
    pub doc_type: String,
    pub terms: Vec<(String, String)>,
    pub either: bool,
    pub limit: Option<usize>,
    pub page_size: Option<usize>,
}

pub fn search(client: &Client, args: SearchArgs, json: bool) -> Result<()> {
    let query = build_query(args.terms, args.either)?;
    debug!("search {}: {}", args.doc_type, query.to_dsl());

    let mut options = ScrollOptions::default();
    if let Some(size) = args.page_size {
        options = options.size(size);
    } else if let Some(limit) = args.limit {
        options = options.size(limit.clamp(1, metacpan_client::scroll::DEFAULT_PAGE_SIZE));
    }

    let mut session = client.scroll(&args.doc_type, &query, options)?;
    let limit = args.limit.unwrap_or(usize::MAX);

    let mut shown = 0;
    while shown < limit {
        let Some(hit) = session.next_record()? else {
            break;
        };
        if json {
            println!("{}", to_json(&hit, false)?);
        } else {
            info!("{}", hit_line(&hit));
        }
        shown += 1;
    }

    if !json {
        let total = session
            .total()
            .map_or_else(|| shown.to_string(), |total| total.to_string());
        info!(
            "\n{} of {} {} results",
            Colored(Yellow, shown),
            Colored(Yellow, total),
            args.doc_type
        );
    }

    Ok(())
}
