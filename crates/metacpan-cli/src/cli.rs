use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::utils::parse_term;

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Override the API domain
    #[arg(required = false, long, short = 'D', global = true)]
    pub domain: Option<String>,

    /// Set user agent
    #[arg(required = false, long, short = 'A', global = true)]
    pub user_agent: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show an author by PAUSE id
    #[command(arg_required_else_help = true)]
    Author {
        #[arg(required = true)]
        pauseid: String,
    },

    /// Show the latest release of a distribution
    #[command(arg_required_else_help = true)]
    Release {
        /// Distribution name, or AUTHOR/Release-Name-1.0 for a specific release
        #[arg(required = true)]
        name: String,
    },

    /// Show the file providing a module
    #[command(arg_required_else_help = true)]
    #[clap(name = "module", visible_alias = "m")]
    Module {
        #[arg(required = true)]
        name: String,
    },

    /// Show a distribution
    #[command(arg_required_else_help = true)]
    Distribution {
        #[arg(required = true)]
        name: String,
    },

    /// Print where to download the release providing a module
    #[command(arg_required_else_help = true)]
    DownloadUrl {
        #[arg(required = true)]
        module: String,
    },

    /// Search documents of a type
    #[command(arg_required_else_help = true)]
    #[clap(name = "search", visible_alias = "s")]
    Search {
        /// Document type, e.g. release, author, module
        #[arg(required = true)]
        doc_type: String,

        /// Match terms; `*` and `?` in a value make it a wildcard match
        #[arg(required = true, value_name = "FIELD=VALUE", value_parser = parse_term)]
        terms: Vec<(String, String)>,

        /// Match any term instead of all of them
        #[arg(required = false, short, long)]
        either: bool,

        /// Stop after this many results
        #[arg(required = false, short, long)]
        limit: Option<usize>,

        /// Hits fetched per page
        #[arg(required = false, long)]
        page_size: Option<usize>,
    },

    /// Compile a JSON query and print the backend document
    #[command(arg_required_else_help = true)]
    Compile {
        /// Query such as '{"either":[{"name":"Moose"},{"name":"Moo*"}]}'
        #[arg(required = true)]
        query: String,

        /// Print the full search body instead of the bare query
        #[arg(required = false, short, long)]
        body: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let args = Args::try_parse_from([
            "mcpan",
            "-v",
            "search",
            "release",
            "distribution=Moose",
            "status=latest",
            "--limit",
            "5",
        ])
        .unwrap();
        assert_eq!(args.verbose, 1);
        match args.command {
            Commands::Search {
                doc_type,
                terms,
                either,
                limit,
                page_size,
            } => {
                assert_eq!(doc_type, "release");
                assert_eq!(
                    terms,
                    vec![
                        ("distribution".to_string(), "Moose".to_string()),
                        ("status".to_string(), "latest".to_string()),
                    ]
                );
                assert!(!either);
                assert_eq!(limit, Some(5));
                assert_eq!(page_size, None);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_rejects_bad_term() {
        assert!(Args::try_parse_from(["mcpan", "search", "release", "Moose"]).is_err());
    }
}
