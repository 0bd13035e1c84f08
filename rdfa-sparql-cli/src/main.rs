use std::{io::Read, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use rdfa_sparql::{Element, ParserOptions, RdfaToSparqlParser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Annotated HTML fragment, `-` for stdin.
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Base IRI of the document.
    #[arg(long, default_value = "http://example.org/")]
    base: String,

    /// Add isLiteral filters to every pattern.
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    output: Option<Output>,
}

#[derive(Subcommand)]
enum Output {
    /// The main query (default).
    Query,
    /// The quads of the pattern, one per line.
    Quads,
    /// The projection of the main query.
    Variables,
    /// The rewritten markup.
    Element,
    /// Distinct values of one variable.
    Binding {
        name: String,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// The main query, paginated over one variable.
    Paginated {
        name: String,
        #[arg(long)]
        offset: usize,
        #[arg(long)]
        limit: usize,
    },
    /// Number of distinct values of one variable.
    Count { name: String },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let html = if args.input.as_os_str() == "-" {
        let mut html = String::new();
        std::io::stdin().lock().read_to_string(&mut html)?;
        html
    } else {
        std::fs::read_to_string(&args.input)?
    };

    let root = Element::parse_document(&html);

    let options = ParserOptions::default().with_strict(args.strict);
    let parser = RdfaToSparqlParser::with_options(root, &args.base, options)?;

    match args.output.unwrap_or(Output::Query) {
        Output::Query => print!("{}", parser.query()),
        Output::Quads => {
            for quad in parser.result_quads() {
                println!("{quad} .");
            }
        }
        Output::Variables => {
            for variable in parser.query_variables() {
                println!("{variable}");
            }
        }
        Output::Element => println!("{}", parser.element()),
        Output::Binding {
            name,
            offset,
            limit,
        } => print!("{}", parser.query_for_binding(&name, offset, limit, false)),
        Output::Paginated {
            name,
            offset,
            limit,
        } => print!("{}", parser.paginated_query(&name, offset, limit)),
        Output::Count { name } => print!("{}", parser.count_query(&name)),
    }

    Ok(ExitCode::SUCCESS)
}
