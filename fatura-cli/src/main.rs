use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use fatura_core::{Transaction, normalize};
use fatura_engine::{
    BatchSource, DEFAULT_ACTIVITY_COLUMN, DEFAULT_ESTABLISHMENT_COLUMN, DEFAULT_KNOWLEDGE_PATH,
    DEFAULT_SIMILARITY_THRESHOLD, KnowledgeBase, PipelineOptions, process_batches,
};

#[derive(Parser, Debug)]
#[command(name = "fatura", version, about = "Categorize credit-card statement rows")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Categorize one or more statement CSVs and write the enriched result
    Process {
        /// Statement CSV files (must carry date, title and amount columns)
        #[arg(required = true)]
        statements: Vec<PathBuf>,

        /// Category knowledge-base JSON
        #[arg(long, default_value = DEFAULT_KNOWLEDGE_PATH)]
        categories: PathBuf,

        /// Establishment reference CSV; enables approximate matching
        #[arg(long)]
        establishments: Option<PathBuf>,

        /// Establishment-name column in the reference CSV
        #[arg(long, default_value = DEFAULT_ESTABLISHMENT_COLUMN)]
        estab_col: String,

        /// Activity-label column in the reference CSV
        #[arg(long, default_value = DEFAULT_ACTIVITY_COLUMN)]
        activity_col: String,

        /// Minimum similarity score (0-100) for an approximate match
        #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
        threshold: u8,

        /// Output CSV path (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Move a transaction title to another category and save the base
    Reassign {
        /// Raw transaction title (normalized before storing)
        #[arg(long)]
        title: String,

        /// Category it currently sits under, if any
        #[arg(long)]
        from: Option<String>,

        /// Category it should belong to
        #[arg(long)]
        to: String,

        /// Category knowledge-base JSON
        #[arg(long, default_value = DEFAULT_KNOWLEDGE_PATH)]
        categories: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Process {
            statements,
            categories,
            establishments,
            estab_col,
            activity_col,
            threshold,
            output,
        } => {
            let base = KnowledgeBase::load(&categories);

            let mut batches = Vec::new();
            for path in &statements {
                match BatchSource::from_path(path) {
                    Ok(batch) => batches.push(batch),
                    Err(err) => warn!(path = %path.display(), %err, "skipping statement"),
                }
            }

            let options = PipelineOptions {
                use_establishments: establishments.is_some(),
                establishments_path: establishments,
                establishment_column: estab_col,
                activity_column: activity_col,
                threshold,
            };

            let transactions = process_batches(batches, &base, &options);
            if transactions.is_empty() {
                bail!("no valid transactions found in the given statements");
            }

            write_output(&transactions, output.as_deref())?;
            print_summary(&transactions);
        }

        Command::Reassign {
            title,
            from,
            to,
            categories,
        } => {
            let mut base = KnowledgeBase::load(&categories);
            let normalized = normalize(Some(&title));
            if normalized.is_empty() {
                bail!("title normalizes to an empty string; nothing to store");
            }

            base.reassign(from.as_deref(), &to, &normalized);
            if !base.save(&categories) {
                bail!("failed to save knowledge base to {}", categories.display());
            }
            println!("Base atualizada: '{normalized}' -> '{to}'");
        }
    }

    Ok(())
}

fn write_output(transactions: &[Transaction], output: Option<&std::path::Path>) -> Result<()> {
    let mut wtr: csv::Writer<Box<dyn Write>> = match output {
        Some(path) => csv::Writer::from_writer(Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?,
        )),
        None => csv::Writer::from_writer(Box::new(std::io::stdout())),
    };

    for txn in transactions {
        wtr.serialize(txn).context("writing transaction row")?;
    }
    wtr.flush().context("flushing output")?;
    Ok(())
}

fn print_summary(transactions: &[Transaction]) {
    let mut totals: HashMap<&str, (usize, f64)> = HashMap::new();
    for txn in transactions {
        let entry = totals.entry(txn.category.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += txn.amount;
    }

    let mut rows: Vec<_> = totals.into_iter().collect();
    rows.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.0.cmp(&b.0)));

    eprintln!("\n{} transações categorizadas:", transactions.len());
    for (category, (count, total)) in rows {
        eprintln!("  {category:<45} {count:>5}  R$ {total:>10.2}");
    }
}
