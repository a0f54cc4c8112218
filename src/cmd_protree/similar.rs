use clap::*;
use protree::libs::engine::{self, SearchOptions};
use protree::libs::pool::CancelToken;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("similar")
        .about("Rank target sequences by identity to a query")
        .after_help(
            r###"
Aligns the query against every target with Smith-Waterman and reports the
best hits, sorted by percent identity and then by score.

Output columns (TSV):
* target id
* identity (%)
* score
* aligned length
* target length

Notes:
* Hits tied on identity and score keep the order of the targets file
* Nothing is printed when no target shares an identical residue with the query

Examples:
1. Top 10 hits:
   protree similar query.fa targets.fa

2. Top 3 hits on 4 threads:
   protree similar query.fa targets.fa -n 3 -p 4

"###,
        )
        .arg(
            Arg::new("query")
                .required(true)
                .index(1)
                .help("Query FASTA file; the first record is used"),
        )
        .arg(
            Arg::new("targets")
                .required(true)
                .index(2)
                .help("Target FASTA file. [stdin] for standard input"),
        )
        .arg(
            Arg::new("top")
                .long("top")
                .short('n')
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("10")
                .help("Number of hits to report"),
        )
        .arg(
            Arg::new("header")
                .long("header")
                .short('H')
                .action(ArgAction::SetTrue)
                .help("Print a header line"),
        )
        .arg(super::arg_parallel())
        .arg(super::arg_outfile());
    super::args_scoring(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = protree::writer(args.get_one::<String>("outfile").unwrap())?;
    let top = *args.get_one::<usize>("top").unwrap();

    let opts = SearchOptions {
        scoring: super::scoring(args)?,
        parallel: super::parallel(args),
        cancel: CancelToken::new(),
    };

    let query = super::read_single(args.get_one::<String>("query").unwrap())?;
    let targets = super::read_fasta(args.get_one::<String>("targets").unwrap())?;

    let hits = engine::find_similar(&query, &targets, top, &opts)?;

    if args.get_flag("header") {
        writer.write_all(b"target\tidentity\tscore\taligned_length\ttarget_length\n")?;
    }
    for hit in &hits {
        writer.write_fmt(format_args!(
            "{}\t{:.2}\t{}\t{}\t{}\n",
            hit.target_id, hit.identity_percent, hit.score, hit.aligned_length, hit.target_length
        ))?;
    }

    Ok(())
}
