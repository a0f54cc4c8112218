use clap::*;
use protree::libs::engine::{self, TreeOptions};
use protree::libs::phylo::distance::DistanceModel;
use protree::libs::pool::CancelToken;
use std::time::Duration;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("tree")
        .about("Neighbor-joining tree with bootstrap support")
        .after_help(
            r###"
Runs multiple alignment, distance estimation and neighbor-joining. With
`-b N`, alignment columns are resampled N times and every internal branch is
labelled with the percentage of replicate trees containing its split.

Notes:
* The tree is unrooted in meaning; it is written rooted at the final join
* Replicate k is drawn with seed `--seed + k`, so results are reproducible
  regardless of the number of threads
* `--timeout` aborts a long bootstrap run without output

Examples:
1. Plain NJ tree:
   protree tree seqs.fa

2. 100 bootstrap replicates on 8 threads:
   protree tree seqs.fa -b 100 -p 8 -o tree.nwk

3. Graphviz output from an existing alignment:
   protree tree aln.fa --aligned --dot | dot -Tpng -o tree.png

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input FASTA file. [stdin] for standard input"),
        )
        .arg(
            Arg::new("aligned")
                .long("aligned")
                .action(ArgAction::SetTrue)
                .help("Input is already aligned"),
        )
        .arg(
            Arg::new("bootstrap")
                .long("bootstrap")
                .short('b')
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("0")
                .help("Number of bootstrap replicates"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .num_args(1)
                .default_value("42")
                .help("Random seed for resampling"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_parser(value_parser!(u64))
                .num_args(1)
                .help("Give up after this many seconds"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .num_args(1)
                .default_value("jtt")
                .value_parser(["jtt", "poisson", "raw"])
                .help("Distance correction"),
        )
        .arg(super::arg_parallel())
        .arg(super::arg_outfile());
    super::args_tree_output(super::args_scoring(cmd))
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let bootstrap = *args.get_one::<usize>("bootstrap").unwrap();

    let cancel = match args.get_one::<u64>("timeout") {
        Some(&secs) => CancelToken::with_deadline(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };
    let opts = TreeOptions {
        scoring: super::scoring(args)?,
        model: DistanceModel::from_name(args.get_one::<String>("model").unwrap())?,
        seed: *args.get_one::<u64>("seed").unwrap(),
        parallel: super::parallel(args),
        cancel,
    };

    let msa = super::dist::load_alignment(args)?;
    let rec = engine::tree_from_alignment(msa, bootstrap, &opts)?;

    super::write_tree(args, &rec.tree)
}
