use clap::*;
use protree::libs::phylo::build::nj;
use protree::libs::phylo::distance::DistanceMatrix;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("nj")
        .about("Neighbor-joining tree from a PHYLIP distance matrix")
        .after_help(
            r###"
Skips alignment and distance estimation: reads a square matrix and joins it
directly, e.g. to rebuild a tree from a saved `protree dist` run.

Input format:
* First line: the number of taxa
* One line per taxon: its name, then its distances, whitespace separated
* Slightly asymmetric cells are averaged; negative, NaN or infinite ones
  are rejected

Notes:
* Branch lengths below 0 are written as 0
* The last two clusters are joined under a midpoint root

Examples:
1. From a saved matrix:
   protree nj matrix.phy -o tree.nwk

2. Graphviz output straight from sequences:
   protree dist seqs.fa | protree nj stdin --dot

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("PHYLIP distance matrix. [stdin] for standard input"),
        )
        .arg(super::arg_outfile());
    super::args_tree_output(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let matrix = DistanceMatrix::from_phylip(protree::reader(infile)?)?;
    log::info!("Read {} taxa from {}", matrix.len(), infile);

    super::write_tree(args, &nj(&matrix)?)
}
