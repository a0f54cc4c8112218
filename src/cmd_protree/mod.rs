//! Subcommand modules for the `protree` binary.

pub mod align;
pub mod dist;
pub mod motif;
pub mod msa;
pub mod nj;
pub mod similar;
pub mod tree;

use clap::*;
use protree::libs::phylo::Tree;
use protree::libs::pool::default_parallelism;
use protree::libs::scoring::ScoringMatrix;
use protree::libs::seq::Sequence;

/// All records of a FASTA file, in file order.
pub fn read_fasta(infile: &str) -> anyhow::Result<Vec<Sequence>> {
    let reader = protree::reader(infile)?;
    let mut fa_in = noodles_fasta::io::Reader::new(reader);

    let mut seqs = Vec::new();
    for result in fa_in.records() {
        let record = result?;
        let name = String::from_utf8(record.name().into())?;
        let residues = record.sequence().get(..).unwrap_or_default();
        seqs.push(Sequence::new(name, residues));
    }

    Ok(seqs)
}

/// Exactly one record from a FASTA file.
pub fn read_single(infile: &str) -> anyhow::Result<Sequence> {
    let mut seqs = read_fasta(infile)?;
    match seqs.len() {
        0 => anyhow::bail!("{} contains no sequence", infile),
        1 => Ok(seqs.remove(0)),
        n => {
            log::warn!("{} contains {} sequences, using the first", infile, n);
            Ok(seqs.remove(0))
        }
    }
}

pub fn arg_outfile() -> Arg {
    Arg::new("outfile")
        .long("outfile")
        .short('o')
        .num_args(1)
        .default_value("stdout")
        .help("Output filename. [stdout] for screen")
}

pub fn arg_parallel() -> Arg {
    Arg::new("parallel")
        .long("parallel")
        .short('p')
        .value_parser(value_parser!(usize))
        .num_args(1)
        .help("Number of threads. Defaults to all available cores")
}

pub fn parallel(args: &ArgMatches) -> usize {
    args.get_one::<usize>("parallel")
        .copied()
        .unwrap_or_else(default_parallelism)
}

/// Bound rayon's global pool, used by the all-pairs stage of `msa`, to the
/// same number of threads.
pub fn init_rayon(parallel: usize) -> anyhow::Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(parallel)
        .build_global()?;
    Ok(())
}

/// `--matrix`, `--gap-open` and `--gap-extend`
pub fn args_scoring(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("matrix")
            .long("matrix")
            .num_args(1)
            .default_value("blosum62")
            .help("Substitution matrix: blosum62, or a file in NCBI format"),
    )
    .arg(
        Arg::new("gap_open")
            .long("gap-open")
            .value_parser(value_parser!(i32))
            .num_args(1)
            .default_value("10")
            .help("Cost of opening a gap"),
    )
    .arg(
        Arg::new("gap_extend")
            .long("gap-extend")
            .value_parser(value_parser!(i32))
            .num_args(1)
            .default_value("1")
            .help("Cost of extending a gap"),
    )
}

pub fn scoring(args: &ArgMatches) -> anyhow::Result<ScoringMatrix> {
    let matrix = ScoringMatrix::from_name(args.get_one::<String>("matrix").unwrap())?;
    let scoring = matrix.with_gaps(
        *args.get_one::<i32>("gap_open").unwrap(),
        *args.get_one::<i32>("gap_extend").unwrap(),
    );
    scoring.validate()?;
    Ok(scoring)
}

/// `--dot` and `--indent`
pub fn args_tree_output(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("dot")
            .long("dot")
            .action(ArgAction::SetTrue)
            .help("Write Graphviz DOT instead of Newick"),
    )
    .arg(
        Arg::new("indent")
            .long("indent")
            .num_args(1)
            .help("Indent each level of the Newick output with this string"),
    )
}

/// Newick, or DOT with `--dot`, as chosen by [`args_tree_output`].
pub fn write_tree(args: &ArgMatches, tree: &Tree) -> anyhow::Result<()> {
    let mut writer = protree::writer(args.get_one::<String>("outfile").unwrap())?;
    let out = if args.get_flag("dot") {
        tree.to_dot()
    } else {
        let indent = args
            .get_one::<String>("indent")
            .map(|s| s.as_str())
            .unwrap_or("");
        tree.to_newick_with_format(indent) + "\n"
    };
    writer.write_all(out.as_bytes())?;
    Ok(())
}
