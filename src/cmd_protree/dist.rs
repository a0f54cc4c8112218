use clap::*;
use protree::libs::align::{align_many, MultipleAlignment};
use protree::libs::phylo::distance::{distance_matrix_with, DistanceModel};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("dist")
        .about("Pairwise evolutionary distances of aligned proteins")
        .after_help(
            r###"
Aligns the sequences (unless --aligned) and writes a relaxed PHYLIP distance
matrix.

Models:
* jtt     - -ln(1 - p - p^2/5), the default
* poisson - -ln(1 - p)
* raw     - p
where p is the fraction of differing residues over columns not gapped in
both rows. Undefined corrections are reported as 10.

Examples:
1. Distances of unaligned proteins:
   protree dist seqs.fa

2. From an existing alignment:
   protree dist aln.fa --aligned --model poisson

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
            Arg::new("model")
                .long("model")
                .num_args(1)
                .default_value("jtt")
                .value_parser(["jtt", "poisson", "raw"])
                .help("Distance correction"),
        )
        .arg(super::arg_parallel())
        .arg(super::arg_outfile());
    super::args_scoring(cmd)
}

/// The alignment a phylogeny command works on.
pub fn load_alignment(args: &ArgMatches) -> anyhow::Result<MultipleAlignment> {
    let seqs = super::read_fasta(args.get_one::<String>("infile").unwrap())?;
    if args.get_flag("aligned") {
        Ok(MultipleAlignment::from_sequences(&seqs)?)
    } else {
        let scoring = super::scoring(args)?;
        super::init_rayon(super::parallel(args))?;
        Ok(align_many(&seqs, &scoring)?)
    }
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = protree::writer(args.get_one::<String>("outfile").unwrap())?;
    let model = DistanceModel::from_name(args.get_one::<String>("model").unwrap())?;

    let msa = load_alignment(args)?;
    let matrix = distance_matrix_with(&msa, model)?;

    writer.write_all(matrix.to_phylip().as_bytes())?;

    Ok(())
}
