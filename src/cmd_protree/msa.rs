use clap::*;
use protree::libs::align::align_many;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("msa")
        .about("Progressive multiple sequence alignment")
        .after_help(
            r###"
Builds a UPGMA guide tree from pairwise local-alignment identities, then
merges profiles along it.

Notes:
* Gap symbols in the input are ignored
* Rows are written in input order as aligned FASTA

Examples:
1. Align a set of proteins:
   protree msa seqs.fa -o aln.fa

2. On 4 threads:
   protree msa seqs.fa -p 4

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input FASTA file. [stdin] for standard input"),
        )
        .arg(super::arg_parallel())
        .arg(super::arg_outfile());
    super::args_scoring(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = protree::writer(args.get_one::<String>("outfile").unwrap())?;
    let scoring = super::scoring(args)?;
    super::init_rayon(super::parallel(args))?;

    let seqs = super::read_fasta(args.get_one::<String>("infile").unwrap())?;
    let msa = align_many(&seqs, &scoring)?;

    writer.write_all(msa.to_string().as_bytes())?;

    Ok(())
}
