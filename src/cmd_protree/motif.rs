use clap::*;
use protree::libs::motif::Motif;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("motif")
        .about("Scan sequences for a PROSITE-style motif")
        .after_help(
            r###"
Translates the pattern into a regular expression and reports every hit,
overlapping ones included.

Pattern syntax:
* Elements are separated by `-`
* `x` is any residue; `x(n)` is n residues; `x(n,m)` is n to m residues
* `[LIVM]` is one of; `{P}` is anything but
* `<` and `>` anchor at the N and C terminus

Output columns (TSV):
* sequence id
* start (1-based)
* end (1-based, inclusive)
* matched residues

Examples:
1. N-glycosylation site:
   protree motif "N-{P}-[ST]-{P}" seqs.fa

2. Just print the translated expression:
   protree motif "P-X(2)-G" --regex

"###,
        )
        .arg(
            Arg::new("pattern")
                .required(true)
                .index(1)
                .help("PROSITE-style pattern"),
        )
        .arg(
            Arg::new("infile")
                .index(2)
                .required_unless_present("regex")
                .help("Input FASTA file. [stdin] for standard input"),
        )
        .arg(
            Arg::new("regex")
                .long("regex")
                .action(ArgAction::SetTrue)
                .help("Print the translated regular expression and exit"),
        )
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = protree::writer(args.get_one::<String>("outfile").unwrap())?;
    let motif = Motif::compile(args.get_one::<String>("pattern").unwrap())?;

    if args.get_flag("regex") {
        writer.write_fmt(format_args!("{}\n", motif.as_str()))?;
        return Ok(());
    }

    let infile = args.get_one::<String>("infile").unwrap();
    for seq in super::read_fasta(infile)? {
        for hit in motif.find_all(seq.residues()) {
            writer.write_fmt(format_args!(
                "{}\t{}\t{}\t{}\n",
                seq.id(),
                hit.start,
                hit.end,
                hit.matched
            ))?;
        }
    }

    Ok(())
}
