use clap::*;
use protree::libs::align::percent_identity;
use protree::libs::engine;
use protree::libs::seq::is_gap;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("align")
        .about("Local alignment of two protein sequences")
        .after_help(
            r###"
Aligns the first sequence of each file with Smith-Waterman and affine gaps.

Output:
* A header of `key<TAB>value` lines: query, target (with 1-based ranges),
  score, identity, length and cigar
* The aligned rows, with a middle line of `|` (identical), `.` (mismatch)
  and spaces (gap)

Examples:
1. Align two sequences with BLOSUM62:
   protree align query.fa target.fa

2. Cheaper gaps:
   protree align query.fa target.fa --gap-open 5 --gap-extend 1

"###,
        )
        .arg(
            Arg::new("query")
                .required(true)
                .index(1)
                .help("Query FASTA file"),
        )
        .arg(
            Arg::new("target")
                .required(true)
                .index(2)
                .help("Target FASTA file"),
        )
        .arg(super::arg_outfile());
    super::args_scoring(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = protree::writer(args.get_one::<String>("outfile").unwrap())?;
    let scoring = super::scoring(args)?;

    let query = super::read_single(args.get_one::<String>("query").unwrap())?;
    let target = super::read_single(args.get_one::<String>("target").unwrap())?;

    let aln = engine::align(&query, &target, &scoring)?;

    let (qs, qe) = aln.query_range;
    let (ts, te) = aln.target_range;
    writer.write_fmt(format_args!("query\t{}\t{}-{}\n", query.id(), qs + 1, qe))?;
    writer.write_fmt(format_args!("target\t{}\t{}-{}\n", target.id(), ts + 1, te))?;
    writer.write_fmt(format_args!("score\t{}\n", aln.score))?;
    writer.write_fmt(format_args!("identity\t{:.2}\n", percent_identity(&aln)))?;
    writer.write_fmt(format_args!("length\t{}\n", aln.len()))?;
    writer.write_fmt(format_args!("cigar\t{}\n", aln.cigar()))?;

    if !aln.is_empty() {
        let middle: String = aln
            .aligned_query
            .iter()
            .zip(&aln.aligned_target)
            .map(|(&q, &t)| {
                if is_gap(q) || is_gap(t) {
                    ' '
                } else if q.eq_ignore_ascii_case(&t) {
                    '|'
                } else {
                    '.'
                }
            })
            .collect();
        writer.write_fmt(format_args!(
            "\n{}\n{}\n{}\n",
            String::from_utf8_lossy(&aln.aligned_query),
            middle,
            String::from_utf8_lossy(&aln.aligned_target)
        ))?;
    }

    Ok(())
}
