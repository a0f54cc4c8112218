extern crate clap;
use clap::*;

mod cmd_protree;

fn main() -> anyhow::Result<()> {
    let app = Command::new("protree")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`protree` - Protein similarity ranking and phylogeny reconstruction")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Print progress to stderr; -vv for debug output"),
        )
        .subcommand(cmd_protree::align::make_subcommand())
        .subcommand(cmd_protree::similar::make_subcommand())
        .subcommand(cmd_protree::msa::make_subcommand())
        .subcommand(cmd_protree::dist::make_subcommand())
        .subcommand(cmd_protree::tree::make_subcommand())
        .subcommand(cmd_protree::nj::make_subcommand())
        .subcommand(cmd_protree::motif::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Similarity:
    * align   - Local alignment of two sequences
    * similar - Rank targets by identity to a query

* Phylogeny:
    * msa  - Progressive multiple alignment
    * dist - Evolutionary distance matrix
    * tree - Neighbor-joining tree with bootstrap support
    * nj   - Neighbor-joining tree from a distance matrix

* Motifs:
    * motif - Scan sequences with a PROSITE-style pattern

"###,
        );

    let matches = app.get_matches();

    let level = match matches.get_count("verbose") {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match matches.subcommand() {
        Some(("align", sub_matches)) => cmd_protree::align::execute(sub_matches),
        Some(("similar", sub_matches)) => cmd_protree::similar::execute(sub_matches),
        Some(("msa", sub_matches)) => cmd_protree::msa::execute(sub_matches),
        Some(("dist", sub_matches)) => cmd_protree::dist::execute(sub_matches),
        Some(("tree", sub_matches)) => cmd_protree::tree::execute(sub_matches),
        Some(("nj", sub_matches)) => cmd_protree::nj::execute(sub_matches),
        Some(("motif", sub_matches)) => cmd_protree::motif::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
