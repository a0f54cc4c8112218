use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn command_tree() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("protree");
    let output = cmd.arg("tree").arg("tests/protree/globins.fa").output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.trim_end().ends_with(';'));
    for name in ["HBA_HUMAN", "HBB_HUMAN", "HBA_MOUSE", "HBB_MOUSE", "MYG_HUMAN"] {
        assert!(stdout.contains(&format!("{}:", name)));
    }
    // No support labels without bootstrap
    assert!(!predicate::str::is_match(r"\)\d+:")?.eval(&stdout));

    Ok(())
}

#[test]
fn command_tree_bootstrap() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("protree");
    let output = cmd
        .arg("tree")
        .arg("tests/protree/globins.fa")
        .arg("-b")
        .arg("20")
        .arg("--seed")
        .arg("7")
        .arg("-p")
        .arg("1")
        .output()?;
    let serial = String::from_utf8(output.stdout)?;
    assert!(output.status.success());
    assert!(predicate::str::is_match(r"\)\d+:")?.eval(&serial));

    // Same seed, more threads, same tree
    let mut cmd = cargo_bin_cmd!("protree");
    let output = cmd
        .arg("tree")
        .arg("tests/protree/globins.fa")
        .arg("-b")
        .arg("20")
        .arg("--seed")
        .arg("7")
        .arg("-p")
        .arg("4")
        .output()?;
    let parallel = String::from_utf8(output.stdout)?;
    assert_eq!(serial, parallel);

    Ok(())
}

#[test]
fn command_tree_two() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("aln.fa");
    std::fs::write(&input, ">a\nMKTAYIAKQR\n>b\nMKTAYIAKQR\n")?;

    let mut cmd = cargo_bin_cmd!("protree");
    cmd.arg("tree")
        .arg(&input)
        .arg("--aligned")
        .assert()
        .success()
        .stdout("(a:0,b:0);\n");

    Ok(())
}

#[test]
fn command_tree_dot() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("protree");
    cmd.arg("tree")
        .arg("tests/protree/globins.fa")
        .arg("--dot")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph Tree {"))
        .stdout(predicate::str::contains("[label=\"MYG_HUMAN\"];"));

    Ok(())
}

#[test]
fn command_tree_errors() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("protree");
    cmd.arg("tree")
        .arg("tests/protree/query.fa")
        .assert()
        .failure()
        .stderr(predicate::str::contains("insufficient input"));

    let mut cmd = cargo_bin_cmd!("protree");
    cmd.arg("tree")
        .arg("tests/protree/globins.fa")
        .arg("-b")
        .arg("-1")
        .assert()
        .failure();

    Ok(())
}

#[test]
fn command_nj() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("input.phy");
    let output = temp.path().join("output.nwk");

    let content = "3
1 0 0.1 0.3
2 0.1 0 0.3
3 0.3 0.3 0
";
    std::fs::write(&input, content)?;

    let mut cmd = cargo_bin_cmd!("protree");
    cmd.arg("nj")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let nwk = std::fs::read_to_string(&output)?;
    // 1 and 2 are joined first
    assert_eq!(nwk, "(3:0.125,(1:0.05,2:0.05):0.125);\n");

    Ok(())
}

#[test]
fn command_dist_pipe_nj() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let matrix = temp.path().join("matrix.phy");

    let mut cmd = cargo_bin_cmd!("protree");
    cmd.arg("dist")
        .arg("tests/protree/globins.fa")
        .arg("-o")
        .arg(&matrix)
        .assert()
        .success();

    let mut cmd = cargo_bin_cmd!("protree");
    cmd.arg("nj")
        .arg(&matrix)
        .assert()
        .success()
        .stdout(predicate::str::contains("MYG_HUMAN:"));

    Ok(())
}

#[test]
fn command_nj_dot_and_bad_cells() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("input.phy");
    std::fs::write(&input, "2\nA 0 0.4\nB 0.4 0\n")?;

    let mut cmd = cargo_bin_cmd!("protree");
    cmd.arg("nj")
        .arg(&input)
        .arg("--dot")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph Tree {"));

    let bad = temp.path().join("bad.phy");
    std::fs::write(&bad, "3\nA 0 nan 0.3\nB nan 0 0.3\nC 0.3 0.3 0\n")?;

    let mut cmd = cargo_bin_cmd!("protree");
    cmd.arg("nj")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-finite distance"));

    Ok(())
}
