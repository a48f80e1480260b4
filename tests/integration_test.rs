use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

const SAMPLE_FASTA: &str = "tests/data/ten_records.fasta";

/// The records of `fasta`, each one the header line plus its body.
fn records(fasta: &str) -> Vec<String> {
    let mut records: Vec<String> = Vec::new();
    for line in fasta.lines() {
        if line.starts_with('>') || records.is_empty() {
            records.push(String::new());
        }
        let last = records.last_mut().unwrap();
        last.push_str(line);
        last.push('\n');
    }
    records
}

/// A FASTA file of `n` records which are exactly 100 bytes each.
fn fixed_size_records(n: usize) -> String {
    (1..=n)
        .map(|i| format!(">r{i:02}\n{}\n", "A".repeat(94)))
        .collect()
}

#[test]
fn split_into_four() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.copy_from("tests/data", &["*.fasta"]).unwrap();
    let input = temp.child("ten_records.fasta");

    Command::cargo_bin("fastasplit")
        .unwrap()
        .arg("-i")
        .arg(input.path())
        .args(["-n", "4"])
        .assert()
        .success();

    let original = records(&std::fs::read_to_string(SAMPLE_FASTA).unwrap());
    assert_eq!(original.len(), 10);

    // 10 records into 4 chunks puts floor(10 / 4) + 1 = 3 records in each
    let expected = [&original[0..3], &original[3..6], &original[6..9], &original[9..10]];
    for (i, chunk) in expected.iter().enumerate() {
        temp.child(format!("ten_records.fasta_c{}.fasta", i + 1))
            .assert(chunk.concat());
    }
    temp.child("ten_records.fasta_c5.fasta")
        .assert(predicate::path::missing());

    temp.close().unwrap();
}

#[test]
fn split_by_size() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("reads.fasta");
    let fasta = fixed_size_records(30);
    input.write_str(&fasta).unwrap();

    // 3000 bytes in 1200 byte pieces is estimated at 3 chunks, so 11 records go in each
    Command::cargo_bin("fastasplit")
        .unwrap()
        .arg("-i")
        .arg(input.path())
        .args(["-s", "0.0012"])
        .assert()
        .success();

    let original = records(&fasta);
    temp.child("reads.fasta_c1.fasta")
        .assert(original[0..11].concat());
    temp.child("reads.fasta_c2.fasta")
        .assert(original[11..22].concat());
    temp.child("reads.fasta_c3.fasta")
        .assert(original[22..30].concat());
    temp.child("reads.fasta_c4.fasta")
        .assert(predicate::path::missing());

    temp.close().unwrap();
}

#[test]
fn split_into_outdir() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.copy_from("tests/data", &["*.fasta"]).unwrap();
    let input = temp.child("ten_records.fasta");
    let outdir = temp.child("chunks");

    Command::cargo_bin("fastasplit")
        .unwrap()
        .arg("-i")
        .arg(input.path())
        .arg("-o")
        .arg(outdir.path())
        .args(["-n", "1"])
        .assert()
        .success();

    // a single chunk is an exact copy
    outdir
        .child("ten_records.fasta_c1.fasta")
        .assert(std::fs::read_to_string(SAMPLE_FASTA).unwrap());
    outdir
        .child("ten_records.fasta_c2.fasta")
        .assert(predicate::path::missing());
    temp.child("ten_records.fasta_c1.fasta")
        .assert(predicate::path::missing());

    temp.close().unwrap();
}

#[test]
fn chunks_join_to_normalized_input() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("windows.fasta");
    input
        .write_str(">a first\r\nACGT\r\nACGT\r\n\r\n>b\r\nGGGG\r\n>c\r\nTT\r\n>d\r\nCC\r\n>e\r\nAA")
        .unwrap();

    Command::cargo_bin("fastasplit")
        .unwrap()
        .arg("-i")
        .arg(input.path())
        .args(["-n", "2"])
        .assert()
        .success();

    // 5 records into 2 chunks puts 3 records in each
    let first = std::fs::read_to_string(temp.child("windows.fasta_c1.fasta").path()).unwrap();
    let second = std::fs::read_to_string(temp.child("windows.fasta_c2.fasta").path()).unwrap();

    assert_eq!(first, ">a first\nACGT\nACGT\n>b\nGGGG\n>c\nTT\n");
    assert_eq!(second, ">d\nCC\n>e\nAA\n");
    assert_eq!(
        first + &second,
        ">a first\nACGT\nACGT\n>b\nGGGG\n>c\nTT\n>d\nCC\n>e\nAA\n"
    );

    temp.close().unwrap();
}

#[test]
fn more_chunks_than_records() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.copy_from("tests/data", &["*.fasta"]).unwrap();
    let input = temp.child("ten_records.fasta");

    Command::cargo_bin("fastasplit")
        .unwrap()
        .arg("-i")
        .arg(input.path())
        .args(["-n", "25"])
        .assert()
        .success();

    let original = records(&std::fs::read_to_string(SAMPLE_FASTA).unwrap());
    for (i, record) in original.iter().enumerate() {
        temp.child(format!("ten_records.fasta_c{}.fasta", i + 1))
            .assert(record.as_str());
    }
    temp.child("ten_records.fasta_c11.fasta")
        .assert(predicate::path::missing());

    temp.close().unwrap();
}
