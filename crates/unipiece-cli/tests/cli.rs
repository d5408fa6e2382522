use std::{fs, path::Path, process::Command};

use tempdir::TempDir;

const WORDS: &[&str] = &[
    "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "pack", "my", "box", "with",
    "five", "dozen", "liquor", "jugs",
];

fn corpus() -> Vec<String> {
    (0..300)
        .map(|i| {
            [
                WORDS[i % 16],
                WORDS[(i / 16) % 16],
                WORDS[(i * 7 + 3) % 16],
                WORDS[(i * 11 + i / 16) % 16],
            ]
            .join(" ")
        })
        .collect()
}

fn unipiece(args: &[&str]) {
    let status = Command::new(env!("CARGO_BIN_EXE_unipiece"))
        .args(args)
        .status()
        .unwrap();
    assert!(status.success(), "unipiece {args:?} failed");
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[test]
fn test_train_encode_decode() {
    let dir = TempDir::new("unipiece_cli").unwrap();
    let corpus_path = dir.path().join("corpus.txt");
    let lines = corpus();
    fs::write(&corpus_path, lines.join("\n")).unwrap();

    let prefix = path_str(&dir.path().join("m"));
    unipiece(&[
        "train",
        "-q",
        "--input",
        &path_str(&corpus_path),
        "--model-prefix",
        &prefix,
        "--vocab-size",
        "48",
        "--character-coverage",
        "1.0",
        "--num-threads",
        "2",
    ]);
    let model = format!("{prefix}.model");
    let vocab = fs::read_to_string(format!("{prefix}.vocab")).unwrap();
    assert_eq!(vocab.lines().count(), 48);
    assert!(vocab.starts_with("<unk>\t0\n"));

    let text = dir.path().join("text.txt");
    let sample = &lines[..10];
    fs::write(&text, sample.join("\n")).unwrap();
    let ids = dir.path().join("ids.txt");
    unipiece(&[
        "encode",
        "--model",
        &model,
        "--input",
        &path_str(&text),
        "--output",
        &path_str(&ids),
    ]);
    assert_eq!(fs::read_to_string(&ids).unwrap().lines().count(), sample.len());

    let decoded = dir.path().join("decoded.txt");
    unipiece(&[
        "decode",
        "--model",
        &model,
        "--input",
        &path_str(&ids),
        "--output",
        &path_str(&decoded),
    ]);
    let decoded = fs::read_to_string(&decoded).unwrap();
    assert_eq!(decoded.lines().collect::<Vec<_>>(), sample);

    let exported = dir.path().join("exported.vocab");
    unipiece(&[
        "export-vocab",
        "--model",
        &model,
        "--output",
        &path_str(&exported),
    ]);
    assert_eq!(fs::read_to_string(&exported).unwrap(), vocab);
}
