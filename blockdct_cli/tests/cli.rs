// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use blockdct::image::Image;
use blockdct::metrics::psnr;
use blockdct::quant::QuantizationMatrix;
use blockdct_cli::bmp::{encode_bmp, read_bmp, write_bmp};
use blockdct_cli::text::{format_quant_table, read_quant_table};
use tempdir::TempDir;

fn temp_dir(name: &str) -> TempDir {
    TempDir::new(&format!("blockdct_cli_{name}")).unwrap()
}

fn run(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blockdct_cli"))
        .args(args)
        .output()
        .unwrap()
}

#[track_caller]
fn run_ok(args: &[&Path]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn test_image(size: (usize, usize)) -> [Image<u8>; 3] {
    let plane = |f: &dyn Fn(usize, usize) -> usize| {
        let data = (0..size.1)
            .flat_map(|y| (0..size.0).map(move |x| (x, y)))
            .map(|(x, y)| (f(x, y) % 256) as u8)
            .collect();
        Image::from_vec(size, data).unwrap()
    };
    [
        plane(&|x, y| 40 + x * 6 + y),
        plane(&|x, y| 200 - x * 2 - y * 3),
        plane(&|x, y| 90 + x * 2 + y * 4),
    ]
}

struct Encoded {
    tables: [PathBuf; 3],
    dim: PathBuf,
    coefficients: [PathBuf; 3],
    frequencies: [PathBuf; 3],
}

fn encode(dir: &TempDir, input: &Path, extra: &[&Path]) -> Encoded {
    let encoded = Encoded {
        tables: ["qt_y.txt", "qt_cb.txt", "qt_cr.txt"].map(|f| dir.path().join(f)),
        dim: dir.path().join("dim.txt"),
        coefficients: ["qf_y.raw", "qf_cb.raw", "qf_cr.raw"].map(|f| dir.path().join(f)),
        frequencies: ["ef_y.raw", "ef_cb.raw", "ef_cr.raw"].map(|f| dir.path().join(f)),
    };
    let mut args: Vec<&Path> = vec![Path::new("encode"), input];
    args.extend(encoded.tables.iter().map(PathBuf::as_path));
    args.push(&encoded.dim);
    args.extend(encoded.coefficients.iter().map(PathBuf::as_path));
    args.push(Path::new("--frequencies"));
    args.extend(encoded.frequencies.iter().map(PathBuf::as_path));
    args.extend_from_slice(extra);
    run_ok(&args);
    encoded
}

fn decode_args<'a>(output: &'a Path, encoded: &'a Encoded) -> Vec<&'a Path> {
    let mut args: Vec<&Path> = vec![Path::new("decode"), output];
    args.extend(encoded.tables.iter().map(PathBuf::as_path));
    args.push(&encoded.dim);
    args.extend(encoded.coefficients.iter().map(PathBuf::as_path));
    args
}

#[test]
fn split_merge_round_trip() {
    let dir = temp_dir("split_merge");
    let input = dir.path().join("in.bmp");
    let planes = test_image((7, 5));
    write_bmp(&input, &planes).unwrap();

    let channels = ["r.txt", "g.txt", "b.txt"].map(|f| dir.path().join(f));
    let dim = dir.path().join("dim.txt");
    run_ok(&[
        Path::new("split"),
        &input,
        &channels[0],
        &channels[1],
        &channels[2],
        &dim,
    ]);
    assert_eq!(std::fs::read_to_string(&dim).unwrap(), "7 5\n");
    let red = std::fs::read_to_string(&channels[0]).unwrap();
    assert_eq!(red.lines().count(), 5);
    assert_eq!(red.lines().next().unwrap().split(' ').count(), 7);

    let output = dir.path().join("out.bmp");
    run_ok(&[
        Path::new("merge"),
        &output,
        &channels[0],
        &channels[1],
        &channels[2],
        &dim,
    ]);
    assert_eq!(
        std::fs::read(&output).unwrap(),
        encode_bmp(&planes).unwrap()
    );
}

#[test]
fn encode_decode_round_trip() {
    let dir = temp_dir("round_trip");
    let input = dir.path().join("in.bmp");
    let planes = test_image((20, 13));
    write_bmp(&input, &planes).unwrap();

    let encoded = encode(&dir, &input, &[]);
    assert_eq!(std::fs::read_to_string(&encoded.dim).unwrap(), "20 13\n");
    assert_eq!(
        read_quant_table(&encoded.tables[0]).unwrap(),
        QuantizationMatrix::standard_luma()
    );
    assert_eq!(
        std::fs::read_to_string(&encoded.tables[2]).unwrap(),
        format_quant_table(&QuantizationMatrix::standard_chroma())
    );
    // 3x2 blocks.
    for path in &encoded.coefficients {
        assert_eq!(std::fs::metadata(path).unwrap().len(), 6 * 128);
    }
    for path in &encoded.frequencies {
        assert_eq!(std::fs::metadata(path).unwrap().len(), 6 * 256);
    }

    let output = dir.path().join("out.bmp");
    let mut args = decode_args(&output, &encoded);
    args.extend([Path::new("--reference"), input.as_path(), Path::new("--frequencies")]);
    args.extend(encoded.frequencies.iter().map(PathBuf::as_path));
    let stdout = run_ok(&args);
    for needle in ["PSNR R:", "PSNR G:", "PSNR B:", "SQNR Y", "SQNR Cb", "SQNR Cr"] {
        assert!(stdout.contains(needle), "{needle} missing from {stdout}");
    }

    let decoded = read_bmp(&output).unwrap();
    for (orig, restored) in planes.iter().zip(&decoded) {
        assert_eq!(restored.size(), (20, 13));
        assert!(psnr(orig, restored).unwrap() > 30.0);
    }
}

#[test]
fn luma_only_is_gray() {
    let dir = temp_dir("luma_only");
    let input = dir.path().join("in.bmp");
    write_bmp(&input, &test_image((9, 9))).unwrap();
    let encoded = encode(&dir, &input, &[]);
    for path in &encoded.coefficients[1..] {
        std::fs::remove_file(path).unwrap();
    }

    let output = dir.path().join("gray.bmp");
    let mut args = decode_args(&output, &encoded);
    args.push(Path::new("--luma-only"));
    run_ok(&args);
    let [r, g, b] = read_bmp(&output).unwrap();
    assert_eq!(r, g);
    assert_eq!(r, b);
}

#[test]
fn scaled_tables() {
    let dir = temp_dir("scaled");
    let input = dir.path().join("in.bmp");
    write_bmp(&input, &test_image((8, 8))).unwrap();
    let encoded = encode(&dir, &input, &[Path::new("--scale"), Path::new("2")]);
    assert_eq!(
        read_quant_table(&encoded.tables[1]).unwrap(),
        QuantizationMatrix::standard_chroma().scaled(2).unwrap()
    );
}

#[test]
fn truncated_stream_fails() {
    let dir = temp_dir("truncated");
    let input = dir.path().join("in.bmp");
    write_bmp(&input, &test_image((16, 8))).unwrap();
    let encoded = encode(&dir, &input, &[]);
    let data = std::fs::read(&encoded.coefficients[1]).unwrap();
    std::fs::write(&encoded.coefficients[1], &data[..data.len() - 10]).unwrap();

    let output = dir.path().join("out.bmp");
    let result = run(&decode_args(&output, &encoded));
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("qf_cb.raw"), "{stderr}");
    assert!(!output.exists());
}

#[test]
fn missing_input_fails() {
    let dir = temp_dir("missing");
    let missing = dir.path().join("nope.bmp");
    let out = dir.path().join("x.txt");
    let result = run(&[Path::new("split"), &missing, &out, &out, &out, &out]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("nope.bmp"));
}

#[test]
fn failed_encode_leaves_no_outputs() {
    let dir = temp_dir("partial");
    let input = dir.path().join("in.bmp");
    write_bmp(&input, &test_image((8, 8))).unwrap();

    let tables = ["qt_y.txt", "qt_cb.txt", "qt_cr.txt"].map(|f| dir.path().join(f));
    let dim = dir.path().join("dim.txt");
    let coefficients = ["qf_y.raw", "qf_cb.raw", "qf_cr.raw"].map(|f| dir.path().join(f));
    // The last output lands in a directory that does not exist.
    let frequencies = ["ef_y.raw", "ef_cb.raw", "missing/ef_cr.raw"].map(|f| dir.path().join(f));
    let mut args: Vec<&Path> = vec![Path::new("encode"), &input];
    args.extend(tables.iter().map(PathBuf::as_path));
    args.push(&dim);
    args.extend(coefficients.iter().map(PathBuf::as_path));
    args.push(Path::new("--frequencies"));
    args.extend(frequencies.iter().map(PathBuf::as_path));

    let result = run(&args);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("ef_cr.raw"));
    for path in tables
        .iter()
        .chain([&dim])
        .chain(&coefficients)
        .chain(&frequencies)
    {
        assert!(!path.exists(), "{path:?} left behind");
    }
}
