// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
#![no_main]

use blockdct::pipeline::{ChromaReconstruction, Decoder, DecoderOptions, num_blocks};
use blockdct::stream::read_coefficients;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let [w, h, rest @ ..] = data else {
        return;
    };
    let size = (*w as usize + 1, *h as usize + 1);
    let Ok(blocks) = num_blocks(size) else {
        return;
    };
    let mut stream = rest;
    let Ok(coefficients) = read_coefficients(&mut stream, blocks) else {
        return;
    };
    let decoder = Decoder::new(DecoderOptions {
        chroma: ChromaReconstruction::Neutral,
        ..Default::default()
    });
    let rgb = decoder.decode(size, [coefficients.as_slice(), &[], &[]]).unwrap();
    assert_eq!(rgb[0].size(), size);
});
