// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

mod edge;
mod vec_helpers;

pub use edge::*;
pub use vec_helpers::*;
