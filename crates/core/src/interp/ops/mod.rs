//! Content stream operator implementations.
//!
//! Operators are grouped by category:
//! - `graphics_state` - State stack and transforms (q, Q, cm, w, J, j, M, d, ri, i, gs)
//! - `color` - Color space and values (G, g, RG, rg, K, k, CS, cs, SC, SCN, sc, scn)
//! - `path` - Path construction, painting and clipping (m, l, c, v, y, h, re, S, s, f, F, f\*, B, B\*, b, b\*, n, W, W\*)
//! - `text` - Text state and showing (BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T\*, Tj, TJ, ', ")
//! - `xobject` - XObjects and inline images (Do, BI, ID, EI)
//! - `marked_content` - Marked-content sequences (BMC, BDC, EMC)

mod color;
mod graphics_state;
mod marked_content;
mod path;
mod text;
mod xobject;

// Each file adds an impl block to ContentStreamProcessor; nothing to re-export.
