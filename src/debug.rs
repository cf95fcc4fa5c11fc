//! Filterable diagnostic logging
//!
//! Categories: STORE, LOOKUP, SETTLE, NET, UI
//! Enable via: KRISTX_DEBUG=all or KRISTX_DEBUG=store,settle (or `--debug`)
//! Output goes through `log::debug!` on the `kristx::debug` target, so the logger
//! must also let that target through (the binary raises it automatically).

use std::sync::atomic::{AtomicU32, Ordering};

pub mod cat {
    pub const STORE: u32 = 1 << 0;
    pub const LOOKUP: u32 = 1 << 1;
    pub const SETTLE: u32 = 1 << 2;
    pub const NET: u32 = 1 << 3;
    pub const UI: u32 = 1 << 4;
    pub const ALL: u32 = 0xffff_ffff;
}

static MASK: AtomicU32 = AtomicU32::new(0);

#[inline]
pub fn set(mask: u32) {
    MASK.store(mask, Ordering::Relaxed)
}

#[inline]
pub fn is(cat: u32) -> bool {
    (MASK.load(Ordering::Relaxed) & cat) != 0
}

#[inline]
pub fn cat_name(cat: u32) -> &'static str {
    match cat {
        c if c == cat::STORE => "store",
        c if c == cat::LOOKUP => "lookup",
        c if c == cat::SETTLE => "settle",
        c if c == cat::NET => "net",
        c if c == cat::UI => "ui",
        _ => "misc",
    }
}

/// Parse a comma-separated category list into a mask.
pub fn parse_list(list: &str) -> u32 {
    let mut m: u32 = 0;
    for tok in list.split(',').map(|s| s.trim().to_ascii_lowercase()) {
        match tok.as_str() {
            "" => {}
            "none" => m = 0,
            "all" => m = cat::ALL,
            "store" => m |= cat::STORE,
            "lookup" => m |= cat::LOOKUP,
            "settle" => m |= cat::SETTLE,
            "net" => m |= cat::NET,
            "ui" => m |= cat::UI,
            other => log::warn!("unknown debug category '{other}'"),
        }
    }
    m
}

#[inline]
pub fn set_from_list(list: &str) {
    set(parse_list(list));
}

#[inline]
pub fn log(cat: u32, msg: impl AsRef<str>) {
    if !is(cat) {
        return;
    }
    log::debug!(target: "kristx::debug", "[{}] {}", cat_name(cat), msg.as_ref());
}
