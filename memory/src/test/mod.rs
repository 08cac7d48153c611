mod chunk;
mod mock;
mod sizing;

#[cfg(feature = "gfx-hal")]
mod hal;
