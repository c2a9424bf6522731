//! Native <-> little-endian wire order for multi-byte payloads.

pub fn swap_endian_16(v: u16) -> u16 {
    v.swap_bytes()
}

pub fn swap_endian_32(v: u32) -> u32 {
    v.swap_bytes()
}

pub fn swap_endian_64(v: u64) -> u64 {
    v.swap_bytes()
}

macro_rules! wire_order {
    ($to:ident, $from:ident, $ty:ty, $swap:ident) => {
        /// Native to little-endian wire order.
        #[inline]
        pub fn $to(v: $ty) -> $ty {
            if cfg!(target_endian = "big") {
                $swap(v)
            } else {
                v
            }
        }

        /// Little-endian wire order to native.
        #[inline]
        pub fn $from(v: $ty) -> $ty {
            $to(v)
        }
    };
}

wire_order!(htol16, ltoh16, u16, swap_endian_16);
wire_order!(htol32, ltoh32, u32, swap_endian_32);
wire_order!(htol64, ltoh64, u64, swap_endian_64);
