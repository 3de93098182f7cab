/// Implements sign extension as described at [Sign extension](https://en.wikipedia.org/wiki/Sign_extension).
///
/// Only the lowest `bit_count` bits of `bits` are taken into account, if the most significant of
/// those is set all higher bits of the result are set as well.
#[must_use]
pub const fn sign_extend(bits: u16, bit_count: u8) -> u16 {
    debug_assert!(bit_count > 0 && bit_count <= 16, "invalid bit count");
    if bit_count >= 16 {
        return bits;
    }
    let field = bits & ((1 << bit_count) - 1);
    if (field >> (bit_count - 1)) & 1 == 1 {
        // negative: 1-extend
        field | (0xFFFF << bit_count)
    } else {
        // positive, already 0-extended
        field
    }
}

/// Reinterprets the 16 bits as 2's complement number.
#[must_use]
pub const fn twos_complement_to_decimal(bin_rep: u16) -> i16 {
    bin_rep.cast_signed()
}
