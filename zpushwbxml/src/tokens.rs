//! Global WBXML tokens (WAP-192, section 7.1). They are valid on every code
//! page and take precedence over page-specific tag tokens.

pub const SWITCH_PAGE: u8 = 0x00;
pub const END: u8 = 0x01;
pub const ENTITY: u8 = 0x02;
pub const STR_I: u8 = 0x03;
pub const LITERAL: u8 = 0x04;
pub const EXT_I_0: u8 = 0x40;
pub const EXT_I_1: u8 = 0x41;
pub const EXT_I_2: u8 = 0x42;
pub const PI: u8 = 0x43;
pub const LITERAL_C: u8 = 0x44;
pub const EXT_T_0: u8 = 0x80;
pub const EXT_T_1: u8 = 0x81;
pub const EXT_T_2: u8 = 0x82;
pub const STR_T: u8 = 0x83;
pub const LITERAL_A: u8 = 0x84;
pub const EXT_0: u8 = 0xC0;
pub const EXT_1: u8 = 0xC1;
pub const EXT_2: u8 = 0xC2;
pub const OPAQUE: u8 = 0xC3;
pub const LITERAL_AC: u8 = 0xC4;

/// Tag flag: the element carries an attribute list.
pub const FLAG_ATTRIBUTES: u8 = 0x80;
/// Tag flag: the element has content and is closed by [`END`].
pub const FLAG_CONTENT: u8 = 0x40;
/// Mask that isolates the tag identity from its flags.
pub const TAG_MASK: u8 = 0x3F;

/// Lowest token a code page may assign to a tag or attribute.
pub const FIRST_PAGE_TOKEN: u8 = 0x05;

/// WBXML 1.3 version byte.
pub const VERSION_1_3: u8 = 0x03;

/// Returns true for the global tokens that the content of an element may hold
/// besides child tags.
pub fn is_global(byte: u8) -> bool {
    matches!(
        byte,
        SWITCH_PAGE
            | END
            | ENTITY
            | STR_I
            | LITERAL
            | EXT_I_0
            | EXT_I_1
            | EXT_I_2
            | PI
            | LITERAL_C
            | EXT_T_0
            | EXT_T_1
            | EXT_T_2
            | STR_T
            | LITERAL_A
            | EXT_0
            | EXT_1
            | EXT_2
            | OPAQUE
            | LITERAL_AC
    )
}
