//! Guest heap string access.
//!
//! Engine strings are heap objects: a 4-byte type/length word followed by the
//! NUL-terminated character data. Name pointers in the descriptors point at
//! the object, so the text starts at `ptr + 4`.

use crate::LayoutError;

/// Reads the NUL-terminated string at guest pointer `ptr`.
pub fn read_goal_string(memory: &[u8], ptr: u32) -> Result<String, LayoutError> {
    let start = (ptr as usize).checked_add(4).filter(|&s| s < memory.len()).ok_or(
        LayoutError::PointerOutOfRange {
            ptr,
            need: 4,
            have: memory.len(),
        },
    )?;
    let rest = &memory[start..];
    let end = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(LayoutError::UnterminatedString { ptr })?;
    Ok(String::from_utf8_lossy(&rest[..end]).into_owned())
}
