use byte_unit::{Byte, UnitType};

/// Human readable binary size, e.g. `1.5 MiB`.
pub fn format_size(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{adjusted:.1}")
}
