//! Field-table rendering shared by [`Insn`](crate::Insn) and
//! [`Command`](crate::Command).

/// One `name: value` line per field, names right-aligned to the widest.
pub fn field_table(fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    fields
        .iter()
        .map(|(name, value)| format!("{:>width$}: {}", name, value, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}
